//! Business logic services.

#![allow(missing_docs)]

pub mod account;
pub mod admin;
pub mod approval;
pub mod article;
pub mod availability;
pub mod booking;
pub mod contact;
pub mod email;
pub mod email_template;
pub mod event_publisher;
pub mod messaging;
pub mod offer;
pub mod profile;
pub mod realtime;
pub mod review;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_fixtures;

/// Page size used when a listing does not ask for one.
pub const DEFAULT_PAGE_SIZE: u64 = 20;
/// Upper bound on any listing page.
pub const MAX_PAGE_SIZE: u64 = 100;

pub use account::{
    AccountService, EMAIL_RESTRICTED, Session, SignupInput, SignupOutcome, UpdateSettingsInput,
};
pub use admin::{AdminCreateUserInput, AdminService, CreatedUser, DashboardStats, UserFilter};
pub use approval::{
    ApplicationFilter, ApprovalOutcome, ApprovalService, RequestInfoInput, SubmitApplicationInput,
};
pub use article::{ArticleFilter, ArticleService, CreateArticleInput, UpdateArticleInput};
pub use availability::{Availability, AvailabilityQuery, AvailabilityService};
pub use booking::{
    BookingDetail, BookingFilter, BookingService, ClientBookingRow, ClientContact,
    CreateBookingInput, Participant, ProviderBookingRow, UpdateStatusInput,
};
pub use contact::{ContactInput, ContactReplyInput, ContactService};
pub use email::{
    EmailDeliveryResult, EmailMessage, EmailService, EmailTransport, LogTransport,
    RecordingTransport, ResendTransport, SmtpTransport,
};
pub use email_template::{EmailTemplate, RenderedEmail};
pub use event_publisher::{BookingEvent, EventPublisher, NoOpEventPublisher};
pub use messaging::{MessagingService, SendMessageInput, SentMessage};
pub use offer::{CreateOfferInput, OfferFilter, OfferService, UpdateOfferInput};
pub use profile::{
    BusinessFilter, ProfileService, ProviderOwner, TherapistFilter, UpdateBusinessInput,
    UpdateTherapistInput,
};
pub use realtime::{BookingHub, BookingSubscription};
pub use review::{CreateReviewInput, ReviewService};
pub use upload::UploadService;
