//! Repositories wrapping `SeaORM` queries per table.

mod article;
mod booking;
mod booking_message;
mod business_profile;
mod contact_submission;
mod offer;
mod provider_application;
mod review;
mod therapist_profile;
mod user;

pub use article::{ArticleQuery, ArticleRepository};
pub use booking::BookingRepository;
pub use booking_message::BookingMessageRepository;
pub use business_profile::{BusinessProfileRepository, BusinessQuery};
pub use contact_submission::ContactSubmissionRepository;
pub use offer::{OfferQuery, OfferRepository, OfferSort};
pub use provider_application::ProviderApplicationRepository;
pub use review::ReviewRepository;
pub use therapist_profile::{ProfileSort, TherapistProfileRepository, TherapistQuery};
pub use user::UserRepository;
