//! Database entities.

#![allow(missing_docs)]

pub mod article;
pub mod booking;
pub mod booking_message;
pub mod business_profile;
pub mod contact_submission;
pub mod offer;
pub mod provider_application;
pub mod review;
pub mod therapist_profile;
pub mod user;

pub use article::Entity as Article;
pub use booking::Entity as Booking;
pub use booking_message::Entity as BookingMessage;
pub use business_profile::Entity as BusinessProfile;
pub use contact_submission::Entity as ContactSubmission;
pub use offer::Entity as Offer;
pub use provider_application::Entity as ProviderApplication;
pub use review::Entity as Review;
pub use therapist_profile::Entity as TherapistProfile;
pub use user::Entity as User;
