//! Bookings: creation, status transitions and listings.

use std::{collections::HashMap, sync::Arc};

use chrono::{NaiveDate, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use terapie_common::{AppError, AppResult, IdGenerator};
use terapie_db::{
    ProviderRef,
    entities::{
        booking::{self, BookingStatus},
        user::{self, UserRole},
    },
    repositories::{BookingMessageRepository, BookingRepository, OfferRepository, UserRepository},
};
use tracing::{info, warn};
use validator::Validate;

use super::availability::{AvailabilityQuery, AvailabilityService, is_valid_slot, slot_key};
use super::email::EmailService;
use super::email_template::EmailTemplate;
use super::event_publisher::{BookingEvent, EventPublisher};
use super::profile::{ProfileService, ProviderOwner};
use super::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// How a user relates to a booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Participant {
    Client,
    Provider(ProviderRef),
}

impl Participant {
    /// Label used when annotating notes.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Client => "Client",
            Self::Provider(provider) => provider.label(),
        }
    }
}

/// Input for a new booking.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingInput {
    pub therapist_id: Option<String>,
    pub business_id: Option<String>,
    pub offer_id: Option<String>,
    pub date: NaiveDate,
    #[validate(length(min = 5, max = 8))]
    pub time: String,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Requested status change.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusInput {
    pub status: BookingStatus,
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
}

/// Listing filter shared by client and provider views.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl BookingFilter {
    fn page(&self) -> (u64, u64) {
        (
            self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            self.offset.unwrap_or(0),
        )
    }
}

/// Client contact as shown to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContact {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A booking in the client's list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientBookingRow {
    #[serde(flatten)]
    pub booking: booking::Model,
    pub unread_count: u64,
}

/// A booking in the provider's list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderBookingRow {
    #[serde(flatten)]
    pub booking: booking::Model,
    pub client: ClientContact,
    pub is_masked: bool,
    pub unread_count: u64,
}

/// A single booking as seen by one of its participants.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetail {
    #[serde(flatten)]
    pub booking: booking::Model,
    pub provider: ProviderOwner,
    pub client: ClientContact,
    pub is_masked: bool,
    pub unread_count: u64,
}

/// Contact details a provider may see. Email and phone stay hidden until
/// the booking leaves `pending`.
#[must_use]
pub fn client_contact(client: &user::Model, status: BookingStatus) -> (ClientContact, bool) {
    let masked = status == BookingStatus::Pending;
    let contact = ClientContact {
        id: client.id.clone(),
        name: client.name.clone(),
        email: (!masked).then(|| client.email.clone()),
        phone: if masked { None } else { client.phone.clone() },
    };
    (contact, masked)
}

/// Check that `actor` may move a booking from `from` to `to`.
pub fn authorize_transition(
    actor: &Participant,
    from: BookingStatus,
    to: BookingStatus,
) -> AppResult<()> {
    if *actor == Participant::Client && to != BookingStatus::Cancelled {
        return Err(AppError::Forbidden(
            "Clients can only cancel bookings".to_string(),
        ));
    }
    if !from.can_transition_to(to) {
        return Err(AppError::BadRequest(format!(
            "Cannot change booking from {} to {}",
            from.as_str(),
            to.as_str()
        )));
    }
    Ok(())
}

/// Append a labelled reason to the booking notes.
#[must_use]
pub fn append_reason(notes: Option<String>, label: &str, reason: Option<&str>) -> Option<String> {
    let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) else {
        return notes;
    };
    let line = format!("[{label}]: {reason}");
    Some(match notes {
        Some(existing) if !existing.is_empty() => format!("{existing}\n\n{line}"),
        _ => format!("\n\n{line}"),
    })
}

/// Booking service.
#[derive(Clone)]
pub struct BookingService {
    booking_repo: BookingRepository,
    message_repo: BookingMessageRepository,
    user_repo: UserRepository,
    offer_repo: OfferRepository,
    profiles: ProfileService,
    availability: AvailabilityService,
    email: EmailService,
    events: Arc<dyn EventPublisher>,
    id_gen: IdGenerator,
}

impl BookingService {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        booking_repo: BookingRepository,
        message_repo: BookingMessageRepository,
        user_repo: UserRepository,
        offer_repo: OfferRepository,
        profiles: ProfileService,
        availability: AvailabilityService,
        email: EmailService,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            booking_repo,
            message_repo,
            user_repo,
            offer_repo,
            profiles,
            availability,
            email,
            events,
            id_gen: IdGenerator::new(),
        }
    }

    /// How `user` relates to `booking`. Anyone else is forbidden.
    pub async fn participant(
        &self,
        user: &user::Model,
        booking: &booking::Model,
    ) -> AppResult<Participant> {
        if booking.client_id == user.id {
            return Ok(Participant::Client);
        }
        if let Some(own) = self.profiles.provider_for_user(user).await? {
            let target =
                ProviderRef::from_columns(booking.therapist_id.as_deref(), booking.business_id.as_deref());
            if target.as_ref() == Some(&own) {
                return Ok(Participant::Provider(own));
            }
        }
        Err(AppError::Forbidden(
            "You are not a participant of this booking".to_string(),
        ))
    }

    /// Load a booking and check that `user` takes part in it.
    pub async fn get_for_participant(
        &self,
        user: &user::Model,
        booking_id: &str,
    ) -> AppResult<(booking::Model, Participant)> {
        let booking = self.booking_repo.get_by_id(booking_id).await?;
        let participant = self.participant(user, &booking).await?;
        Ok((booking, participant))
    }

    /// Owner of the booked provider profile.
    pub async fn provider_owner(&self, booking: &booking::Model) -> AppResult<ProviderOwner> {
        let provider =
            ProviderRef::from_columns(booking.therapist_id.as_deref(), booking.business_id.as_deref())
                .ok_or_else(|| AppError::Internal(format!("Booking {} has no provider", booking.id)))?;
        self.profiles.owner_of(&provider).await
    }

    /// Book a slot.
    pub async fn create_booking(
        &self,
        client: &user::Model,
        input: CreateBookingInput,
    ) -> AppResult<booking::Model> {
        input.validate()?;

        if client.role != UserRole::Client {
            return Err(AppError::Forbidden("Only clients can book sessions".to_string()));
        }
        if !is_valid_slot(&input.time) {
            return Err(AppError::Validation(format!("Invalid time: {}", input.time)));
        }
        if input.date < Utc::now().date_naive() {
            return Err(AppError::BadRequest("Cannot book a date in the past".to_string()));
        }

        let query = self.availability_query(&input).await?;
        let availability = self.availability.resolve(&query).await?;
        let time = slot_key(&input.time).to_string();

        if availability.taken.iter().any(|t| slot_key(t) == time) {
            return Err(AppError::Conflict("Time slot is no longer available".to_string()));
        }
        if !availability.slots.iter().any(|s| slot_key(s) == time) {
            return Err(AppError::BadRequest(format!(
                "{time} is not available on {}",
                input.date
            )));
        }

        let (therapist_id, business_id) = availability.provider.columns();
        let model = booking::ActiveModel {
            id: Set(self.id_gen.generate()),
            client_id: Set(client.id.clone()),
            therapist_id: Set(therapist_id),
            business_id: Set(business_id),
            offer_id: Set(input.offer_id),
            date: Set(input.date),
            time: Set(time),
            status: Set(BookingStatus::Pending),
            notes: Set(input.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let booking = self.booking_repo.create(model).await?;
        info!(
            booking = %booking.id,
            provider = %availability.provider.id(),
            date = %booking.date,
            time = %booking.time,
            "Booking created"
        );

        self.notify_booking_request(client, &booking).await;
        Ok(booking)
    }

    async fn availability_query(&self, input: &CreateBookingInput) -> AppResult<AvailabilityQuery> {
        if let Some(offer_id) = &input.offer_id {
            let offer = self.offer_repo.get_by_id(offer_id).await?;
            if !offer.active {
                return Err(AppError::BadRequest("This offer is no longer available".to_string()));
            }
            let mismatch = input
                .therapist_id
                .as_ref()
                .is_some_and(|id| offer.therapist_id.as_ref() != Some(id))
                || input
                    .business_id
                    .as_ref()
                    .is_some_and(|id| offer.business_id.as_ref() != Some(id));
            if mismatch {
                return Err(AppError::BadRequest(
                    "Offer does not belong to the selected provider".to_string(),
                ));
            }
            return Ok(AvailabilityQuery {
                offer_id: Some(offer.id),
                date: Some(input.date),
                ..Default::default()
            });
        }

        match (&input.therapist_id, &input.business_id) {
            (Some(_), Some(_)) => Err(AppError::BadRequest(
                "Book either a therapist or a business, not both".to_string(),
            )),
            (None, None) => Err(AppError::BadRequest(
                "therapistId, businessId or offerId is required".to_string(),
            )),
            (therapist_id, business_id) => Ok(AvailabilityQuery {
                therapist_id: therapist_id.clone(),
                business_id: business_id.clone(),
                offer_id: None,
                date: Some(input.date),
            }),
        }
    }

    async fn notify_booking_request(&self, client: &user::Model, booking: &booking::Model) {
        let result = async {
            let owner = self.provider_owner(booking).await?;
            let provider_user = self.user_repo.get_by_id(&owner.user_id).await?;
            let template = EmailTemplate::BookingRequest {
                provider_name: owner.display_name,
                client_name: client.name.clone(),
                date: booking.date.to_string(),
                time: booking.time.clone(),
                notes: booking.notes.clone(),
                dashboard_url: self.email.link("dashboard/bookings"),
            };
            self.email.send_best_effort(&provider_user.email, &template).await;
            AppResult::Ok(())
        }
        .await;

        if let Err(e) = result {
            warn!(booking = %booking.id, error = %e, "Could not notify provider of booking");
        }
    }

    /// Confirm, cancel or complete a booking.
    pub async fn update_status(
        &self,
        actor: &user::Model,
        booking_id: &str,
        input: UpdateStatusInput,
    ) -> AppResult<booking::Model> {
        input.validate()?;

        let (booking, participant) = self.get_for_participant(actor, booking_id).await?;
        let from = booking.status;
        authorize_transition(&participant, from, input.status)?;

        let notes = append_reason(
            booking.notes.clone(),
            participant.label(),
            input.reason.as_deref(),
        );

        let mut active: booking::ActiveModel = booking.into();
        active.status = Set(input.status);
        active.notes = Set(notes);
        active.updated_at = Set(Some(Utc::now().into()));
        let booking = self.booking_repo.update_from_status(active, from).await?;

        info!(
            booking = %booking.id,
            from = from.as_str(),
            to = booking.status.as_str(),
            by = participant.label(),
            "Booking status changed"
        );

        if let Err(e) = self
            .events
            .publish_booking_event(
                &booking.id,
                BookingEvent::StatusChanged {
                    status: booking.status,
                    notes: booking.notes.clone(),
                },
            )
            .await
        {
            warn!(booking = %booking.id, error = %e, "Failed to publish status change");
        }

        let reason = input
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        self.notify_status_change(&participant, &booking, reason).await;

        Ok(booking)
    }

    async fn notify_status_change(
        &self,
        participant: &Participant,
        booking: &booking::Model,
        reason: Option<String>,
    ) {
        let result = async {
            let owner = self.provider_owner(booking).await?;
            let client = self.user_repo.get_by_id(&booking.client_id).await?;

            let (to, template) = match participant {
                Participant::Client => {
                    let provider_user = self.user_repo.get_by_id(&owner.user_id).await?;
                    (
                        provider_user.email,
                        EmailTemplate::BookingCancellation {
                            provider_name: owner.display_name,
                            client_name: client.name,
                            date: booking.date.to_string(),
                            time: booking.time.clone(),
                            reason,
                        },
                    )
                }
                Participant::Provider(_) => {
                    let review_url = (booking.status == BookingStatus::Completed)
                        .then(|| self.email.link(&format!("bookings/{}/review", booking.id)));
                    (
                        client.email,
                        EmailTemplate::BookingStatus {
                            client_name: client.name,
                            provider_name: owner.display_name,
                            date: booking.date.to_string(),
                            time: booking.time.clone(),
                            status: booking.status.as_str().to_string(),
                            reason,
                            review_url,
                        },
                    )
                }
            };

            self.email.send_best_effort(&to, &template).await;
            AppResult::Ok(())
        }
        .await;

        if let Err(e) = result {
            warn!(booking = %booking.id, error = %e, "Could not send status email");
        }
    }

    /// A booking with contact details, as seen by one participant.
    pub async fn get_booking(&self, viewer: &user::Model, booking_id: &str) -> AppResult<BookingDetail> {
        let (booking, participant) = self.get_for_participant(viewer, booking_id).await?;
        let provider = self.provider_owner(&booking).await?;
        let client = self.user_repo.get_by_id(&booking.client_id).await?;

        let (client, is_masked) = match participant {
            Participant::Provider(_) => client_contact(&client, booking.status),
            Participant::Client => (client_contact(&client, BookingStatus::Confirmed).0, false),
        };
        let unread_count = self.message_repo.count_unread(&booking.id, &viewer.id).await?;

        Ok(BookingDetail {
            booking,
            provider,
            client,
            is_masked,
            unread_count,
        })
    }

    /// The client's bookings, newest first.
    pub async fn list_client_bookings(
        &self,
        client: &user::Model,
        filter: &BookingFilter,
    ) -> AppResult<Vec<ClientBookingRow>> {
        let (limit, offset) = filter.page();
        let bookings = self
            .booking_repo
            .list_for_client(&client.id, filter.status, limit, offset)
            .await?;

        let mut rows = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let unread_count = self.message_repo.count_unread(&booking.id, &client.id).await?;
            rows.push(ClientBookingRow {
                booking,
                unread_count,
            });
        }
        Ok(rows)
    }

    /// Bookings received by the signed-in provider, newest first.
    pub async fn list_provider_bookings(
        &self,
        provider_user: &user::Model,
        filter: &BookingFilter,
    ) -> AppResult<Vec<ProviderBookingRow>> {
        let provider = self.profiles.require_provider(provider_user).await?;
        let (limit, offset) = filter.page();
        let bookings = self
            .booking_repo
            .list_for_provider(&provider, filter.status, limit, offset)
            .await?;

        let mut client_ids: Vec<String> = bookings.iter().map(|b| b.client_id.clone()).collect();
        client_ids.sort();
        client_ids.dedup();
        let clients: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&client_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let mut rows = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let (client, is_masked) = match clients.get(&booking.client_id) {
                Some(user) => client_contact(user, booking.status),
                None => (
                    ClientContact {
                        id: booking.client_id.clone(),
                        name: String::new(),
                        email: None,
                        phone: None,
                    },
                    booking.status == BookingStatus::Pending,
                ),
            };
            let unread_count = self
                .message_repo
                .count_unread(&booking.id, &provider_user.id)
                .await?;
            rows.push(ProviderBookingRow {
                booking,
                client,
                is_masked,
                unread_count,
            });
        }
        Ok(rows)
    }
}
