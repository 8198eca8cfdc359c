//! Per-booking chat between a client and a provider.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use terapie_common::{AppError, AppResult, IdGenerator};
use terapie_db::{
    entities::{booking, booking_message, user},
    repositories::{BookingMessageRepository, UserRepository},
};
use tracing::{info, warn};
use validator::Validate;

use super::booking::{BookingService, Participant};
use super::email::EmailService;
use super::email_template::EmailTemplate;
use super::event_publisher::{BookingEvent, EventPublisher};

/// Longest accepted message, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 5000;

const PREVIEW_LENGTH: usize = 100;

/// Input for sending a message.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageInput {
    pub content: String,
    /// Temporary id of the sender's optimistic row, echoed back.
    #[validate(length(max = 64))]
    pub client_id: Option<String>,
}

/// A stored message plus the echoed temporary id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
    #[serde(flatten)]
    pub message: booking_message::Model,
    pub client_id: Option<String>,
}

/// Trim and bound message content.
pub fn normalize_content(content: &str) -> AppResult<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("Message cannot be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(AppError::Validation(format!(
            "Message cannot exceed {MAX_MESSAGE_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// First hundred characters, with an ellipsis when cut.
#[must_use]
pub fn preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_LENGTH {
        let head: String = content.chars().take(PREVIEW_LENGTH).collect();
        format!("{head}...")
    } else {
        content.to_string()
    }
}

/// Messaging service.
#[derive(Clone)]
pub struct MessagingService {
    message_repo: BookingMessageRepository,
    user_repo: UserRepository,
    bookings: BookingService,
    email: EmailService,
    events: Arc<dyn EventPublisher>,
    id_gen: IdGenerator,
}

impl MessagingService {
    #[must_use]
    pub fn new(
        message_repo: BookingMessageRepository,
        user_repo: UserRepository,
        bookings: BookingService,
        email: EmailService,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            message_repo,
            user_repo,
            bookings,
            email,
            events,
            id_gen: IdGenerator::new(),
        }
    }

    /// Post a message to a booking thread.
    pub async fn send_message(
        &self,
        sender: &user::Model,
        booking_id: &str,
        input: SendMessageInput,
    ) -> AppResult<SentMessage> {
        input.validate()?;
        let content = normalize_content(&input.content)?;
        let (booking, participant) = self.bookings.get_for_participant(sender, booking_id).await?;

        let model = booking_message::ActiveModel {
            id: Set(self.id_gen.generate()),
            booking_id: Set(booking.id.clone()),
            sender_id: Set(sender.id.clone()),
            content: Set(content),
            read_at: Set(None),
            created_at: Set(Utc::now().into()),
        };
        let message = self.message_repo.create(model).await?;
        info!(booking = %booking.id, message = %message.id, "Booking message sent");

        if let Err(e) = self
            .events
            .publish_booking_event(
                &booking.id,
                BookingEvent::Message {
                    message: message.clone(),
                    client_id: input.client_id.clone(),
                },
            )
            .await
        {
            warn!(booking = %booking.id, error = %e, "Failed to publish message event");
        }

        self.notify_recipient(sender, &participant, &booking, &message).await;

        Ok(SentMessage {
            message,
            client_id: input.client_id,
        })
    }

    async fn notify_recipient(
        &self,
        sender: &user::Model,
        participant: &Participant,
        booking: &booking::Model,
        message: &booking_message::Model,
    ) {
        let result = async {
            let (recipient_id, sender_name) = match participant {
                Participant::Client => {
                    let owner = self.bookings.provider_owner(booking).await?;
                    (owner.user_id, sender.name.clone())
                }
                Participant::Provider(_) => {
                    let owner = self.bookings.provider_owner(booking).await?;
                    (booking.client_id.clone(), owner.display_name)
                }
            };

            let recipient = self.user_repo.get_by_id(&recipient_id).await?;
            if !recipient.wants_booking_email() {
                return AppResult::Ok(());
            }

            let template = EmailTemplate::NewMessage {
                recipient_name: recipient.name.clone(),
                sender_name,
                preview: preview(&message.content),
                url: self.email.link(&format!("bookings/{}", booking.id)),
            };
            self.email.send_best_effort(&recipient.email, &template).await;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            warn!(booking = %booking.id, error = %e, "Could not send message notification");
        }
    }

    /// Messages of a booking, oldest first.
    pub async fn list_messages(
        &self,
        viewer: &user::Model,
        booking_id: &str,
    ) -> AppResult<Vec<booking_message::Model>> {
        let (booking, _) = self.bookings.get_for_participant(viewer, booking_id).await?;
        self.message_repo.list_for_booking(&booking.id).await
    }

    /// Mark the other party's messages as read. Returns how many changed.
    pub async fn mark_read(&self, viewer: &user::Model, booking_id: &str) -> AppResult<u64> {
        let (booking, _) = self.bookings.get_for_participant(viewer, booking_id).await?;
        let count = self.message_repo.mark_read(&booking.id, &viewer.id).await?;

        if count > 0 {
            if let Err(e) = self
                .events
                .publish_booking_event(
                    &booking.id,
                    BookingEvent::MessagesRead {
                        reader_id: viewer.id.clone(),
                        count,
                    },
                )
                .await
            {
                warn!(booking = %booking.id, error = %e, "Failed to publish read receipt");
            }
        }
        Ok(count)
    }

    /// Unread messages from the other party.
    pub async fn unread_count(&self, viewer: &user::Model, booking_id: &str) -> AppResult<u64> {
        let (booking, _) = self.bookings.get_for_participant(viewer, booking_id).await?;
        self.message_repo.count_unread(&booking.id, &viewer.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::availability::AvailabilityService;
    use crate::services::email::RecordingTransport;
    use crate::services::profile::ProfileService;
    use crate::services::test_fixtures::{
        RecordingPublisher, binds, booking_model, executed_statements, therapist_model, user_model,
    };
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use serde_json::json;
    use terapie_db::{
        entities::{booking::BookingStatus, user::UserRole},
        repositories::{
            BookingRepository, BusinessProfileRepository, OfferRepository,
            TherapistProfileRepository,
        },
    };

    fn message_model(id: &str, sender_id: &str, content: &str) -> booking_message::Model {
        booking_message::Model {
            id: id.to_string(),
            booking_id: "b1".to_string(),
            sender_id: sender_id.to_string(),
            content: content.to_string(),
            read_at: None,
            created_at: Utc::now().into(),
        }
    }

    fn confirmed_booking() -> booking::Model {
        booking_model("b1", "c1", Some("t1"), BookingStatus::Confirmed)
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }
    }

    struct Dbs {
        booking: MockDatabase,
        therapist: MockDatabase,
        message: MockDatabase,
        user: MockDatabase,
    }

    impl Default for Dbs {
        fn default() -> Self {
            Self {
                booking: MockDatabase::new(DatabaseBackend::Postgres),
                therapist: MockDatabase::new(DatabaseBackend::Postgres),
                message: MockDatabase::new(DatabaseBackend::Postgres),
                user: MockDatabase::new(DatabaseBackend::Postgres),
            }
        }
    }

    struct Harness {
        service: MessagingService,
        message_conn: Arc<DatabaseConnection>,
        transport: Arc<RecordingTransport>,
        events: Arc<RecordingPublisher>,
    }

    fn harness(dbs: Dbs) -> Harness {
        let empty = || Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let booking_repo = BookingRepository::new(Arc::new(dbs.booking.into_connection()));
        let therapist_repo = TherapistProfileRepository::new(Arc::new(dbs.therapist.into_connection()));
        let business_repo = BusinessProfileRepository::new(empty());
        let offer_repo = OfferRepository::new(empty());
        let message_conn = Arc::new(dbs.message.into_connection());
        let transport = Arc::new(RecordingTransport::new());
        let events = Arc::new(RecordingPublisher::default());
        let email = EmailService::new(
            transport.clone(),
            "https://terapie.ro",
            "Terapie",
            "admin@terapie.ro",
        );

        let bookings = BookingService::new(
            booking_repo.clone(),
            BookingMessageRepository::new(empty()),
            UserRepository::new(empty()),
            offer_repo.clone(),
            ProfileService::new(therapist_repo.clone(), business_repo.clone()),
            AvailabilityService::new(therapist_repo, business_repo, offer_repo, booking_repo),
            email.clone(),
            events.clone(),
        );
        let service = MessagingService::new(
            BookingMessageRepository::new(message_conn.clone()),
            UserRepository::new(Arc::new(dbs.user.into_connection())),
            bookings,
            email,
            events.clone(),
        );
        Harness {
            service,
            message_conn,
            transport,
            events,
        }
    }

    #[tokio::test]
    async fn test_client_message_echoes_client_id_and_notifies_provider() {
        let dbs = Dbs {
            booking: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[confirmed_booking()]]),
            therapist: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[therapist_model("t1", "u-t1")]]),
            message: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[message_model("m1", "c1", "Bună! Ne vedem mâine?")]]),
            user: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user_model("u-t1", UserRole::Therapist)]]),
        };
        let Harness {
            service,
            message_conn,
            transport,
            events,
        } = harness(dbs);
        let client = user_model("c1", UserRole::Client);

        let sent = service
            .send_message(
                &client,
                "b1",
                SendMessageInput {
                    content: "  Bună! Ne vedem mâine?  ".to_string(),
                    client_id: Some("tmp-1".to_string()),
                },
            )
            .await
            .unwrap();
        drop(service);

        assert_eq!(sent.client_id.as_deref(), Some("tmp-1"));
        assert_eq!(sent.message.id, "m1");

        let statements = executed_statements(message_conn);
        let insert = statements.iter().find(|s| s.sql.starts_with("INSERT")).unwrap();
        assert!(binds(insert, "Bună! Ne vedem mâine?"));
        assert!(binds(insert, "c1"));

        let events = events.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "b1");
        match &events[0].1 {
            BookingEvent::Message { message, client_id } => {
                assert_eq!(message.id, "m1");
                assert_eq!(client_id.as_deref(), Some("tmp-1"));
            }
            other => panic!("unexpected event {other:?}"),
        }

        let emails = transport.sent();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].to, "u-t1@example.com");
        assert!(emails[0].text_body.contains("Bună! Ne vedem mâine?"));
        assert!(emails[0].text_body.contains("https://terapie.ro/bookings/b1"));
    }

    #[tokio::test]
    async fn test_message_email_respects_booking_preference() {
        let mut client = user_model("c1", UserRole::Client);
        client.notification_preferences = json!({ "email_booking": false });

        let dbs = Dbs {
            booking: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[confirmed_booking()]]),
            // Participant check, then the owner lookup for the sender name.
            therapist: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[therapist_model("t1", "u-t1")]])
                .append_query_results([[therapist_model("t1", "u-t1")]]),
            message: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[message_model("m2", "u-t1", "Confirmat")]]),
            user: MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[client]]),
        };
        let Harness {
            service,
            transport,
            events,
            ..
        } = harness(dbs);
        let provider = user_model("u-t1", UserRole::Therapist);

        let sent = service
            .send_message(
                &provider,
                "b1",
                SendMessageInput {
                    content: "Confirmat".to_string(),
                    client_id: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(sent.client_id, None);
        assert_eq!(events.events().len(), 1);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_non_participant_cannot_message() {
        let dbs = Dbs {
            booking: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[confirmed_booking()]]),
            ..Default::default()
        };
        let Harness {
            service,
            message_conn,
            transport,
            events,
        } = harness(dbs);
        let stranger = user_model("c9", UserRole::Client);

        let result = service
            .send_message(
                &stranger,
                "b1",
                SendMessageInput {
                    content: "Salut".to_string(),
                    client_id: None,
                },
            )
            .await;
        drop(service);

        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert!(executed_statements(message_conn).is_empty());
        assert!(events.events().is_empty());
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_mark_read_publishes_receipt() {
        let dbs = Dbs {
            booking: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[confirmed_booking()]]),
            message: MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                },
            ]),
            ..Default::default()
        };
        let Harness { service, events, .. } = harness(dbs);
        let client = user_model("c1", UserRole::Client);

        assert_eq!(service.mark_read(&client, "b1").await.unwrap(), 3);

        let events = events.events();
        assert_eq!(events.len(), 1);
        match &events[0].1 {
            BookingEvent::MessagesRead { reader_id, count } => {
                assert_eq!(reader_id, "c1");
                assert_eq!(*count, 3);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_mark_read_with_nothing_unread_is_silent() {
        let dbs = Dbs {
            booking: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[confirmed_booking()]]),
            message: MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ]),
            ..Default::default()
        };
        let Harness { service, events, .. } = harness(dbs);
        let client = user_model("c1", UserRole::Client);

        assert_eq!(service.mark_read(&client, "b1").await.unwrap(), 0);
        assert!(events.events().is_empty());
    }

    #[tokio::test]
    async fn test_list_messages_and_unread_count() {
        let dbs = Dbs {
            booking: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[confirmed_booking()]])
                .append_query_results([[confirmed_booking()]]),
            message: MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    message_model("m1", "c1", "Bună"),
                    message_model("m2", "u-t1", "Salut"),
                ]])
                .append_query_results([[count_row(1)]]),
            ..Default::default()
        };
        let Harness { service, .. } = harness(dbs);
        let client = user_model("c1", UserRole::Client);

        let messages = service.list_messages(&client, "b1").await.unwrap();
        assert_eq!(
            messages.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            ["m1", "m2"]
        );
        assert_eq!(service.unread_count(&client, "b1").await.unwrap(), 1);
    }

    #[test]
    fn test_normalize_content() {
        assert_eq!(normalize_content("  Bună ziua!  ").unwrap(), "Bună ziua!");
        assert!(matches!(normalize_content(" \n\t "), Err(AppError::Validation(_))));
        assert!(normalize_content(&"ă".repeat(MAX_MESSAGE_LENGTH)).is_ok());
        assert!(normalize_content(&"a".repeat(MAX_MESSAGE_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("scurt"), "scurt");
        let long = "ș".repeat(150);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), 103);
        assert_eq!(preview(&"a".repeat(100)), "a".repeat(100));
    }
}
