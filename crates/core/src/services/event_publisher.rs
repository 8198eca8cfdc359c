//! Event publisher service.
//!
//! Services publish booking events through this trait without knowing how
//! they reach subscribers. The in-process implementation is
//! [`BookingHub`](super::realtime::BookingHub).

use async_trait::async_trait;
use serde::Serialize;
use terapie_common::AppResult;
use terapie_db::entities::{booking::BookingStatus, booking_message};

/// Events delivered to the participants of a booking.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "body", rename_all = "camelCase")]
pub enum BookingEvent {
    /// A message was inserted.
    #[serde(rename_all = "camelCase")]
    Message {
        message: booking_message::Model,
        /// Temporary id the sender used for its optimistic row.
        client_id: Option<String>,
    },
    /// A participant read the other party's messages.
    #[serde(rename_all = "camelCase")]
    MessagesRead { reader_id: String, count: u64 },
    /// The booking changed status.
    #[serde(rename_all = "camelCase")]
    StatusChanged {
        status: BookingStatus,
        notes: Option<String>,
    },
}

/// Trait for publishing real-time events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event to everyone watching a booking.
    async fn publish_booking_event(&self, booking_id: &str, event: BookingEvent)
    -> AppResult<()>;
}

/// A no-op implementation for tests or when real-time events are disabled.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish_booking_event(
        &self,
        _booking_id: &str,
        _event: BookingEvent,
    ) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_shape() {
        let event = BookingEvent::MessagesRead {
            reader_id: "u1".to_string(),
            count: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "messagesRead");
        assert_eq!(json["body"]["readerId"], "u1");
        assert_eq!(json["body"]["count"], 3);
    }

    #[tokio::test]
    async fn test_noop_publisher() {
        let publisher = NoOpEventPublisher;
        let result = publisher
            .publish_booking_event(
                "b1",
                BookingEvent::StatusChanged {
                    status: BookingStatus::Confirmed,
                    notes: None,
                },
            )
            .await;
        assert!(result.is_ok());
    }
}
