//! In-process realtime fan-out for booking threads.
//!
//! One broadcast channel per booking, created on first subscription and
//! dropped when its last subscriber goes away. Publishing to a booking
//! nobody watches is a no-op.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use terapie_common::AppResult;
use tokio::sync::broadcast;
use tracing::debug;

use super::event_publisher::{BookingEvent, EventPublisher};

const DEFAULT_CAPACITY: usize = 64;

/// Booking event hub.
pub struct BookingHub {
    channels: Mutex<HashMap<String, broadcast::Sender<BookingEvent>>>,
    capacity: usize,
}

impl Default for BookingHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl BookingHub {
    /// Create a hub whose channels buffer `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<String, broadcast::Sender<BookingEvent>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to a booking. Access control is the caller's job.
    pub fn subscribe(self: &Arc<Self>, booking_id: &str) -> BookingSubscription {
        let receiver = self
            .channels()
            .entry(booking_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();

        debug!(booking = %booking_id, "Realtime subscriber joined");

        BookingSubscription {
            hub: Arc::clone(self),
            booking_id: booking_id.to_string(),
            receiver,
        }
    }

    /// Live subscribers of a booking.
    #[must_use]
    pub fn subscriber_count(&self, booking_id: &str) -> usize {
        self.channels()
            .get(booking_id)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Bookings with at least one open channel.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels().len()
    }

    /// Send an event. Returns how many subscribers received it.
    pub fn publish(&self, booking_id: &str, event: BookingEvent) -> usize {
        self.channels()
            .get(booking_id)
            .and_then(|sender| sender.send(event).ok())
            .unwrap_or(0)
    }

    fn release(&self, booking_id: &str) {
        let mut channels = self.channels();
        // The departing receiver is still alive while this runs.
        let idle = channels
            .get(booking_id)
            .is_some_and(|sender| sender.receiver_count() <= 1);
        if idle {
            channels.remove(booking_id);
            debug!(booking = %booking_id, "Realtime channel closed");
        }
    }
}

#[async_trait]
impl EventPublisher for BookingHub {
    async fn publish_booking_event(
        &self,
        booking_id: &str,
        event: BookingEvent,
    ) -> AppResult<()> {
        let delivered = self.publish(booking_id, event);
        debug!(booking = %booking_id, delivered, "Booking event published");
        Ok(())
    }
}

/// A live subscription. Dropping it unsubscribes.
pub struct BookingSubscription {
    hub: Arc<BookingHub>,
    booking_id: String,
    receiver: broadcast::Receiver<BookingEvent>,
}

impl BookingSubscription {
    /// Booking this subscription watches.
    #[must_use]
    pub fn booking_id(&self) -> &str {
        &self.booking_id
    }

    /// Next event. Events missed by a slow subscriber are skipped.
    pub async fn recv(&mut self) -> Option<BookingEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(booking = %self.booking_id, skipped, "Realtime subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for BookingSubscription {
    fn drop(&mut self) {
        self.hub.release(&self.booking_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terapie_db::entities::booking::BookingStatus;

    fn status_event() -> BookingEvent {
        BookingEvent::StatusChanged {
            status: BookingStatus::Confirmed,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let hub = Arc::new(BookingHub::default());
        let mut first = hub.subscribe("b1");
        let mut second = hub.subscribe("b1");

        assert_eq!(hub.publish("b1", status_event()), 2);

        assert!(matches!(first.recv().await, Some(BookingEvent::StatusChanged { .. })));
        assert!(matches!(second.recv().await, Some(BookingEvent::StatusChanged { .. })));
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let hub = BookingHub::default();
        assert_eq!(hub.publish("nobody", status_event()), 0);
        assert_eq!(hub.channel_count(), 0);
    }

    #[test]
    fn test_channels_are_isolated() {
        let hub = Arc::new(BookingHub::default());
        let _a = hub.subscribe("b1");
        let _b = hub.subscribe("b2");

        assert_eq!(hub.publish("b1", status_event()), 1);
        assert_eq!(hub.channel_count(), 2);
    }

    #[test]
    fn test_channel_pruned_after_last_subscriber() {
        let hub = Arc::new(BookingHub::default());
        let first = hub.subscribe("b1");
        let second = hub.subscribe("b1");
        assert_eq!(hub.subscriber_count("b1"), 2);

        drop(first);
        assert_eq!(hub.subscriber_count("b1"), 1);
        assert_eq!(hub.channel_count(), 1);

        drop(second);
        assert_eq!(hub.channel_count(), 0);
    }

    #[tokio::test]
    async fn test_lagged_subscriber_skips_ahead() {
        let hub = Arc::new(BookingHub::new(2));
        let mut sub = hub.subscribe("b1");
        for count in 0..5 {
            hub.publish(
                "b1",
                BookingEvent::MessagesRead {
                    reader_id: "u1".to_string(),
                    count,
                },
            );
        }

        match sub.recv().await {
            Some(BookingEvent::MessagesRead { count, .. }) => assert_eq!(count, 3),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
