//! Server-Sent Events for booking conversations.
//!
//! `GET /api/bookings/{id}/events` streams the same events the WebSocket
//! `booking` channel carries, for clients that cannot hold a socket open.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream, StreamExt};
use terapie_common::AppResult;
use terapie_core::{BookingEvent, BookingSubscription};
use tracing::info;

use crate::{extractors::AuthUser, middleware::AppState};

/// SSE event name for a booking event.
#[must_use]
pub const fn event_name(event: &BookingEvent) -> &'static str {
    match event {
        BookingEvent::Message { .. } => "message",
        BookingEvent::MessagesRead { .. } => "messagesRead",
        BookingEvent::StatusChanged { .. } => "statusChanged",
    }
}

fn to_sse_event(event: &BookingEvent) -> Event {
    Event::default()
        .event(event_name(event))
        .json_data(event)
        .unwrap_or_else(|_| Event::default().event("error").data("unserializable event"))
}

/// Events of one subscription, ending when the hub drops the channel.
pub fn subscription_stream(
    subscription: BookingSubscription,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(subscription, |mut subscription| async move {
        let event = subscription.recv().await?;
        Some((Ok(to_sse_event(&event)), subscription))
    })
}

/// Stream a booking's events to one of its participants.
pub async fn booking_events(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let (booking, _) = state
        .booking_service
        .get_for_participant(&user, &id)
        .await?;

    let subscription = state.booking_hub.subscribe(&booking.id);
    info!(user = %user.id, booking = %booking.id, "SSE subscriber connected");

    let connected = stream::once(async move {
        Ok(Event::default()
            .event("connected")
            .data(format!("{{\"bookingId\":\"{}\"}}", booking.id)))
    });

    Ok(Sse::new(connected.chain(subscription_stream(subscription))).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use terapie_core::BookingHub;
    use terapie_db::entities::booking::BookingStatus;

    #[test]
    fn test_event_names() {
        let read = BookingEvent::MessagesRead {
            reader_id: "u1".to_string(),
            count: 2,
        };
        let status = BookingEvent::StatusChanged {
            status: BookingStatus::Confirmed,
            notes: None,
        };
        assert_eq!(event_name(&read), "messagesRead");
        assert_eq!(event_name(&status), "statusChanged");
    }

    #[tokio::test]
    async fn test_subscription_stream_yields_published_events() {
        let hub = Arc::new(BookingHub::new(8));
        let mut events = Box::pin(subscription_stream(hub.subscribe("b1")));

        hub.publish(
            "b1",
            BookingEvent::StatusChanged {
                status: BookingStatus::Cancelled,
                notes: None,
            },
        );

        let next = tokio::time::timeout(Duration::from_secs(1), events.next())
            .await
            .unwrap();
        assert!(matches!(next, Some(Ok(_))));
    }

    #[tokio::test]
    async fn test_dropping_stream_releases_channel() {
        let hub = Arc::new(BookingHub::new(8));
        let events = subscription_stream(hub.subscribe("b1"));
        assert_eq!(hub.subscriber_count("b1"), 1);

        drop(events);
        assert_eq!(hub.channel_count(), 0);
    }
}
