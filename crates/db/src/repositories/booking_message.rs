//! Booking message repository.

use std::sync::Arc;

use crate::entities::{BookingMessage, booking_message};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, sea_query::Expr,
};
use terapie_common::{AppError, AppResult};

/// Repository for per-booking chat messages.
#[derive(Clone)]
pub struct BookingMessageRepository {
    db: Arc<DatabaseConnection>,
}

impl BookingMessageRepository {
    /// Create a new booking message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append a message.
    pub async fn create(
        &self,
        model: booking_message::ActiveModel,
    ) -> AppResult<booking_message::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All messages of a booking in insertion order.
    pub async fn list_for_booking(
        &self,
        booking_id: &str,
    ) -> AppResult<Vec<booking_message::Model>> {
        BookingMessage::find()
            .filter(booking_message::Column::BookingId.eq(booking_id))
            .order_by_asc(booking_message::Column::CreatedAt)
            .order_by_asc(booking_message::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Unread messages in a booking sent by someone other than `reader_id`.
    pub async fn count_unread(&self, booking_id: &str, reader_id: &str) -> AppResult<u64> {
        BookingMessage::find()
            .filter(booking_message::Column::BookingId.eq(booking_id))
            .filter(booking_message::Column::SenderId.ne(reader_id))
            .filter(booking_message::Column::ReadAt.is_null())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Stamp `read_at` on the other party's unread messages.
    pub async fn mark_read(&self, booking_id: &str, reader_id: &str) -> AppResult<u64> {
        let result = BookingMessage::update_many()
            .col_expr(
                booking_message::Column::ReadAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(booking_message::Column::BookingId.eq(booking_id))
            .filter(booking_message::Column::SenderId.ne(reader_id))
            .filter(booking_message::Column::ReadAt.is_null())
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
