//! Booking repository.

use std::sync::Arc;

use crate::{
    ProviderRef,
    entities::{
        Booking,
        booking::{self, BookingStatus},
    },
    write_err,
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, sea_query::SimpleExpr,
};
use terapie_common::{AppError, AppResult};

/// Booking repository.
#[derive(Clone)]
pub struct BookingRepository {
    db: Arc<DatabaseConnection>,
}

fn provider_filter(provider: &ProviderRef) -> SimpleExpr {
    match provider {
        ProviderRef::Therapist(id) => booking::Column::TherapistId.eq(id.as_str()),
        ProviderRef::Business(id) => booking::Column::BusinessId.eq(id.as_str()),
    }
}

impl BookingRepository {
    /// Create a new booking repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a booking. A live booking on the same slot yields `Conflict`.
    pub async fn create(&self, model: booking::ActiveModel) -> AppResult<booking::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| write_err(e, "Time slot is no longer available"))
    }

    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<booking::Model>> {
        Booking::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn get_by_id(&self, id: &str) -> AppResult<booking::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::BookingNotFound(id.to_string()))
    }

    /// Apply `model` only while the stored status is still `from`.
    /// A booking that moved on in the meantime yields `Conflict`.
    pub async fn update_from_status(
        &self,
        model: booking::ActiveModel,
        from: BookingStatus,
    ) -> AppResult<booking::Model> {
        Booking::update(model)
            .filter(booking::Column::Status.eq(from))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => AppError::Conflict(format!(
                    "Booking is no longer {}",
                    from.as_str()
                )),
                e => AppError::Database(e.to_string()),
            })
    }

    /// Times held by non-cancelled bookings of a provider on a date.
    pub async fn taken_times(
        &self,
        provider: &ProviderRef,
        date: NaiveDate,
    ) -> AppResult<Vec<String>> {
        let rows: Vec<String> = Booking::find()
            .select_only()
            .column(booking::Column::Time)
            .filter(provider_filter(provider))
            .filter(booking::Column::Date.eq(date))
            .filter(booking::Column::Status.ne(BookingStatus::Cancelled))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows)
    }

    /// Bookings made by a client, newest first.
    pub async fn list_for_client(
        &self,
        client_id: &str,
        status: Option<BookingStatus>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<booking::Model>> {
        let query = Booking::find().filter(booking::Column::ClientId.eq(client_id));

        Self::with_status(query, status)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Bookings received by a provider, newest first.
    pub async fn list_for_provider(
        &self,
        provider: &ProviderRef,
        status: Option<BookingStatus>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<booking::Model>> {
        let query = Booking::find().filter(provider_filter(provider));

        Self::with_status(query, status)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn with_status(query: Select<Booking>, status: Option<BookingStatus>) -> Select<Booking> {
        let query = match status {
            Some(status) => query.filter(booking::Column::Status.eq(status)),
            None => query,
        };
        query
            .order_by_desc(booking::Column::Date)
            .order_by_desc(booking::Column::Time)
    }

    /// The client's most recent completed booking with a provider.
    pub async fn find_latest_completed(
        &self,
        client_id: &str,
        provider: &ProviderRef,
    ) -> AppResult<Option<booking::Model>> {
        Booking::find()
            .filter(booking::Column::ClientId.eq(client_id))
            .filter(provider_filter(provider))
            .filter(booking::Column::Status.eq(BookingStatus::Completed))
            .order_by_desc(booking::Column::Date)
            .order_by_desc(booking::Column::Time)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn count_by_status(&self, status: BookingStatus) -> AppResult<u64> {
        Booking::find()
            .filter(booking::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
