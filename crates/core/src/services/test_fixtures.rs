//! Model builders shared by service tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::{DatabaseConnection, Statement, Value};
use serde_json::json;
use terapie_common::AppResult;
use terapie_db::entities::{
    booking::{self, BookingStatus},
    business_profile, offer, therapist_profile,
    user::{self, UserRole},
};

use super::event_publisher::{BookingEvent, EventPublisher};

pub fn user_model(id: &str, role: UserRole) -> user::Model {
    user::Model {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        name: format!("User {id}"),
        phone: Some("0700000000".to_string()),
        role,
        password_hash: String::new(),
        token: Some(format!("token-{id}")),
        requires_password_change: false,
        email_confirmed: true,
        confirmation_token_hash: None,
        reset_token_hash: None,
        reset_token_expires_at: None,
        notification_preferences: json!({}),
        avatar_url: None,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

pub fn therapist_model(id: &str, user_id: &str) -> therapist_profile::Model {
    therapist_profile::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        name: format!("Therapist {id}"),
        title: Some("Psihoterapeut".to_string()),
        bio: None,
        specialties: json!(["anxietate"]),
        specializations: json!([]),
        medical_code: None,
        location: Some("Cluj-Napoca".to_string()),
        price_range: None,
        languages: json!(["română"]),
        education: json!([]),
        availability: None,
        weekly_schedule: None,
        available_slots: json!(["09:00", "10:00", "11:00"]),
        image_url: None,
        rating: 0.0,
        review_count: 0,
        verified: true,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

pub fn business_model(id: &str, user_id: &str) -> business_profile::Model {
    business_profile::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        company_name: format!("Business {id}"),
        description: None,
        location: Some("București".to_string()),
        address: None,
        phone: None,
        website: None,
        registration_code: None,
        image_url: None,
        weekly_schedule: None,
        rating: 0.0,
        review_count: 0,
        verified: true,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

pub fn offer_model(id: &str, therapist_id: Option<&str>, business_id: Option<&str>) -> offer::Model {
    offer::Model {
        id: id.to_string(),
        therapist_id: therapist_id.map(ToString::to_string),
        business_id: business_id.map(ToString::to_string),
        title: format!("Offer {id}"),
        description: None,
        long_description: None,
        price: 200,
        original_price: None,
        location: None,
        duration: Some("60 min".to_string()),
        category: Some("masaj".to_string()),
        tags: json!([]),
        image_url: None,
        validity: None,
        availability: json!({ "monday": ["10:00", "12:00"] }),
        active: true,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

pub fn booking_model(
    id: &str,
    client_id: &str,
    therapist_id: Option<&str>,
    status: BookingStatus,
) -> booking::Model {
    booking::Model {
        id: id.to_string(),
        client_id: client_id.to_string(),
        therapist_id: therapist_id.map(ToString::to_string),
        business_id: None,
        offer_id: None,
        date: NaiveDate::from_ymd_opt(2030, 1, 7).unwrap_or_default(),
        time: "09:00".to_string(),
        status,
        notes: None,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

/// Statements run on a mock connection. All other handles to the
/// connection must be dropped first.
pub fn executed_statements(conn: Arc<DatabaseConnection>) -> Vec<Statement> {
    Arc::try_unwrap(conn)
        .map(DatabaseConnection::into_transaction_log)
        .unwrap_or_default()
        .iter()
        .flat_map(|txn| txn.statements().to_vec())
        .collect()
}

pub fn executed_sql(conn: Arc<DatabaseConnection>) -> Vec<String> {
    executed_statements(conn).into_iter().map(|stmt| stmt.sql).collect()
}

/// Columns assigned by an UPDATE, without its WHERE and RETURNING parts.
pub fn set_clause(sql: &str) -> &str {
    let start = sql.find(" SET ").map_or(0, |i| i + 5);
    let end = sql.find(" WHERE ").unwrap_or(sql.len());
    sql.get(start..end).unwrap_or_default()
}

/// Whether a statement was bound with `value`.
pub fn binds(stmt: &Statement, value: &str) -> bool {
    stmt.values
        .as_ref()
        .is_some_and(|values| values.0.contains(&Value::from(value)))
}

/// Publisher that keeps every event in memory.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<(String, BookingEvent)>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<(String, BookingEvent)> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish_booking_event(&self, booking_id: &str, event: BookingEvent) -> AppResult<()> {
        if let Ok(mut events) = self.events.lock() {
            events.push((booking_id.to_string(), event));
        }
        Ok(())
    }
}
