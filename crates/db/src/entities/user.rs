//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role. Therapist and business roles are granted by approval only.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[sea_orm(string_value = "client")]
    #[default]
    Client,
    #[sea_orm(string_value = "therapist")]
    Therapist,
    #[sea_orm(string_value = "business")]
    Business,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl UserRole {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Therapist => "therapist",
            Self::Business => "business",
            Self::Admin => "admin",
        }
    }

    /// Whether the role owns a public profile that can be booked.
    #[must_use]
    pub const fn is_provider(&self) -> bool {
        matches!(self, Self::Therapist | Self::Business)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Lowercased login email
    #[sea_orm(unique)]
    pub email: String,

    /// Display name
    pub name: String,

    #[sea_orm(nullable)]
    pub phone: Option<String>,

    pub role: UserRole,

    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Session bearer token
    #[sea_orm(unique, nullable)]
    #[serde(skip_serializing)]
    pub token: Option<String>,

    /// Set for accounts provisioned with a temporary password
    #[sea_orm(default_value = false)]
    pub requires_password_change: bool,

    #[sea_orm(default_value = false)]
    pub email_confirmed: bool,

    /// SHA-256 of the pending email confirmation token
    #[sea_orm(nullable)]
    #[serde(skip_serializing)]
    pub confirmation_token_hash: Option<String>,

    /// SHA-256 of the pending password reset token
    #[sea_orm(nullable)]
    #[serde(skip_serializing)]
    pub reset_token_hash: Option<String>,

    #[sea_orm(nullable)]
    #[serde(skip_serializing)]
    pub reset_token_expires_at: Option<DateTimeWithTimeZone>,

    /// `{"email_booking": bool, ...}`
    #[sea_orm(column_type = "JsonBinary")]
    pub notification_preferences: Json,

    #[sea_orm(nullable)]
    pub avatar_url: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Whether booking emails are wanted. Missing preference means yes.
    #[must_use]
    pub fn wants_booking_email(&self) -> bool {
        self.notification_preferences
            .get("email_booking")
            .and_then(Json::as_bool)
            .unwrap_or(true)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::therapist_profile::Entity")]
    TherapistProfile,
    #[sea_orm(has_one = "super::business_profile::Entity")]
    BusinessProfile,
}

impl Related<super::therapist_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TherapistProfile.def()
    }
}

impl Related<super::business_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BusinessProfile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_with_prefs(prefs: Json) -> Model {
        Model {
            id: "u1".to_string(),
            email: "a@example.com".to_string(),
            name: "Ana".to_string(),
            phone: None,
            role: UserRole::Client,
            password_hash: String::new(),
            token: None,
            requires_password_change: false,
            email_confirmed: true,
            confirmation_token_hash: None,
            reset_token_hash: None,
            reset_token_expires_at: None,
            notification_preferences: prefs,
            avatar_url: None,
            created_at: chrono::Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_booking_email_preference_defaults_to_true() {
        assert!(user_with_prefs(json!({})).wants_booking_email());
        assert!(user_with_prefs(json!({"email_booking": true})).wants_booking_email());
        assert!(!user_with_prefs(json!({"email_booking": false})).wants_booking_email());
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let mut user = user_with_prefs(json!({}));
        user.password_hash = "$argon2id$...".to_string();
        user.token = Some("tok".to_string());
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password_hash").is_none());
        assert!(value.get("token").is_none());
        assert_eq!(value["role"], "client");
    }
}
