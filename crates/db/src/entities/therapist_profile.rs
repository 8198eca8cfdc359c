//! Therapist profile entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Public profile of an approved therapist.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "therapist_profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owning account (1:1)
    #[sea_orm(unique)]
    pub user_id: String,

    pub name: String,

    /// Professional title, e.g. "Psiholog clinician"
    #[sea_orm(nullable)]
    pub title: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,

    /// Free-form specialties shown on the card
    #[sea_orm(column_type = "JsonBinary")]
    pub specialties: Json,

    /// Accredited specializations from the application
    #[sea_orm(column_type = "JsonBinary")]
    pub specializations: Json,

    /// Professional registration code
    #[sea_orm(nullable)]
    pub medical_code: Option<String>,

    #[sea_orm(nullable, indexed)]
    pub location: Option<String>,

    #[sea_orm(nullable)]
    pub price_range: Option<String>,

    #[sea_orm(column_type = "JsonBinary")]
    pub languages: Json,

    /// `[{degree, institution, year}]`
    #[sea_orm(column_type = "JsonBinary")]
    pub education: Json,

    /// Human readable availability note
    #[sea_orm(nullable)]
    pub availability: Option<String>,

    /// `{"monday": {"active": true, "slots": ["09:00", ...]}, ...}`
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub weekly_schedule: Option<Json>,

    /// Slots used for days missing from the weekly schedule
    #[sea_orm(column_type = "JsonBinary")]
    pub available_slots: Json,

    #[sea_orm(nullable)]
    pub image_url: Option<String>,

    /// Mean review rating
    #[sea_orm(default_value = 0.0)]
    pub rating: f64,

    #[sea_orm(default_value = 0)]
    pub review_count: i32,

    #[sea_orm(default_value = false)]
    pub verified: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::offer::Entity")]
    Offer,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::offer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Offer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
