//! Offer entity: a priced package a provider lists for booking.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "offer")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owning therapist profile
    #[sea_orm(nullable, indexed)]
    pub therapist_id: Option<String>,

    /// Owning business profile
    #[sea_orm(nullable, indexed)]
    pub business_id: Option<String>,

    pub title: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub long_description: Option<String>,

    /// Price in RON
    pub price: i32,

    /// Price before discount
    #[sea_orm(nullable)]
    pub original_price: Option<i32>,

    #[sea_orm(nullable, indexed)]
    pub location: Option<String>,

    /// Session length, e.g. "60 min"
    #[sea_orm(nullable)]
    pub duration: Option<String>,

    #[sea_orm(nullable, indexed)]
    pub category: Option<String>,

    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,

    #[sea_orm(nullable)]
    pub image_url: Option<String>,

    /// Validity note, e.g. "3 luni"
    #[sea_orm(nullable)]
    pub validity: Option<String>,

    /// `{"monday": ["09:00", "10:00"], ...}`
    #[sea_orm(column_type = "JsonBinary")]
    pub availability: Json,

    #[sea_orm(default_value = true)]
    pub active: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::therapist_profile::Entity",
        from = "Column::TherapistId",
        to = "super::therapist_profile::Column::Id",
        on_delete = "Cascade"
    )]
    TherapistProfile,
    #[sea_orm(
        belongs_to = "super::business_profile::Entity",
        from = "Column::BusinessId",
        to = "super::business_profile::Column::Id",
        on_delete = "Cascade"
    )]
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
