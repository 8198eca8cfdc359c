//! Booking entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Booking lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl BookingStatus {
    /// Whether `next` is a legal transition from this state.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::Completed | Self::Cancelled)
        )
    }

    /// Cancelled and completed bookings never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "booking")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub client_id: String,

    /// Booked therapist profile
    #[sea_orm(nullable, indexed)]
    pub therapist_id: Option<String>,

    /// Booked business profile
    #[sea_orm(nullable, indexed)]
    pub business_id: Option<String>,

    #[sea_orm(nullable)]
    pub offer_id: Option<String>,

    pub date: Date,

    /// Start time, `HH:MM`
    pub time: String,

    #[sea_orm(indexed)]
    pub status: BookingStatus,

    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ClientId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Client,
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
    #[sea_orm(
        belongs_to = "super::offer::Entity",
        from = "Column::OfferId",
        to = "super::offer::Column::Id",
        on_delete = "SetNull"
    )]
    Offer,
    #[sea_orm(has_many = "super::booking_message::Entity")]
    BookingMessage,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::booking_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BookingMessage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
