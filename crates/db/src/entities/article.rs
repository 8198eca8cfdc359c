//! Blog article entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tag that marks the single featured article.
pub const FEATURED_TAG: &str = "Recomandat";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "article")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    #[sea_orm(unique)]
    pub slug: String,

    /// Sanitized HTML from the editor
    #[sea_orm(column_type = "Text")]
    pub content: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub excerpt: Option<String>,

    #[sea_orm(nullable)]
    pub image_url: Option<String>,

    #[sea_orm(nullable)]
    pub author_name: Option<String>,

    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,

    #[sea_orm(indexed)]
    pub published_at: DateTimeWithTimeZone,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Tags as plain strings; non-string entries are ignored.
    #[must_use]
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_array()
            .map(|tags| {
                tags.iter()
                    .filter_map(|t| t.as_str().map(ToString::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_featured(&self) -> bool {
        self.tag_list().iter().any(|t| t == FEATURED_TAG)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
