//! Reference to a bookable provider profile.

use serde::{Deserialize, Serialize};

/// A therapist or business profile id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ProviderRef {
    /// `therapist_profile.id`
    Therapist(String),
    /// `business_profile.id`
    Business(String),
}

impl ProviderRef {
    /// Build from the nullable pair stored on bookings, offers and reviews.
    /// The therapist wins when both are set.
    #[must_use]
    pub fn from_columns(therapist_id: Option<&str>, business_id: Option<&str>) -> Option<Self> {
        therapist_id
            .map(|id| Self::Therapist(id.to_string()))
            .or_else(|| business_id.map(|id| Self::Business(id.to_string())))
    }

    /// Profile id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Therapist(id) | Self::Business(id) => id,
        }
    }

    /// `(therapist_id, business_id)` column values.
    #[must_use]
    pub fn columns(&self) -> (Option<String>, Option<String>) {
        match self {
            Self::Therapist(id) => (Some(id.clone()), None),
            Self::Business(id) => (None, Some(id.clone())),
        }
    }

    /// Label used when annotating booking notes.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Therapist(_) => "Therapist",
            Self::Business(_) => "Business",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_columns_prefers_therapist() {
        assert_eq!(
            ProviderRef::from_columns(Some("t1"), Some("b1")),
            Some(ProviderRef::Therapist("t1".to_string()))
        );
        assert_eq!(
            ProviderRef::from_columns(None, Some("b1")),
            Some(ProviderRef::Business("b1".to_string()))
        );
        assert_eq!(ProviderRef::from_columns(None, None), None);
    }

    #[test]
    fn test_columns_roundtrip() {
        let provider = ProviderRef::Business("b9".to_string());
        let (t, b) = provider.columns();
        assert_eq!(ProviderRef::from_columns(t.as_deref(), b.as_deref()), Some(provider));
    }
}
