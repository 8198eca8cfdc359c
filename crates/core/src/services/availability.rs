//! Booking availability.
//!
//! A provider's free slots for a date are its base slots for that weekday
//! minus the times held by non-cancelled bookings. Base slots come from the
//! offer's availability map when booking through an offer, otherwise from
//! the therapist's weekly schedule with the flat `available_slots` list as
//! fallback for days the schedule does not mention.

use chrono::{Datelike, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use terapie_common::{AppError, AppResult};
use terapie_db::{
    ProviderRef,
    entities::{offer, therapist_profile},
    repositories::{
        BookingRepository, BusinessProfileRepository, OfferRepository, TherapistProfileRepository,
    },
};

/// Lowercase English day names, Monday first.
pub const DAY_NAMES: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

static SLOT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d(:[0-5]\d)?$").expect("valid slot regex"));

/// Lowercase English name of the date's weekday.
#[must_use]
pub fn day_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// `HH:MM`, optionally with seconds.
#[must_use]
pub fn is_valid_slot(slot: &str) -> bool {
    SLOT_RE.is_match(slot)
}

/// Comparison key of a slot: its first five characters.
#[must_use]
pub fn slot_key(slot: &str) -> &str {
    slot.get(..5).unwrap_or(slot)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Slots of a weekly schedule on a weekday. `None` when the schedule has no
/// entry for that day; an inactive day yields an empty list.
#[must_use]
pub fn schedule_slots(schedule: Option<&Value>, day: &str) -> Option<Vec<String>> {
    let day_schedule = schedule?.get(day)?;
    let active = day_schedule
        .get("active")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    Some(if active {
        string_list(day_schedule.get("slots"))
    } else {
        Vec::new()
    })
}

/// Base slots of a therapist on a weekday.
#[must_use]
pub fn therapist_base_slots(profile: &therapist_profile::Model, day: &str) -> Vec<String> {
    schedule_slots(profile.weekly_schedule.as_ref(), day)
        .unwrap_or_else(|| string_list(Some(&profile.available_slots)))
}

/// Base slots of an offer on a weekday.
#[must_use]
pub fn offer_base_slots(offer: &offer::Model, day: &str) -> Vec<String> {
    string_list(offer.availability.get(day))
}

/// Remove taken times from the base slots, preserving order.
#[must_use]
pub fn free_slots(base: Vec<String>, taken: &[String]) -> Vec<String> {
    base.into_iter()
        .filter(|slot| !taken.iter().any(|t| slot_key(t) == slot_key(slot)))
        .collect()
}

/// Check a weekly schedule document before it is stored.
pub fn validate_weekly_schedule(schedule: &Value) -> AppResult<()> {
    let days = schedule
        .as_object()
        .ok_or_else(|| AppError::Validation("Weekly schedule must be an object".to_string()))?;

    for (day, entry) in days {
        if !DAY_NAMES.contains(&day.as_str()) {
            return Err(AppError::Validation(format!("Unknown day: {day}")));
        }
        if !entry.is_object() {
            return Err(AppError::Validation(format!("{day} must be an object")));
        }
        if let Some(active) = entry.get("active") {
            if !active.is_boolean() {
                return Err(AppError::Validation(format!("{day}.active must be a boolean")));
            }
        }
        let slots = entry.get("slots").map_or(Some(&[][..]), |s| {
            s.as_array().map(Vec::as_slice)
        });
        let Some(slots) = slots else {
            return Err(AppError::Validation(format!("{day}.slots must be a list")));
        };
        for slot in slots {
            match slot.as_str() {
                Some(s) if is_valid_slot(s) => {}
                _ => {
                    return Err(AppError::Validation(format!(
                        "Invalid time slot on {day}: {slot}"
                    )));
                }
            }
        }
    }
    Ok(())
}

/// What to resolve availability for.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub therapist_id: Option<String>,
    pub business_id: Option<String>,
    pub offer_id: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Free slots of a provider on a date.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub date: NaiveDate,
    pub day: &'static str,
    pub provider: ProviderRef,
    pub slots: Vec<String>,
    /// Times already held by live bookings.
    #[serde(skip)]
    pub taken: Vec<String>,
}

/// Availability service.
#[derive(Clone)]
pub struct AvailabilityService {
    therapist_repo: TherapistProfileRepository,
    business_repo: BusinessProfileRepository,
    offer_repo: OfferRepository,
    booking_repo: BookingRepository,
}

impl AvailabilityService {
    #[must_use]
    pub const fn new(
        therapist_repo: TherapistProfileRepository,
        business_repo: BusinessProfileRepository,
        offer_repo: OfferRepository,
        booking_repo: BookingRepository,
    ) -> Self {
        Self {
            therapist_repo,
            business_repo,
            offer_repo,
            booking_repo,
        }
    }

    /// Resolve free slots. An offer id takes precedence over a profile id.
    /// Businesses without an offer use their weekly schedule only.
    pub async fn resolve(&self, query: &AvailabilityQuery) -> AppResult<Availability> {
        let date = query
            .date
            .ok_or_else(|| AppError::BadRequest("date is required".to_string()))?;
        let day = day_name(date);

        let (provider, base) = if let Some(offer_id) = &query.offer_id {
            let offer = self.offer_repo.get_by_id(offer_id).await?;
            let provider = ProviderRef::from_columns(
                offer.therapist_id.as_deref(),
                offer.business_id.as_deref(),
            )
            .ok_or_else(|| AppError::NotFound(format!("Offer {offer_id} has no provider")))?;
            (provider, offer_base_slots(&offer, day))
        } else if let Some(therapist_id) = &query.therapist_id {
            let profile = self.therapist_repo.get_by_id(therapist_id).await?;
            let base = therapist_base_slots(&profile, day);
            (ProviderRef::Therapist(profile.id), base)
        } else if let Some(business_id) = &query.business_id {
            let profile = self.business_repo.get_by_id(business_id).await?;
            let base = schedule_slots(profile.weekly_schedule.as_ref(), day).unwrap_or_default();
            (ProviderRef::Business(profile.id), base)
        } else {
            return Err(AppError::BadRequest(
                "therapistId, businessId or offerId is required".to_string(),
            ));
        };

        let taken = self.booking_repo.taken_times(&provider, date).await?;

        Ok(Availability {
            date,
            day,
            provider,
            slots: free_slots(base, &taken),
            taken,
        })
    }
}
