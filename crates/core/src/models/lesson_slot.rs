use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{BookingError, BookingResult};

/// Title given to slots created without one.
pub const DEFAULT_SLOT_TITLE: &str = "Calligraphy Class";

pub const MAX_SLOT_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonSlot {
    pub id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub capacity: i32,
    pub reservation_opens_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl LessonSlot {
    pub fn display_title(&self) -> &str {
        resolve_title(&self.title)
    }
}

/// A slot that has passed validation but has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLessonSlot {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub capacity: i32,
    pub reservation_opens_at: DateTime<Utc>,
}

/// Body of the single-slot create and edit endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonSlotRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub capacity: i32,
    pub reservation_opens_at: DateTime<Utc>,
}

impl LessonSlotRequest {
    pub fn validate(&self) -> BookingResult<NewLessonSlot> {
        let title = validate_title(self.title.as_deref())?;
        validate_capacity(self.capacity)?;
        if self.start_time > self.end_time {
            return Err(BookingError::Validation(
                "Lesson start time must not be after its end time".to_string(),
            ));
        }

        Ok(NewLessonSlot {
            title,
            start_time: self.start_time,
            end_time: self.end_time,
            capacity: self.capacity,
            reservation_opens_at: self.reservation_opens_at,
        })
    }
}

/// Body of the bulk generation endpoint.
///
/// `weekdays` uses 0 = Monday through 6 = Sunday. `time_slots` holds one
/// `HH:MM-HH:MM` interval per line, in the business timezone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkSlotRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub weekdays: Vec<u8>,
    pub time_slots: String,
    pub capacity: i32,
    pub reservation_opens_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkSlotResponse {
    pub created: u64,
}

/// A slot together with its live reservation count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonSlotSummary {
    #[serde(flatten)]
    pub slot: LessonSlot,
    pub reserved_count: i64,
    pub available_slots: i64,
    pub is_reservable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub slot_id: Uuid,
    pub available_slots: i64,
    pub is_reservable: bool,
}

impl From<&LessonSlotSummary> for AvailabilityResponse {
    fn from(summary: &LessonSlotSummary) -> Self {
        Self {
            slot_id: summary.slot.id,
            available_slots: summary.available_slots,
            is_reservable: summary.is_reservable,
        }
    }
}

pub(crate) fn resolve_title(title: &str) -> &str {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        DEFAULT_SLOT_TITLE
    } else {
        trimmed
    }
}

pub(crate) fn validate_title(title: Option<&str>) -> BookingResult<String> {
    let title = resolve_title(title.unwrap_or_default());
    if title.chars().count() > MAX_SLOT_TITLE_LEN {
        return Err(BookingError::Validation(format!(
            "Lesson title must be at most {} characters",
            MAX_SLOT_TITLE_LEN
        )));
    }
    Ok(title.to_string())
}

pub(crate) fn validate_capacity(capacity: i32) -> BookingResult<()> {
    if capacity < 1 {
        return Err(BookingError::Validation(
            "Capacity must be at least 1".to_string(),
        ));
    }
    Ok(())
}
