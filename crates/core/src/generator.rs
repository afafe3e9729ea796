//! Bulk generation of lesson slots from a weekly recurrence.
//!
//! A submission is validated as a whole before anything is stored: an
//! inverted date range, an empty weekday set or a single malformed interval
//! line rejects the request. So does a range longer than
//! [`MAX_GENERATED_DAYS`] or an expansion larger than [`MAX_GENERATED_SLOTS`].
//! Generated slots are stored in one batch.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use tracing::info;

use crate::{
    errors::{BookingError, BookingResult},
    models::lesson_slot::{validate_capacity, validate_title, BulkSlotRequest, NewLessonSlot},
    store::SlotLedger,
};

/// Longest date range, inclusive of both ends, that one request may cover.
pub const MAX_GENERATED_DAYS: i64 = 366;
pub const MAX_GENERATED_SLOTS: usize = 2_000;

/// One `HH:MM-HH:MM` line of the interval block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeInterval {
    pub fn parse(line: &str) -> BookingResult<Self> {
        let invalid = || {
            BookingError::Validation(format!(
                "Time slot \"{}\" must use the HH:MM-HH:MM format",
                line
            ))
        };

        let (start, end) = line.split_once('-').ok_or_else(invalid)?;
        let start = NaiveTime::parse_from_str(start.trim(), "%H:%M").map_err(|_| invalid())?;
        let end = NaiveTime::parse_from_str(end.trim(), "%H:%M").map_err(|_| invalid())?;

        if start > end {
            return Err(BookingError::Validation(format!(
                "Time slot \"{}\" ends before it starts",
                line
            )));
        }

        Ok(Self { start, end })
    }
}

/// Parses every non-blank line, in order. Any malformed line fails the block.
pub fn parse_intervals(block: &str) -> BookingResult<Vec<TimeInterval>> {
    let intervals = block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(TimeInterval::parse)
        .collect::<BookingResult<Vec<_>>>()?;

    if intervals.is_empty() {
        return Err(BookingError::Validation(
            "At least one time slot must be provided".to_string(),
        ));
    }

    Ok(intervals)
}

/// Maps 0 = Monday through 6 = Sunday.
pub fn weekday_from_index(index: u8) -> BookingResult<Weekday> {
    match index {
        0 => Ok(Weekday::Mon),
        1 => Ok(Weekday::Tue),
        2 => Ok(Weekday::Wed),
        3 => Ok(Weekday::Thu),
        4 => Ok(Weekday::Fri),
        5 => Ok(Weekday::Sat),
        6 => Ok(Weekday::Sun),
        other => Err(BookingError::Validation(format!(
            "Weekday {} is out of range (0 = Monday .. 6 = Sunday)",
            other
        ))),
    }
}

/// A validated recurrence description.
#[derive(Debug, Clone)]
pub struct SlotPattern {
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub weekdays: BTreeSet<u8>,
    pub intervals: Vec<TimeInterval>,
    pub capacity: i32,
    pub reservation_opens_at: DateTime<Utc>,
}

impl SlotPattern {
    pub fn from_request(request: &BulkSlotRequest) -> BookingResult<Self> {
        if request.start_date > request.end_date {
            return Err(BookingError::Validation(
                "Start date must not be after the end date".to_string(),
            ));
        }
        let days = (request.end_date - request.start_date).num_days() + 1;
        if days > MAX_GENERATED_DAYS {
            return Err(BookingError::Validation(format!(
                "Date range covers {} days; at most {} are allowed",
                days, MAX_GENERATED_DAYS
            )));
        }
        validate_capacity(request.capacity)?;

        let mut weekdays = BTreeSet::new();
        for &index in &request.weekdays {
            weekday_from_index(index)?;
            weekdays.insert(index);
        }
        if weekdays.is_empty() {
            return Err(BookingError::Validation(
                "At least one weekday must be selected".to_string(),
            ));
        }

        Ok(Self {
            title: validate_title(request.title.as_deref())?,
            start_date: request.start_date,
            end_date: request.end_date,
            weekdays,
            intervals: parse_intervals(&request.time_slots)?,
            capacity: request.capacity,
            reservation_opens_at: request.reservation_opens_at,
        })
    }

    /// Expands the pattern into concrete slots, date by date and interval by
    /// interval, with wall-clock times interpreted in `tz`.
    pub fn expand(&self, tz: Tz) -> BookingResult<Vec<NewLessonSlot>> {
        let mut slots = Vec::new();

        for date in self
            .start_date
            .iter_days()
            .take_while(|date| *date <= self.end_date)
        {
            let weekday = date.weekday().num_days_from_monday() as u8;
            if !self.weekdays.contains(&weekday) {
                continue;
            }

            for interval in &self.intervals {
                slots.push(NewLessonSlot {
                    title: self.title.clone(),
                    start_time: local_instant(tz, date, interval.start)?,
                    end_time: local_instant(tz, date, interval.end)?,
                    capacity: self.capacity,
                    reservation_opens_at: self.reservation_opens_at,
                });
            }
        }

        Ok(slots)
    }
}

/// Ambiguous local times resolve to the earlier instant; skipped ones are invalid.
fn local_instant(tz: Tz, date: NaiveDate, time: NaiveTime) -> BookingResult<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| {
            BookingError::Validation(format!(
                "{} {} does not exist in timezone {}",
                date,
                time.format("%H:%M"),
                tz.name()
            ))
        })
}

/// Validates the request, expands it and stores every generated slot.
pub async fn generate_slots<L>(
    ledger: &L,
    request: &BulkSlotRequest,
    tz: Tz,
) -> BookingResult<u64>
where
    L: SlotLedger + ?Sized,
{
    let pattern = SlotPattern::from_request(request)?;
    let slots = pattern.expand(tz)?;

    if slots.len() > MAX_GENERATED_SLOTS {
        return Err(BookingError::Validation(format!(
            "Request would create {} lesson slots; at most {} are allowed",
            slots.len(),
            MAX_GENERATED_SLOTS
        )));
    }
    if slots.is_empty() {
        info!(
            "Bulk generation matched no dates between {} and {}",
            pattern.start_date, pattern.end_date
        );
        return Ok(0);
    }

    let created = ledger.insert_slots(slots).await?;
    info!(
        "Generated {} lesson slots between {} and {}",
        created, pattern.start_date, pattern.end_date
    );
    Ok(created)
}
