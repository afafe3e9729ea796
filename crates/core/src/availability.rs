//! Remaining capacity of a lesson slot.
//!
//! Both calculations take the reservation count as an argument so callers
//! always pass a count read from the store for the decision at hand. The
//! store-backed variants read that count fresh on every call.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    errors::{BookingError, BookingResult},
    models::lesson_slot::{LessonSlot, LessonSlotSummary},
    store::SlotLedger,
};

/// `capacity - reservation_count`, without clamping.
pub fn available_slots(slot: &LessonSlot, reservation_count: i64) -> i64 {
    i64::from(slot.capacity) - reservation_count
}

pub fn is_reservable(slot: &LessonSlot, reservation_count: i64, now: DateTime<Utc>) -> bool {
    now >= slot.reservation_opens_at && available_slots(slot, reservation_count) > 0
}

/// Attaches the derived capacity figures to a slot read with its count.
pub fn summarize(slot: LessonSlot, reserved_count: i64, now: DateTime<Utc>) -> LessonSlotSummary {
    LessonSlotSummary {
        available_slots: available_slots(&slot, reserved_count),
        is_reservable: is_reservable(&slot, reserved_count, now),
        reserved_count,
        slot,
    }
}

pub async fn available_slots_for<L>(ledger: &L, slot_id: Uuid) -> BookingResult<i64>
where
    L: SlotLedger + ?Sized,
{
    let slot = ledger
        .find_slot(slot_id)
        .await?
        .ok_or_else(|| BookingError::not_found("Lesson slot", slot_id))?;
    let count = ledger.reservation_count(slot_id).await?;
    Ok(available_slots(&slot, count))
}

pub async fn is_reservable_for<L>(
    ledger: &L,
    slot_id: Uuid,
    now: DateTime<Utc>,
) -> BookingResult<bool>
where
    L: SlotLedger + ?Sized,
{
    let slot = ledger
        .find_slot(slot_id)
        .await?
        .ok_or_else(|| BookingError::not_found("Lesson slot", slot_id))?;
    let count = ledger.reservation_count(slot_id).await?;
    Ok(is_reservable(&slot, count, now))
}
