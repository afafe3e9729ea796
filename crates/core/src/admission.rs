//! Admission of students into capacity-limited lesson slots.
//!
//! Guardians and administrators have different transition sets:
//!
//! | Caller        | before opening | capacity left | slot full           |
//! |---------------|----------------|---------------|---------------------|
//! | guardian      | `TooEarly`     | reservation   | waitlist entry      |
//! | administrator | (no gate)      | reservation   | `Full`              |
//!
//! Every admission runs inside one [`AdmissionTx`], which holds the slot lock
//! from the reservation count through the insert. Concurrent requests for one
//! slot therefore serialize and can never push it past its capacity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    availability::available_slots,
    errors::{BookingError, BookingResult},
    models::{
        lesson_slot::LessonSlot,
        reservation::{Reservation, WaitlistEntry},
        student::Student,
    },
    store::{AdmissionStore, AdmissionTx, SlotLedger},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Caller {
    Guardian { family_id: Uuid },
    Administrator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    TooEarly,
    AlreadyReserved,
    AlreadyWaitlisted,
    Full,
    NotOwner,
}

impl Rejection {
    pub fn message(&self) -> &'static str {
        match self {
            Rejection::TooEarly => "Reservations for this lesson are not open yet",
            Rejection::AlreadyReserved => "This student already has a reservation for this lesson",
            Rejection::AlreadyWaitlisted => "This student is already on the waitlist for this lesson",
            Rejection::Full => "This lesson is full",
            Rejection::NotOwner => "This student or reservation belongs to another family",
        }
    }
}

/// Where an admission request is allowed to place the student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Reservation,
    Waitlist,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdmissionOutcome {
    Confirmed { reservation: Reservation },
    Waitlisted { entry: WaitlistEntry },
    Rejected { reason: Rejection },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CancellationOutcome {
    Cancelled { reservation: Reservation },
    Rejected { reason: Rejection },
}

impl Caller {
    pub fn is_administrator(&self) -> bool {
        matches!(self, Caller::Administrator)
    }

    /// Administrators act for every family; guardians only for their own.
    pub fn acts_for(&self, family_id: Uuid) -> bool {
        match self {
            Caller::Guardian { family_id: own } => *own == family_id,
            Caller::Administrator => true,
        }
    }

    pub fn can_admit(&self, student: &Student) -> bool {
        self.acts_for(student.family_id)
    }

    pub fn placement(
        &self,
        slot: &LessonSlot,
        reservation_count: i64,
        now: DateTime<Utc>,
    ) -> Result<Placement, Rejection> {
        match self {
            Caller::Guardian { .. } => guardian_placement(slot, reservation_count, now),
            Caller::Administrator => administrator_placement(slot, reservation_count),
        }
    }
}

fn guardian_placement(
    slot: &LessonSlot,
    reservation_count: i64,
    now: DateTime<Utc>,
) -> Result<Placement, Rejection> {
    if now < slot.reservation_opens_at {
        return Err(Rejection::TooEarly);
    }
    if available_slots(slot, reservation_count) > 0 {
        Ok(Placement::Reservation)
    } else {
        Ok(Placement::Waitlist)
    }
}

fn administrator_placement(slot: &LessonSlot, reservation_count: i64) -> Result<Placement, Rejection> {
    if available_slots(slot, reservation_count) > 0 {
        Ok(Placement::Reservation)
    } else {
        Err(Rejection::Full)
    }
}

/// Places `student_id` into the slot's reservations or waitlist, or rejects.
///
/// A missing slot or student is an error rather than a rejection. Rejections
/// leave the store untouched; success paths insert exactly one row.
pub async fn request_admission<S>(
    store: &S,
    slot_id: Uuid,
    student_id: Uuid,
    caller: &Caller,
    now: DateTime<Utc>,
) -> BookingResult<AdmissionOutcome>
where
    S: AdmissionStore + ?Sized,
{
    let mut tx = store
        .begin_slot(slot_id)
        .await?
        .ok_or_else(|| BookingError::not_found("Lesson slot", slot_id))?;

    let student = tx
        .find_student(student_id)
        .await?
        .ok_or_else(|| BookingError::not_found("Student", student_id))?;

    if !caller.can_admit(&student) {
        return Ok(rejected(slot_id, student_id, Rejection::NotOwner));
    }

    let reservation_count = tx.reservation_count().await?;
    debug!(
        "Admission check: slot={}, capacity={}, reserved={}",
        slot_id,
        tx.slot().capacity,
        reservation_count
    );

    let outcome = match caller.placement(tx.slot(), reservation_count, now) {
        Err(reason) => return Ok(rejected(slot_id, student_id, reason)),
        Ok(Placement::Reservation) => match tx.insert_reservation(student_id, now).await? {
            Some(reservation) => AdmissionOutcome::Confirmed { reservation },
            None => return Ok(rejected(slot_id, student_id, Rejection::AlreadyReserved)),
        },
        Ok(Placement::Waitlist) => match tx.insert_waitlist_entry(student_id, now).await? {
            Some(entry) => AdmissionOutcome::Waitlisted { entry },
            None => return Ok(rejected(slot_id, student_id, Rejection::AlreadyWaitlisted)),
        },
    };

    tx.commit().await?;

    match &outcome {
        AdmissionOutcome::Confirmed { reservation } => info!(
            "Reservation confirmed: slot={}, student={}, reservation={}",
            slot_id, student_id, reservation.id
        ),
        AdmissionOutcome::Waitlisted { entry } => info!(
            "Student waitlisted: slot={}, student={}, entry={}",
            slot_id, student_id, entry.id
        ),
        AdmissionOutcome::Rejected { .. } => {}
    }

    Ok(outcome)
}

fn rejected(slot_id: Uuid, student_id: Uuid, reason: Rejection) -> AdmissionOutcome {
    info!(
        "Admission rejected: slot={}, student={}, reason={:?}",
        slot_id, student_id, reason
    );
    AdmissionOutcome::Rejected { reason }
}

/// Deletes a reservation on behalf of its family or an administrator.
///
/// The waitlist is left as it is; nobody is promoted into the freed place.
pub async fn cancel_reservation<L>(
    ledger: &L,
    reservation_id: Uuid,
    caller: &Caller,
) -> BookingResult<CancellationOutcome>
where
    L: SlotLedger + ?Sized,
{
    let owner = ledger
        .find_reservation(reservation_id)
        .await?
        .ok_or_else(|| BookingError::not_found("Reservation", reservation_id))?;

    if !caller.acts_for(owner.family_id) {
        info!(
            "Cancellation rejected: reservation={}, reason=NotOwner",
            reservation_id
        );
        return Ok(CancellationOutcome::Rejected {
            reason: Rejection::NotOwner,
        });
    }

    if !ledger.delete_reservation(reservation_id).await? {
        return Err(BookingError::not_found("Reservation", reservation_id));
    }

    info!(
        "Reservation cancelled: reservation={}, slot={}, student={}",
        reservation_id, owner.reservation.lesson_slot_id, owner.reservation.student_id
    );

    Ok(CancellationOutcome::Cancelled {
        reservation: owner.reservation,
    })
}
