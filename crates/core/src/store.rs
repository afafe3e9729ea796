//! Storage seams used by the admission engine and the slot generator.
//!
//! [`AdmissionStore`] hands out a slot-scoped unit of work: while an
//! [`AdmissionTx`] is alive no other admission for the same slot can run, so
//! the reservation count it reads stays valid until it commits. Dropping a
//! transaction without committing discards everything it staged.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::{
    errors::BookingResult,
    models::{
        lesson_slot::{LessonSlot, NewLessonSlot},
        reservation::{Reservation, ReservationOwner, WaitlistEntry},
        student::Student,
    },
};

#[async_trait]
pub trait AdmissionStore: Send + Sync {
    type Tx: AdmissionTx;

    /// Locks the slot for the lifetime of the returned transaction.
    ///
    /// Returns `None` when the slot does not exist.
    async fn begin_slot(&self, slot_id: Uuid) -> BookingResult<Option<Self::Tx>>;
}

#[async_trait]
pub trait AdmissionTx: Send {
    /// The locked slot as read at the start of the transaction.
    fn slot(&self) -> &LessonSlot;

    async fn find_student(&mut self, student_id: Uuid) -> BookingResult<Option<Student>>;

    async fn reservation_count(&mut self) -> BookingResult<i64>;

    /// Returns `None` if the student already holds a reservation for the slot.
    async fn insert_reservation(
        &mut self,
        student_id: Uuid,
        reserved_at: DateTime<Utc>,
    ) -> BookingResult<Option<Reservation>>;

    /// Returns `None` if the student is already waitlisted for the slot.
    async fn insert_waitlist_entry(
        &mut self,
        student_id: Uuid,
        waitlisted_at: DateTime<Utc>,
    ) -> BookingResult<Option<WaitlistEntry>>;

    async fn commit(self) -> BookingResult<()>;
}

/// Slot and reservation operations that need no slot lock.
#[automock]
#[async_trait]
pub trait SlotLedger: Send + Sync {
    async fn find_slot(&self, slot_id: Uuid) -> BookingResult<Option<LessonSlot>>;

    async fn reservation_count(&self, slot_id: Uuid) -> BookingResult<i64>;

    async fn find_reservation(
        &self,
        reservation_id: Uuid,
    ) -> BookingResult<Option<ReservationOwner>>;

    /// Returns whether a row was deleted.
    async fn delete_reservation(&self, reservation_id: Uuid) -> BookingResult<bool>;

    /// Stores all slots or none of them, returning the number stored.
    async fn insert_slots(&self, slots: Vec<NewLessonSlot>) -> BookingResult<u64>;
}
