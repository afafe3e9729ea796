//! In-memory booking store.
//!
//! Mirrors the PostgreSQL store's guarantees: one async lock per slot is
//! held for the whole admission transaction, the (slot, student) pairs are
//! unique, and rows staged by a transaction only become visible on commit.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lessonbook_core::{
    errors::BookingResult,
    models::{
        lesson_slot::{LessonSlot, NewLessonSlot},
        reservation::{Reservation, ReservationOwner, WaitlistEntry},
        student::Student,
    },
    store::{AdmissionStore, AdmissionTx, SlotLedger},
};
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    students: HashMap<Uuid, Student>,
    slots: HashMap<Uuid, LessonSlot>,
    reservations: Vec<Reservation>,
    waitlist: Vec<WaitlistEntry>,
}

impl Tables {
    fn is_reserved(&self, slot_id: Uuid, student_id: Uuid) -> bool {
        self.reservations
            .iter()
            .any(|r| r.lesson_slot_id == slot_id && r.student_id == student_id)
    }

    fn is_waitlisted(&self, slot_id: Uuid, student_id: Uuid) -> bool {
        self.waitlist
            .iter()
            .any(|w| w.lesson_slot_id == slot_id && w.student_id == student_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    slot_locks: Arc<Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn locks(&self) -> MutexGuard<'_, HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>> {
        self.slot_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The slot's admission lock, or `None` if the slot does not exist.
    fn slot_lock(&self, slot_id: Uuid) -> Option<Arc<tokio::sync::Mutex<()>>> {
        if !self.tables().slots.contains_key(&slot_id) {
            return None;
        }
        Some(Arc::clone(self.locks().entry(slot_id).or_default()))
    }

    /// Number of slots that currently have an admission lock allocated.
    pub fn tracked_locks(&self) -> usize {
        self.locks().len()
    }

    pub fn add_student(&self, family_id: Uuid, name: &str) -> Student {
        let student = Student {
            id: Uuid::new_v4(),
            family_id,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.tables()
            .students
            .insert(student.id, student.clone());
        student
    }

    pub fn add_slot(&self, slot: NewLessonSlot) -> LessonSlot {
        let slot = LessonSlot {
            id: Uuid::new_v4(),
            title: slot.title,
            start_time: slot.start_time,
            end_time: slot.end_time,
            capacity: slot.capacity,
            reservation_opens_at: slot.reservation_opens_at,
            created_at: Utc::now(),
        };
        self.tables().slots.insert(slot.id, slot.clone());
        slot
    }

    pub fn slots(&self) -> Vec<LessonSlot> {
        let mut slots: Vec<_> = self.tables().slots.values().cloned().collect();
        slots.sort_by_key(|slot| slot.start_time);
        slots
    }

    pub fn reservations_for(&self, slot_id: Uuid) -> Vec<Reservation> {
        self.tables()
            .reservations
            .iter()
            .filter(|r| r.lesson_slot_id == slot_id)
            .cloned()
            .collect()
    }

    /// Waitlist entries for the slot, first in line first.
    pub fn waitlist_for(&self, slot_id: Uuid) -> Vec<WaitlistEntry> {
        let mut entries: Vec<_> = self
            .tables()
            .waitlist
            .iter()
            .filter(|w| w.lesson_slot_id == slot_id)
            .cloned()
            .collect();
        entries.sort_by_key(|w| w.waitlisted_at);
        entries
    }

    /// Removes the student with its reservations and waitlist entries.
    pub fn delete_student(&self, student_id: Uuid) -> bool {
        let mut tables = self.tables();
        tables.reservations.retain(|r| r.student_id != student_id);
        tables.waitlist.retain(|w| w.student_id != student_id);
        tables.students.remove(&student_id).is_some()
    }

    /// Removes the slot with its reservations and waitlist entries.
    pub fn delete_slot(&self, slot_id: Uuid) -> bool {
        let removed = {
            let mut tables = self.tables();
            tables.reservations.retain(|r| r.lesson_slot_id != slot_id);
            tables.waitlist.retain(|w| w.lesson_slot_id != slot_id);
            tables.slots.remove(&slot_id).is_some()
        };
        self.locks().remove(&slot_id);
        removed
    }
}

enum Staged {
    Reservation(Reservation),
    Waitlist(WaitlistEntry),
}

pub struct MemoryAdmissionTx {
    tables: Arc<Mutex<Tables>>,
    slot: LessonSlot,
    staged: Vec<Staged>,
    _lock: OwnedMutexGuard<()>,
}

impl MemoryAdmissionTx {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn staged_reservation(&self, student_id: Uuid) -> bool {
        self.staged
            .iter()
            .any(|s| matches!(s, Staged::Reservation(r) if r.student_id == student_id))
    }

    fn staged_waitlist(&self, student_id: Uuid) -> bool {
        self.staged
            .iter()
            .any(|s| matches!(s, Staged::Waitlist(w) if w.student_id == student_id))
    }
}

#[async_trait]
impl AdmissionStore for MemoryStore {
    type Tx = MemoryAdmissionTx;

    async fn begin_slot(&self, slot_id: Uuid) -> BookingResult<Option<MemoryAdmissionTx>> {
        let Some(lock) = self.slot_lock(slot_id) else {
            return Ok(None);
        };
        let lock = lock.lock_owned().await;

        // The slot may have been deleted while we waited.
        let slot = self.tables().slots.get(&slot_id).cloned();
        Ok(slot.map(|slot| MemoryAdmissionTx {
            tables: Arc::clone(&self.tables),
            slot,
            staged: Vec::new(),
            _lock: lock,
        }))
    }
}

#[async_trait]
impl AdmissionTx for MemoryAdmissionTx {
    fn slot(&self) -> &LessonSlot {
        &self.slot
    }

    async fn find_student(&mut self, student_id: Uuid) -> BookingResult<Option<Student>> {
        Ok(self.tables().students.get(&student_id).cloned())
    }

    async fn reservation_count(&mut self) -> BookingResult<i64> {
        let slot_id = self.slot.id;
        let stored = self
            .tables()
            .reservations
            .iter()
            .filter(|r| r.lesson_slot_id == slot_id)
            .count();
        let staged = self
            .staged
            .iter()
            .filter(|s| matches!(s, Staged::Reservation(_)))
            .count();
        Ok((stored + staged) as i64)
    }

    async fn insert_reservation(
        &mut self,
        student_id: Uuid,
        reserved_at: DateTime<Utc>,
    ) -> BookingResult<Option<Reservation>> {
        let exists = self.tables().is_reserved(self.slot.id, student_id);
        if exists || self.staged_reservation(student_id) {
            return Ok(None);
        }

        let reservation = Reservation {
            id: Uuid::new_v4(),
            lesson_slot_id: self.slot.id,
            student_id,
            reserved_at,
        };
        self.staged.push(Staged::Reservation(reservation.clone()));
        Ok(Some(reservation))
    }

    async fn insert_waitlist_entry(
        &mut self,
        student_id: Uuid,
        waitlisted_at: DateTime<Utc>,
    ) -> BookingResult<Option<WaitlistEntry>> {
        let exists = self.tables().is_waitlisted(self.slot.id, student_id);
        if exists || self.staged_waitlist(student_id) {
            return Ok(None);
        }

        let entry = WaitlistEntry {
            id: Uuid::new_v4(),
            lesson_slot_id: self.slot.id,
            student_id,
            waitlisted_at,
        };
        self.staged.push(Staged::Waitlist(entry.clone()));
        Ok(Some(entry))
    }

    async fn commit(self) -> BookingResult<()> {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        for staged in self.staged {
            match staged {
                Staged::Reservation(r) => tables.reservations.push(r),
                Staged::Waitlist(w) => tables.waitlist.push(w),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SlotLedger for MemoryStore {
    async fn find_slot(&self, slot_id: Uuid) -> BookingResult<Option<LessonSlot>> {
        Ok(self.tables().slots.get(&slot_id).cloned())
    }

    async fn reservation_count(&self, slot_id: Uuid) -> BookingResult<i64> {
        let count = self
            .tables()
            .reservations
            .iter()
            .filter(|r| r.lesson_slot_id == slot_id)
            .count();
        Ok(count as i64)
    }

    async fn find_reservation(
        &self,
        reservation_id: Uuid,
    ) -> BookingResult<Option<ReservationOwner>> {
        let tables = self.tables();
        let owner = tables
            .reservations
            .iter()
            .find(|r| r.id == reservation_id)
            .and_then(|r| {
                tables.students.get(&r.student_id).map(|s| ReservationOwner {
                    reservation: r.clone(),
                    family_id: s.family_id,
                })
            });
        Ok(owner)
    }

    async fn delete_reservation(&self, reservation_id: Uuid) -> BookingResult<bool> {
        let mut tables = self.tables();
        let before = tables.reservations.len();
        tables.reservations.retain(|r| r.id != reservation_id);
        Ok(tables.reservations.len() < before)
    }

    async fn insert_slots(&self, slots: Vec<NewLessonSlot>) -> BookingResult<u64> {
        let created = slots.len() as u64;
        for slot in slots {
            self.add_slot(slot);
        }
        Ok(created)
    }
}
