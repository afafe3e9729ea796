//! PostgreSQL implementation of the booking store traits.
//!
//! An admission transaction starts with `SELECT ... FOR UPDATE` on the slot
//! row, so concurrent admissions for the same slot wait for each other while
//! admissions for other slots run in parallel.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::WrapErr;
use lessonbook_core::{
    errors::BookingResult,
    models::{
        lesson_slot::{LessonSlot, NewLessonSlot},
        reservation::{Reservation, ReservationOwner, WaitlistEntry},
        student::Student,
    },
    store::{AdmissionStore, AdmissionTx, SlotLedger},
};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::repositories::{lesson_slot, reservation, student, waitlist};

#[derive(Debug, Clone)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub struct PgAdmissionTx {
    tx: Transaction<'static, Postgres>,
    slot: LessonSlot,
}

#[async_trait]
impl AdmissionStore for PgBookingStore {
    type Tx = PgAdmissionTx;

    async fn begin_slot(&self, slot_id: Uuid) -> BookingResult<Option<PgAdmissionTx>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .wrap_err("Failed to begin admission transaction")?;

        let slot = lesson_slot::lock_lesson_slot(&mut *tx, slot_id).await?;
        debug!("Locked lesson slot {} (found={})", slot_id, slot.is_some());

        Ok(slot.map(|slot| PgAdmissionTx {
            tx,
            slot: slot.into(),
        }))
    }
}

#[async_trait]
impl AdmissionTx for PgAdmissionTx {
    fn slot(&self) -> &LessonSlot {
        &self.slot
    }

    async fn find_student(&mut self, student_id: Uuid) -> BookingResult<Option<Student>> {
        let student = student::get_student_by_id(&mut *self.tx, student_id).await?;
        Ok(student.map(Into::into))
    }

    async fn reservation_count(&mut self) -> BookingResult<i64> {
        Ok(reservation::count_reservations(&mut *self.tx, self.slot.id).await?)
    }

    async fn insert_reservation(
        &mut self,
        student_id: Uuid,
        reserved_at: DateTime<Utc>,
    ) -> BookingResult<Option<Reservation>> {
        let row =
            reservation::insert_reservation(&mut *self.tx, self.slot.id, student_id, reserved_at)
                .await?;
        Ok(row.map(Into::into))
    }

    async fn insert_waitlist_entry(
        &mut self,
        student_id: Uuid,
        waitlisted_at: DateTime<Utc>,
    ) -> BookingResult<Option<WaitlistEntry>> {
        let row =
            waitlist::insert_waitlist_entry(&mut *self.tx, self.slot.id, student_id, waitlisted_at)
                .await?;
        Ok(row.map(Into::into))
    }

    async fn commit(self) -> BookingResult<()> {
        self.tx
            .commit()
            .await
            .wrap_err("Failed to commit admission transaction")?;
        Ok(())
    }
}

#[async_trait]
impl SlotLedger for PgBookingStore {
    async fn find_slot(&self, slot_id: Uuid) -> BookingResult<Option<LessonSlot>> {
        let slot = lesson_slot::get_lesson_slot_by_id(&self.pool, slot_id).await?;
        Ok(slot.map(Into::into))
    }

    async fn reservation_count(&self, slot_id: Uuid) -> BookingResult<i64> {
        Ok(reservation::count_reservations(&self.pool, slot_id).await?)
    }

    async fn find_reservation(
        &self,
        reservation_id: Uuid,
    ) -> BookingResult<Option<ReservationOwner>> {
        let owner = reservation::get_reservation_owner(&self.pool, reservation_id).await?;
        Ok(owner.map(Into::into))
    }

    async fn delete_reservation(&self, reservation_id: Uuid) -> BookingResult<bool> {
        Ok(reservation::delete_reservation(&self.pool, reservation_id).await?)
    }

    async fn insert_slots(&self, slots: Vec<NewLessonSlot>) -> BookingResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .wrap_err("Failed to begin slot generation transaction")?;

        let mut created = 0;
        for slot in &slots {
            lesson_slot::create_lesson_slot(&mut *tx, slot).await?;
            created += 1;
        }

        tx.commit()
            .await
            .wrap_err("Failed to commit generated lesson slots")?;
        Ok(created)
    }
}

/// These tests need a live PostgreSQL server; run them with
/// `cargo test -p lessonbook-db -- --ignored` and `TEST_DATABASE_URL` set.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        create_test_pool,
        repositories::{account, family},
    };
    use chrono::Duration;
    use lessonbook_core::admission::{request_admission, AdmissionOutcome, Caller, Rejection};
    use std::sync::Arc;

    async fn seed_family(pool: &PgPool) -> Uuid {
        let username = format!("guardian-{}", Uuid::new_v4());
        let account = account::create_account(pool, &username, "hash", false)
            .await
            .unwrap()
            .unwrap();
        family::create_family(pool, account.id, "").await.unwrap().id
    }

    async fn seed_slot(pool: &PgPool, capacity: i32, now: DateTime<Utc>) -> Uuid {
        let slot = NewLessonSlot {
            title: "Calligraphy Class".to_string(),
            start_time: now + Duration::days(3),
            end_time: now + Duration::days(3) + Duration::hours(1),
            capacity,
            reservation_opens_at: now - Duration::hours(1),
        };
        lesson_slot::create_lesson_slot(pool, &slot).await.unwrap().id
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL database at TEST_DATABASE_URL"]
    async fn concurrent_admissions_never_exceed_capacity() {
        let pool = create_test_pool().await;
        let now = Utc::now();
        let slot_id = seed_slot(&pool, 3, now).await;
        let family_id = seed_family(&pool).await;

        let mut students = Vec::new();
        for i in 0..10 {
            let row = student::create_student(&pool, family_id, &format!("Student {}", i))
                .await
                .unwrap();
            students.push(row.id);
        }

        let store = Arc::new(PgBookingStore::new(pool.clone()));
        let caller = Caller::Guardian { family_id };
        let handles: Vec<_> = students
            .into_iter()
            .map(|student_id| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    request_admission(store.as_ref(), slot_id, student_id, &caller, now).await
                })
            })
            .collect();

        let mut confirmed = 0;
        let mut waitlisted = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                AdmissionOutcome::Confirmed { .. } => confirmed += 1,
                AdmissionOutcome::Waitlisted { .. } => waitlisted += 1,
                AdmissionOutcome::Rejected { reason } => panic!("unexpected rejection {:?}", reason),
            }
        }

        assert_eq!(confirmed, 3);
        assert_eq!(waitlisted, 7);
        assert_eq!(reservation::count_reservations(&pool, slot_id).await.unwrap(), 3);
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL database at TEST_DATABASE_URL"]
    async fn duplicate_reservation_is_rejected_by_constraint() {
        let pool = create_test_pool().await;
        let now = Utc::now();
        let slot_id = seed_slot(&pool, 5, now).await;
        let family_id = seed_family(&pool).await;
        let student_id = student::create_student(&pool, family_id, "Hanako")
            .await
            .unwrap()
            .id;

        let store = PgBookingStore::new(pool.clone());
        let caller = Caller::Guardian { family_id };

        let first = request_admission(&store, slot_id, student_id, &caller, now)
            .await
            .unwrap();
        assert!(matches!(first, AdmissionOutcome::Confirmed { .. }));

        let second = request_admission(&store, slot_id, student_id, &caller, now)
            .await
            .unwrap();
        assert_eq!(
            second,
            AdmissionOutcome::Rejected {
                reason: Rejection::AlreadyReserved
            }
        );
        assert_eq!(reservation::count_reservations(&pool, slot_id).await.unwrap(), 1);
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL database at TEST_DATABASE_URL"]
    async fn deleting_a_slot_cascades_to_bookings() {
        let pool = create_test_pool().await;
        let now = Utc::now();
        let slot_id = seed_slot(&pool, 1, now).await;
        let family_id = seed_family(&pool).await;
        let first = student::create_student(&pool, family_id, "A").await.unwrap().id;
        let second = student::create_student(&pool, family_id, "B").await.unwrap().id;

        let store = PgBookingStore::new(pool.clone());
        let caller = Caller::Guardian { family_id };
        request_admission(&store, slot_id, first, &caller, now).await.unwrap();
        request_admission(&store, slot_id, second, &caller, now).await.unwrap();

        assert!(lesson_slot::delete_lesson_slot(&pool, slot_id).await.unwrap());
        assert_eq!(reservation::count_reservations(&pool, slot_id).await.unwrap(), 0);
        assert!(waitlist::list_waitlist_for_slot(&pool, slot_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL database at TEST_DATABASE_URL"]
    async fn taken_username_creates_no_account() {
        let pool = create_test_pool().await;
        let username = format!("guardian-{}", Uuid::new_v4());

        let first = account::create_account(&pool, &username, "hash", false)
            .await
            .unwrap();
        let second = account::create_account(&pool, &username, "other", true)
            .await
            .unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        let stored = account::get_account_by_username(&pool, &username)
            .await
            .unwrap()
            .unwrap();
        assert!(!stored.is_admin);
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL database at TEST_DATABASE_URL"]
    async fn expired_sessions_are_purged() {
        let pool = create_test_pool().await;
        let now = Utc::now();
        let username = format!("guardian-{}", Uuid::new_v4());
        let account_id = account::create_account(&pool, &username, "hash", false)
            .await
            .unwrap()
            .unwrap()
            .id;

        let stale = format!("stale-{}", Uuid::new_v4());
        let live = format!("live-{}", Uuid::new_v4());
        account::create_session(&pool, account_id, &stale, now - Duration::hours(1))
            .await
            .unwrap();
        account::create_session(&pool, account_id, &live, now + Duration::hours(1))
            .await
            .unwrap();

        assert!(account::delete_expired_sessions(&pool, now).await.unwrap() >= 1);
        let remaining: Vec<(String,)> =
            sqlx::query_as("SELECT token FROM sessions WHERE account_id = $1")
                .bind(account_id)
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(remaining, vec![(live,)]);
    }
}
