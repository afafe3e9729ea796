use chrono::{DateTime, Utc};
use lessonbook_core::models::{
    account::Account,
    family::Family,
    lesson_slot::LessonSlot,
    reservation::{BookingDetail, Reservation, ReservationOwner, WaitlistEntry},
    student::Student,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAccount {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSession {
    pub token: String,
    pub account_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbFamily {
    pub id: Uuid,
    pub account_id: Uuid,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbFamilyListing {
    pub id: Uuid,
    pub username: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbStudent {
    pub id: Uuid,
    pub family_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbLessonSlot {
    pub id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub capacity: i32,
    pub reservation_opens_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbLessonSlotWithCount {
    #[sqlx(flatten)]
    pub slot: DbLessonSlot,
    pub reserved_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbReservation {
    pub id: Uuid,
    pub lesson_slot_id: Uuid,
    pub student_id: Uuid,
    pub reserved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbReservationOwner {
    #[sqlx(flatten)]
    pub reservation: DbReservation,
    pub family_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbWaitlistEntry {
    pub id: Uuid,
    pub lesson_slot_id: Uuid,
    pub student_id: Uuid,
    pub waitlisted_at: DateTime<Utc>,
}

/// Shared listing row for reservations and waitlist entries.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBookingDetail {
    pub id: Uuid,
    pub lesson_slot_id: Uuid,
    pub lesson_title: String,
    pub lesson_start_time: DateTime<Utc>,
    pub student_id: Uuid,
    pub student_name: String,
    pub family_id: Uuid,
    pub registered_at: DateTime<Utc>,
}

impl From<DbAccount> for Account {
    fn from(row: DbAccount) -> Self {
        Account {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            is_admin: row.is_admin,
            created_at: row.created_at,
        }
    }
}

impl From<DbFamily> for Family {
    fn from(row: DbFamily) -> Self {
        Family {
            id: row.id,
            account_id: row.account_id,
            phone_number: row.phone_number,
            created_at: row.created_at,
        }
    }
}

impl From<DbStudent> for Student {
    fn from(row: DbStudent) -> Self {
        Student {
            id: row.id,
            family_id: row.family_id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

impl From<DbLessonSlot> for LessonSlot {
    fn from(row: DbLessonSlot) -> Self {
        LessonSlot {
            id: row.id,
            title: row.title,
            start_time: row.start_time,
            end_time: row.end_time,
            capacity: row.capacity,
            reservation_opens_at: row.reservation_opens_at,
            created_at: row.created_at,
        }
    }
}

impl From<DbReservation> for Reservation {
    fn from(row: DbReservation) -> Self {
        Reservation {
            id: row.id,
            lesson_slot_id: row.lesson_slot_id,
            student_id: row.student_id,
            reserved_at: row.reserved_at,
        }
    }
}

impl From<DbReservationOwner> for ReservationOwner {
    fn from(row: DbReservationOwner) -> Self {
        ReservationOwner {
            reservation: row.reservation.into(),
            family_id: row.family_id,
        }
    }
}

impl From<DbWaitlistEntry> for WaitlistEntry {
    fn from(row: DbWaitlistEntry) -> Self {
        WaitlistEntry {
            id: row.id,
            lesson_slot_id: row.lesson_slot_id,
            student_id: row.student_id,
            waitlisted_at: row.waitlisted_at,
        }
    }
}

impl From<DbBookingDetail> for BookingDetail {
    fn from(row: DbBookingDetail) -> Self {
        BookingDetail {
            id: row.id,
            lesson_slot_id: row.lesson_slot_id,
            lesson_title: row.lesson_title,
            lesson_start_time: row.lesson_start_time,
            student_id: row.student_id,
            student_name: row.student_name,
            family_id: row.family_id,
            registered_at: row.registered_at,
        }
    }
}
