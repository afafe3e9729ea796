use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub lesson_slot_id: Uuid,
    pub student_id: Uuid,
    pub reserved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub id: Uuid,
    pub lesson_slot_id: Uuid,
    pub student_id: Uuid,
    pub waitlisted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveRequest {
    pub student_id: Uuid,
}

/// A reservation joined with the family that owns the reserved student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationOwner {
    pub reservation: Reservation,
    pub family_id: Uuid,
}

/// Listing row for reservation and waitlist screens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDetail {
    pub id: Uuid,
    pub lesson_slot_id: Uuid,
    pub lesson_title: String,
    pub lesson_start_time: DateTime<Utc>,
    pub student_id: Uuid,
    pub student_name: String,
    pub family_id: Uuid,
    pub registered_at: DateTime<Utc>,
}
