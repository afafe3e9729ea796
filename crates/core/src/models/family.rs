use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::student::Student;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Family {
    pub id: Uuid,
    pub account_id: Uuid,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyWithStudents {
    pub id: Uuid,
    pub username: String,
    pub phone_number: String,
    pub students: Vec<Student>,
}

pub const MAX_PHONE_NUMBER_LEN: usize = 15;
