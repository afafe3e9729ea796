use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{BookingError, BookingResult};

pub const MAX_STUDENT_NAME_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub family_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRequest {
    pub name: String,
}

impl StudentRequest {
    /// Returns the trimmed name, or a validation error if it is empty or too long.
    pub fn validated_name(&self) -> BookingResult<&str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(BookingError::Validation(
                "Student name must not be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_STUDENT_NAME_LEN {
            return Err(BookingError::Validation(format!(
                "Student name must be at most {} characters",
                MAX_STUDENT_NAME_LEN
            )));
        }
        Ok(name)
    }
}
