//! Grouping of upcoming lessons into calendar days.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::models::{
    lesson_slot::LessonSlotSummary,
    reservation::{Reservation, WaitlistEntry},
    student::Student,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarLesson {
    #[serde(flatten)]
    pub summary: LessonSlotSummary,
    pub my_reservations: Vec<Reservation>,
    pub my_waitlist: Vec<WaitlistEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub lessons: Vec<CalendarLesson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarResponse {
    pub students: Vec<Student>,
    pub days: Vec<CalendarDay>,
}

/// Buckets lessons by their local start date in `tz`, earliest day first.
/// Lessons keep their relative order inside a day.
pub fn group_by_day(lessons: Vec<CalendarLesson>, tz: Tz) -> Vec<CalendarDay> {
    let mut days: BTreeMap<NaiveDate, Vec<CalendarLesson>> = BTreeMap::new();
    for lesson in lessons {
        let date = lesson
            .summary
            .slot
            .start_time
            .with_timezone(&tz)
            .date_naive();
        days.entry(date).or_default().push(lesson);
    }

    days.into_iter()
        .map(|(date, lessons)| CalendarDay { date, lessons })
        .collect()
}
