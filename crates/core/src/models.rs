pub mod account;
pub mod family;
pub mod lesson_slot;
pub mod reservation;
pub mod student;
