pub mod accounts;
pub mod admin;
pub mod calendar;
pub mod lessons;
pub mod reservations;
pub mod students;
