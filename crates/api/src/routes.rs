pub mod accounts;
pub mod admin;
pub mod guardian;
pub mod health;
