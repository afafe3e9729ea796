//! # Lessonbook Core
//!
//! Domain types and booking rules for the lesson reservation service:
//! remaining capacity, admission into slots and waitlists, cancellation,
//! and bulk generation of recurring slots. Storage is reached only through
//! the traits in [`store`], so every rule here runs the same against
//! PostgreSQL and the in-memory store.

pub mod admission;
pub mod availability;
pub mod calendar;
pub mod errors;
pub mod generator;
pub mod models;
pub mod store;
