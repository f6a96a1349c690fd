//! Calendar notes domain model.
//!
//! # Responsibility
//! - Define date addressing, the month grid, per-date pages and preferences.
//! - Keep model rules free of storage and host concerns.

pub mod advisory;
pub mod calendar;
pub mod date_key;
pub mod notebook;
pub mod theme;
