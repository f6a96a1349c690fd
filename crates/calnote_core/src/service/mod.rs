//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and host calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage and platform details.

pub mod notebook_service;
pub mod reminder_service;

pub use notebook_service::{NotebookError, NotebookResult, NotebookService, SavedPage};
pub use reminder_service::{PermissionOutcome, ReminderService};
