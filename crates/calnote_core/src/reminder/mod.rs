//! Local reminders for saved notes.
//!
//! # Responsibility
//! - Pure planning of reminder descriptors (`plan`).
//! - The host capability contract the scheduler drives (`host`).
//!
//! # See also
//! - `service::reminder_service` for the cancel/schedule orchestration.

pub mod host;
pub mod plan;

pub use host::{HostError, HostEvent, HostEventHandler, NotificationHost};
pub use plan::{
    derive_reminder_id, html_to_plain_text, plan_all_reminders, plan_save_reminder,
    reminder_time, truncate_reminder_text, ReminderId, ReminderRequest, MAX_REMINDER_TEXT_CHARS,
    REMINDER_HOUR, REMINDER_TITLE,
};
