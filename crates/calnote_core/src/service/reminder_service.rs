//! Reminder scheduling service.
//!
//! # Responsibility
//! - Drive the notification host: cancel-then-schedule on save, full
//!   rebuild on permission grant and resume.
//! - Run the permission flow on startup.
//!
//! # Invariants
//! - Without a host every operation is a silent no-op.
//! - A denied permission is reported, never stored.

use crate::model::date_key::CalendarDate;
use crate::model::notebook::NotesData;
use crate::reminder::host::{HostError, HostEvent, NotificationHost};
use crate::reminder::plan::{plan_all_reminders, plan_save_reminder, ReminderId};
use chrono::{DateTime, Local};
use log::{debug, info};

/// Outcome of a permission check or request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    /// No notification host is attached.
    Unavailable,
    /// Permission is granted; `scheduled` reminders were rebuilt.
    Granted { scheduled: usize },
    Denied,
}

/// Scheduler over an optional notification host.
#[derive(Default)]
pub struct ReminderService {
    host: Option<Box<dyn NotificationHost>>,
}

impl ReminderService {
    pub fn new(host: Option<Box<dyn NotificationHost>>) -> Self {
        Self { host }
    }

    pub fn is_available(&self) -> bool {
        self.host.is_some()
    }

    /// Replaces the reminder for a just-saved date.
    ///
    /// Returns the scheduled id, or `None` when nothing was scheduled.
    pub fn schedule_for_save(
        &mut self,
        date: &CalendarDate,
        html: &str,
    ) -> Result<Option<ReminderId>, HostError> {
        let Some(host) = self.host.as_mut() else {
            return Ok(None);
        };
        let Some(request) = plan_save_reminder(date, html) else {
            debug!(
                "event=reminder_schedule module=reminder status=skip reason=empty date_key={}",
                date.key()
            );
            return Ok(None);
        };

        host.cancel(request.id)?;
        host.schedule(&request)?;
        info!(
            "event=reminder_schedule module=reminder status=ok id={} date_key={}",
            request.id,
            date.key()
        );
        Ok(Some(request.id))
    }

    /// Cancels every reminder and schedules one per future date with notes.
    pub fn reschedule_all(
        &mut self,
        notes: &NotesData,
        now: DateTime<Local>,
    ) -> Result<usize, HostError> {
        let Some(host) = self.host.as_mut() else {
            return Ok(0);
        };
        host.cancel_all()?;
        let planned = plan_all_reminders(notes, now);
        for request in &planned {
            host.schedule(request)?;
        }
        info!(
            "event=reminder_reschedule module=reminder status=ok scheduled={}",
            planned.len()
        );
        Ok(planned.len())
    }

    /// App-ready flow: subscribe to clicks, then reschedule or ask.
    pub fn initialize(
        &mut self,
        notes: &NotesData,
        now: DateTime<Local>,
    ) -> Result<PermissionOutcome, HostError> {
        let Some(host) = self.host.as_mut() else {
            return Ok(PermissionOutcome::Unavailable);
        };
        host.on(
            HostEvent::Click,
            Box::new(|id: ReminderId| {
                info!("event=reminder_click module=reminder status=ok id={}", id);
            }),
        )?;
        self.check_permission(notes, now)
    }

    /// App-resume flow: rebuild when granted, ask again otherwise.
    pub fn on_resume(
        &mut self,
        notes: &NotesData,
        now: DateTime<Local>,
    ) -> Result<PermissionOutcome, HostError> {
        self.check_permission(notes, now)
    }

    /// Asks the host for permission; a grant rebuilds all reminders.
    pub fn request_permission(
        &mut self,
        notes: &NotesData,
        now: DateTime<Local>,
    ) -> Result<PermissionOutcome, HostError> {
        let Some(host) = self.host.as_mut() else {
            return Ok(PermissionOutcome::Unavailable);
        };
        if !host.request_permission()? {
            info!("event=reminder_permission module=reminder status=denied");
            return Ok(PermissionOutcome::Denied);
        }
        info!("event=reminder_permission module=reminder status=granted");
        let scheduled = self.reschedule_all(notes, now)?;
        Ok(PermissionOutcome::Granted { scheduled })
    }

    fn check_permission(
        &mut self,
        notes: &NotesData,
        now: DateTime<Local>,
    ) -> Result<PermissionOutcome, HostError> {
        let Some(host) = self.host.as_mut() else {
            return Ok(PermissionOutcome::Unavailable);
        };
        if host.has_permission()? {
            let scheduled = self.reschedule_all(notes, now)?;
            return Ok(PermissionOutcome::Granted { scheduled });
        }
        self.request_permission(notes, now)
    }
}
