//! Notification host capability.
//!
//! The platform side (local-notification plugin, OS scheduler) implements
//! [`NotificationHost`]. Calls complete before returning; a host that
//! cannot answer reports a [`HostError`].

use crate::reminder::plan::{ReminderId, ReminderRequest};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Host events the core subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// The user tapped a delivered reminder.
    Click,
}

pub type HostEventHandler = Box<dyn FnMut(ReminderId) + Send>;

/// Failure reported by the notification host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostError {
    pub operation: &'static str,
    pub message: String,
}

impl HostError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

impl Display for HostError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "notification host `{}` failed: {}", self.operation, self.message)
    }
}

impl Error for HostError {}

/// Local notification capability.
pub trait NotificationHost {
    fn has_permission(&mut self) -> Result<bool, HostError>;
    fn request_permission(&mut self) -> Result<bool, HostError>;
    fn cancel(&mut self, id: ReminderId) -> Result<(), HostError>;
    fn cancel_all(&mut self) -> Result<(), HostError>;
    fn schedule(&mut self, request: &ReminderRequest) -> Result<(), HostError>;
    fn on(&mut self, event: HostEvent, handler: HostEventHandler) -> Result<(), HostError>;
}
