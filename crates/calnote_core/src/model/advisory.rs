//! User-facing advisory messages.
//!
//! Advisories are shown to the user and never abort the process. They carry
//! no internal error chain.

use std::fmt::{Display, Formatter};

/// Delay before the permission-denied message is shown.
pub const PERMISSION_DENIED_DELAY_MS: u64 = 500;

/// One-shot editor actions that need a text selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionAction {
    Highlight,
    ClearFormatting,
}

/// Message the UI shell should surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// Highlight/clear-formatting invoked without a usable selection.
    SelectTextFirst(SelectionAction),
    /// The notification permission request was refused.
    NotificationPermissionDenied,
    /// A page was saved.
    PageSaved { page_name: String },
}

impl Advisory {
    /// Milliseconds the UI should wait before showing the message.
    pub fn delay_ms(&self) -> u64 {
        match self {
            Self::NotificationPermissionDenied => PERMISSION_DENIED_DELAY_MS,
            _ => 0,
        }
    }
}

impl Display for Advisory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelectTextFirst(SelectionAction::Highlight) => {
                write!(f, "Please select text first to highlight!")
            }
            Self::SelectTextFirst(SelectionAction::ClearFormatting) => {
                write!(f, "Please select text first to clear formatting!")
            }
            Self::NotificationPermissionDenied => write!(
                f,
                "Please allow notification permission to get reminders for your notes!"
            ),
            Self::PageSaved { page_name } => write!(f, "{page_name} Saved!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Advisory, SelectionAction};

    #[test]
    fn messages_match_ui_copy() {
        assert_eq!(
            Advisory::SelectTextFirst(SelectionAction::Highlight).to_string(),
            "Please select text first to highlight!"
        );
        assert_eq!(
            Advisory::PageSaved {
                page_name: "Page 2".to_string()
            }
            .to_string(),
            "Page 2 Saved!"
        );
        assert_eq!(Advisory::NotificationPermissionDenied.delay_ms(), 500);
    }
}
