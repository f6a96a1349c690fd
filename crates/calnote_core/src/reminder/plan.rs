//! Reminder planning.
//!
//! # Responsibility
//! - Decide which dates get a reminder and what it says.
//! - Derive reminder ids, trigger times and display text.
//!
//! # Invariants
//! - Planning is pure: no host calls, no clock reads.
//! - Reminders fire at 08:00 local time on the note's own date.
//! - Reminder text is at most 200 characters plus a `...` marker.
//! - Ids concatenate year, month and day digits, so distinct dates may
//!   share an id (`2023-1-15` and `2023-11-5` both give `2023115`).

use crate::editor::document::RichDocument;
use crate::model::date_key::{normalize_ymd, parse_date_key, CalendarDate};
use crate::model::notebook::NotesData;
use chrono::{DateTime, Local, TimeZone};
use std::fmt::{Display, Formatter};

pub const REMINDER_TITLE: &str = "Calendar Notes Reminder";
pub const REMINDER_HOUR: u32 = 8;
pub const MAX_REMINDER_TEXT_CHARS: usize = 200;
pub const REMINDER_SOUND: &str = "default";
pub const REMINDER_PRIORITY: i32 = 2;

/// Host notification id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReminderId(pub i64);

impl Display for ReminderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Id for a date's reminder: the decimal digits of year, month and day
/// concatenated and read back as one integer.
pub fn derive_reminder_id(date: &CalendarDate) -> Option<ReminderId> {
    format!("{}{}{}", date.year, date.month, date.day)
        .parse()
        .ok()
        .map(ReminderId)
}

/// Caps `text` at [`MAX_REMINDER_TEXT_CHARS`], appending `...` when cut.
///
/// Counts `char`s, so an emoji is one character and is never split.
pub fn truncate_reminder_text(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(MAX_REMINDER_TEXT_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Text content of saved HTML with all markup removed.
pub fn html_to_plain_text(html: &str) -> String {
    RichDocument::from_html(html).text_content()
}

/// 08:00 local time on `date`, after normalizing overflowed components.
pub fn reminder_time(date: &CalendarDate) -> Option<DateTime<Local>> {
    let day = normalize_ymd(date.year, date.month, date.day)?;
    let at = day.and_hms_opt(REMINDER_HOUR, 0, 0)?;
    Local.from_local_datetime(&at).earliest()
}

/// Descriptor handed to the notification host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRequest {
    pub id: ReminderId,
    pub title: String,
    pub text: String,
    pub trigger_at: DateTime<Local>,
    pub foreground: bool,
    pub vibrate: bool,
    pub sound: String,
    pub priority: i32,
}

impl ReminderRequest {
    fn new(id: ReminderId, text: &str, trigger_at: DateTime<Local>) -> Self {
        Self {
            id,
            title: REMINDER_TITLE.to_string(),
            text: truncate_reminder_text(text),
            trigger_at,
            foreground: true,
            vibrate: true,
            sound: REMINDER_SOUND.to_string(),
            priority: REMINDER_PRIORITY,
        }
    }
}

/// Reminder for content just saved on `date`.
///
/// Returns `None` when the content has no visible text. Past dates are
/// still planned; the host decides what to do with them.
pub fn plan_save_reminder(date: &CalendarDate, html: &str) -> Option<ReminderRequest> {
    let text = html_to_plain_text(html);
    if text.trim().is_empty() {
        return None;
    }
    let id = derive_reminder_id(date)?;
    let trigger_at = reminder_time(date)?;
    Some(ReminderRequest::new(id, text.as_str(), trigger_at))
}

/// One reminder per date with saved content whose trigger is after `now`.
///
/// Each date's text joins the plain text of every non-blank page, each
/// followed by a space.
pub fn plan_all_reminders(notes: &NotesData, now: DateTime<Local>) -> Vec<ReminderRequest> {
    let mut planned = Vec::new();
    for (key, pages) in notes {
        let mut combined = String::new();
        let mut has_content = false;
        for html in pages.values() {
            if html.trim().is_empty() {
                continue;
            }
            has_content = true;
            combined.push_str(html_to_plain_text(html).as_str());
            combined.push(' ');
        }
        if !has_content || combined.trim().is_empty() {
            continue;
        }

        let Some(date) = parse_date_key(key) else {
            log::warn!(
                "event=reminder_plan module=reminder status=skip reason=bad_key key={}",
                key
            );
            continue;
        };
        let (Some(id), Some(trigger_at)) = (derive_reminder_id(&date), reminder_time(&date)) else {
            log::warn!(
                "event=reminder_plan module=reminder status=skip reason=bad_date key={}",
                key
            );
            continue;
        };
        if trigger_at > now {
            planned.push(ReminderRequest::new(id, combined.as_str(), trigger_at));
        }
    }
    planned
}
