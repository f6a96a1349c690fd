//! Application state manager.
//!
//! # Responsibility
//! - Hold the displayed month, notebook state, editor and reminder
//!   scheduler behind one object the UI shell drives.
//! - Translate UI events into service calls and advisory messages.
//!
//! # Invariants
//! - The editor always shows the active page of the selected date.
//! - Notification host failures are logged and never fail a save.
//! - Only a granted permission is persisted.

use crate::editor::session::{EditorSession, FormatCommand, ToolbarState};
use crate::model::advisory::Advisory;
use crate::model::calendar::{
    build_month_grid, CalendarCell, CalendarError, CellAction, MonthGrid, YearMonth,
};
use crate::model::date_key::CalendarDate;
use crate::model::notebook::Page;
use crate::model::theme::Theme;
use crate::reminder::host::{HostError, NotificationHost};
use crate::repo::notebook_repo::NotebookRepository;
use crate::service::notebook_service::{NotebookResult, NotebookService};
use crate::service::reminder_service::{PermissionOutcome, ReminderService};
use chrono::{DateTime, Local, NaiveDate};
use log::{info, warn};

/// Which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Calendar,
    Notes(CalendarDate),
}

/// Calendar notes application.
pub struct CalendarApp<R: NotebookRepository> {
    notebook: NotebookService<R>,
    reminders: ReminderService,
    editor: EditorSession,
    displayed: YearMonth,
}

impl<R: NotebookRepository> CalendarApp<R> {
    /// Loads stored state and shows the month containing `today`.
    pub fn start(
        repo: R,
        host: Option<Box<dyn NotificationHost>>,
        default_theme: Theme,
        today: NaiveDate,
    ) -> NotebookResult<Self> {
        let notebook = NotebookService::load(repo, default_theme)?;
        info!(
            "event=app_start module=app status=ok notifications={}",
            host.is_some()
        );
        Ok(Self {
            notebook,
            reminders: ReminderService::new(host),
            editor: EditorSession::new(),
            displayed: YearMonth::from_date(today),
        })
    }

    pub fn notebook(&self) -> &NotebookService<R> {
        &self.notebook
    }

    pub fn view(&self) -> View {
        match self.notebook.selected_date() {
            Some(date) => View::Notes(date),
            None => View::Calendar,
        }
    }

    pub fn displayed_month(&self) -> YearMonth {
        self.displayed
    }

    pub fn month_grid(&self, today: NaiveDate) -> Result<MonthGrid, CalendarError> {
        build_month_grid(self.displayed, today, |key| self.notebook.has_note(key))
    }

    pub fn show_month(&mut self, month: YearMonth) {
        self.displayed = month;
    }

    pub fn previous_month(&mut self) -> YearMonth {
        self.displayed = self.displayed.previous();
        self.displayed
    }

    pub fn next_month(&mut self) -> YearMonth {
        self.displayed = self.displayed.next();
        self.displayed
    }

    /// Handles a click on a grid cell.
    pub fn activate_cell(&mut self, cell: &CalendarCell) -> NotebookResult<CellAction> {
        let action = cell.action();
        match action {
            CellAction::Navigate(month) => self.show_month(month),
            CellAction::OpenNotes(date) => {
                self.open_date(date)?;
            }
        }
        Ok(action)
    }

    /// Opens the notes view for a date on its first page.
    pub fn open_date(&mut self, date: CalendarDate) -> NotebookResult<CalendarDate> {
        let opened = self.notebook.open_date(date)?;
        self.reload_editor()?;
        Ok(opened)
    }

    pub fn back_to_calendar(&mut self) {
        self.notebook.close_date();
        self.editor = EditorSession::new();
    }

    pub fn pages(&self) -> NotebookResult<&[Page]> {
        self.notebook.pages()
    }

    pub fn current_page(&self) -> usize {
        self.notebook.current_page()
    }

    pub fn add_page(&mut self) -> NotebookResult<usize> {
        let index = self.notebook.add_page()?;
        self.reload_editor()?;
        Ok(index)
    }

    pub fn begin_rename(&mut self, index: usize) -> NotebookResult<String> {
        self.notebook.begin_rename(index)
    }

    pub fn commit_rename(&mut self, name: &str) -> NotebookResult<String> {
        self.notebook.commit_rename(name)
    }

    pub fn delete_page(&mut self, index: usize) -> NotebookResult<bool> {
        let deleted = self.notebook.delete_page(index)?;
        if deleted {
            self.reload_editor()?;
        }
        Ok(deleted)
    }

    /// Switches the active page; unsaved editor changes are discarded.
    pub fn switch_page(&mut self, index: usize) -> NotebookResult<bool> {
        let switched = self.notebook.switch_page(index)?;
        if switched {
            self.reload_editor()?;
        }
        Ok(switched)
    }

    pub fn editor(&self) -> &EditorSession {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut EditorSession {
        &mut self.editor
    }

    /// Runs a toolbar command; returns a message when it needs a selection.
    pub fn apply_format(&mut self, command: FormatCommand) -> Option<Advisory> {
        self.editor.apply(command).err()
    }

    pub fn toolbar_state(&self) -> ToolbarState {
        self.editor.toolbar_state()
    }

    /// Saves the editor content to the active page and schedules its reminder.
    pub fn save(&mut self) -> NotebookResult<Advisory> {
        let html = self.editor.html();
        let saved = self.notebook.save_current(html.as_str())?;
        if let Err(err) = self.reminders.schedule_for_save(&saved.date, html.as_str()) {
            warn!(
                "event=reminder_schedule module=app status=error date_key={} error={}",
                saved.date.key(),
                err
            );
        }
        Ok(Advisory::PageSaved {
            page_name: saved.page_name,
        })
    }

    pub fn theme(&self) -> &Theme {
        self.notebook.theme()
    }

    /// Applies and persists a theme picked from the sidebar.
    pub fn apply_theme(&mut self, name: &str) -> NotebookResult<String> {
        self.notebook.set_theme(Theme::new(name))?;
        Ok(self.notebook.theme().css_class())
    }

    /// Host app-ready signal.
    pub fn on_ready(&mut self, now: DateTime<Local>) -> NotebookResult<Option<Advisory>> {
        let outcome = self.reminders.initialize(self.notebook.notebook().notes(), now);
        self.handle_permission("app_ready", outcome)
    }

    /// Host app-resume signal.
    pub fn on_resume(&mut self, now: DateTime<Local>) -> NotebookResult<Option<Advisory>> {
        let outcome = self.reminders.on_resume(self.notebook.notebook().notes(), now);
        self.handle_permission("app_resume", outcome)
    }

    fn handle_permission(
        &mut self,
        event: &str,
        outcome: Result<PermissionOutcome, HostError>,
    ) -> NotebookResult<Option<Advisory>> {
        match outcome {
            Ok(PermissionOutcome::Granted { .. }) => {
                self.notebook.record_permission_granted()?;
                Ok(None)
            }
            Ok(PermissionOutcome::Denied) => Ok(Some(Advisory::NotificationPermissionDenied)),
            Ok(PermissionOutcome::Unavailable) => Ok(None),
            Err(err) => {
                warn!(
                    "event={} module=app status=error error_code=host_failed error={}",
                    event, err
                );
                Ok(None)
            }
        }
    }

    fn reload_editor(&mut self) -> NotebookResult<()> {
        let content = self.notebook.current_content()?.to_string();
        self.editor.load_html(content.as_str());
        Ok(())
    }
}
