//! Core domain logic for Calendar Notes.
//! This crate is the single source of truth for notebook invariants.

pub mod app;
pub mod config;
pub mod db;
pub mod editor;
pub mod logging;
pub mod model;
pub mod reminder;
pub mod repo;
pub mod service;

pub use app::{CalendarApp, View};
pub use config::{ConfigError, CoreConfig};
pub use editor::{EditorSession, FormatCommand, MarkKind, RichDocument, TextRange, ToolbarState};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::advisory::{Advisory, SelectionAction};
pub use model::calendar::{
    build_month_grid, CalendarCell, CalendarError, CellAction, MonthGrid, YearMonth,
};
pub use model::date_key::{date_key, CalendarDate};
pub use model::notebook::{Notebook, NotesData, Page, PagesData};
pub use model::theme::Theme;
pub use reminder::{HostError, HostEvent, NotificationHost, ReminderId, ReminderRequest};
pub use repo::{
    KeyValueStore, KvNotebookRepository, MemoryKeyValueStore, NotebookRepository, RepoError,
    RepoResult, SqliteKeyValueStore,
};
pub use service::{NotebookError, NotebookService, PermissionOutcome, ReminderService, SavedPage};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
