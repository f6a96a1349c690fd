//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Hand reminder descriptors to the host, which owns the notification
//!   plugin and schedules them itself.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call opens the configured store, applies one use-case and
//!   returns; no notebook state is cached between calls.
//! - Months are 0-based, matching date keys.

use calnote_core::db::open_db;
use calnote_core::reminder::{plan_all_reminders, plan_save_reminder, ReminderRequest};
use calnote_core::{
    build_month_grid, core_version as core_version_inner, init_logging as init_logging_inner,
    ping as ping_inner, Advisory, CalendarDate, CoreConfig, KvNotebookRepository, NotebookError,
    NotebookRepository, NotebookService, SqliteKeyValueStore, Theme, YearMonth,
};
use chrono::{Local, TimeZone};
use std::sync::OnceLock;

static CONFIG: OnceLock<CoreConfig> = OnceLock::new();

type StoreService<'conn> = NotebookService<KvNotebookRepository<SqliteKeyValueStore<'conn>>>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One day cell of the month grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCellView {
    pub year: i32,
    pub month: i32,
    pub day: u32,
    pub other_month: bool,
    pub today: bool,
    pub has_note: bool,
}

/// Month grid response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGridView {
    pub title: String,
    /// Always 42 cells, Sunday-first rows.
    pub cells: Vec<DayCellView>,
    /// Empty on success.
    pub message: String,
}

/// Page tab state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub name: String,
    pub active: bool,
}

/// State of an open date after a page operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateNotesResponse {
    pub ok: bool,
    pub date_key: String,
    pub pages: Vec<PageView>,
    pub current_page: u32,
    /// Saved HTML of the active page.
    pub content: String,
    /// Empty on success, error text otherwise.
    pub message: String,
}

impl DateNotesResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            date_key: String::new(),
            pages: Vec::new(),
            current_page: 0,
            content: String::new(),
            message: message.into(),
        }
    }
}

/// Reminder descriptor for the host notification plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderView {
    pub id: i64,
    pub title: String,
    pub text: String,
    /// Trigger time in epoch milliseconds.
    pub trigger_at_ms: i64,
    pub foreground: bool,
    pub vibrate: bool,
    pub sound: String,
    pub priority: i32,
}

/// Save response: the toast message plus the reminder to (re)schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePageResponse {
    pub ok: bool,
    /// `"{page} Saved!"` on success, error text otherwise.
    pub message: String,
    /// Cancel any reminder with this id, then schedule it. `None` when the
    /// content has no visible text.
    pub reminder: Option<ReminderView>,
}

/// Builds the 42-cell grid for a month, marking saved dates.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - `month` may overflow; it rolls into adjacent years.
#[flutter_rust_bridge::frb(sync)]
pub fn month_grid(year: i32, month: i32) -> MonthGridView {
    let month = YearMonth::new(year, month);
    let today = Local::now().date_naive();
    let grid = with_service(|service| {
        Ok(build_month_grid(month, today, |key| service.has_note(key)))
    })
    .and_then(|grid| grid.map_err(|err| err.to_string()));
    match grid {
        Ok(grid) => MonthGridView {
            title: grid.title,
            cells: grid
                .cells
                .into_iter()
                .map(|cell| DayCellView {
                    year: cell.date.year,
                    month: cell.date.month,
                    day: cell.day,
                    other_month: cell.other_month,
                    today: cell.today,
                    has_note: cell.has_note,
                })
                .collect(),
            message: String::new(),
        },
        Err(message) => MonthGridView {
            title: month.title(),
            cells: Vec::new(),
            message,
        },
    }
}

/// Opens a date on its first page.
#[flutter_rust_bridge::frb(sync)]
pub fn open_date(year: i32, month: i32, day: i32) -> DateNotesResponse {
    date_call(year, month, day, |_| Ok(()))
}

/// Appends `Page N` to a date and activates it.
#[flutter_rust_bridge::frb(sync)]
pub fn add_page(year: i32, month: i32, day: i32) -> DateNotesResponse {
    date_call(year, month, day, |service| service.add_page().map(|_| ()))
}

/// Renames a page; blank names become `Page`.
#[flutter_rust_bridge::frb(sync)]
pub fn rename_page(year: i32, month: i32, day: i32, index: u32, name: String) -> DateNotesResponse {
    date_call(year, month, day, |service| {
        service.rename_page(index as usize, name.as_str())?;
        service.switch_page(index as usize).map(|_| ())
    })
}

/// Deletes a page; the last remaining page is kept.
#[flutter_rust_bridge::frb(sync)]
pub fn delete_page(year: i32, month: i32, day: i32, index: u32) -> DateNotesResponse {
    date_call(year, month, day, |service| {
        service.delete_page(index as usize).map(|_| ())
    })
}

/// Activates a page and returns its saved content.
#[flutter_rust_bridge::frb(sync)]
pub fn load_page(year: i32, month: i32, day: i32, index: u32) -> DateNotesResponse {
    date_call(year, month, day, |service| {
        service.switch_page(index as usize).map(|_| ())
    })
}

/// Saves HTML to a page and returns the reminder the host should schedule.
#[flutter_rust_bridge::frb(sync)]
pub fn save_page(year: i32, month: i32, day: i32, index: u32, html: String) -> SavePageResponse {
    let saved = with_service(|service| {
        service.open_date(CalendarDate::new(year, month, day))?;
        service.switch_page(index as usize)?;
        service.save_current(html.as_str())
    });
    match saved {
        Ok(saved) => SavePageResponse {
            ok: true,
            message: Advisory::PageSaved {
                page_name: saved.page_name,
            }
            .to_string(),
            reminder: plan_save_reminder(&saved.date, html.as_str()).map(to_reminder_view),
        },
        Err(message) => SavePageResponse {
            ok: false,
            message,
            reminder: None,
        },
    }
}

/// Every reminder that should exist after a cancel-all, given `now_ms`.
///
/// Returns an empty list when the store cannot be read.
#[flutter_rust_bridge::frb(sync)]
pub fn plan_reminders(now_ms: i64) -> Vec<ReminderView> {
    let Some(now) = Local.timestamp_millis_opt(now_ms).single() else {
        log::warn!("event=ffi_plan_reminders module=ffi status=error reason=bad_time");
        return Vec::new();
    };
    match with_service(|service| Ok(plan_all_reminders(service.notebook().notes(), now))) {
        Ok(planned) => planned.into_iter().map(to_reminder_view).collect(),
        Err(message) => {
            log::warn!(
                "event=ffi_plan_reminders module=ffi status=error error={}",
                message
            );
            Vec::new()
        }
    }
}

/// Current theme body class, e.g. `theme-lavender`.
#[flutter_rust_bridge::frb(sync)]
pub fn current_theme() -> String {
    with_service(|service| Ok(service.theme().css_class()))
        .unwrap_or_else(|_| Theme::new(resolve_config().default_theme.as_str()).css_class())
}

/// Persists a theme and returns its body class, or an error message.
#[flutter_rust_bridge::frb(sync)]
pub fn set_theme(name: String) -> String {
    with_service(|service| {
        service.set_theme(Theme::new(name))?;
        Ok(service.theme().css_class())
    })
    .unwrap_or_else(|message| message)
}

/// Records a granted notification permission. Denials are never stored.
///
/// Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn record_notification_permission_granted() -> String {
    match with_service(|service| service.record_permission_granted()) {
        Ok(()) => String::new(),
        Err(message) => message,
    }
}

fn shared_config() -> &'static CoreConfig {
    CONFIG.get_or_init(|| {
        CoreConfig::resolve().unwrap_or_else(|err| {
            log::warn!(
                "event=ffi_config module=ffi status=error fallback=env error={}",
                err
            );
            CoreConfig::from_env()
        })
    })
}

#[cfg(not(test))]
fn resolve_config() -> CoreConfig {
    shared_config().clone()
}

#[cfg(test)]
fn resolve_config() -> CoreConfig {
    tests::scoped_config().unwrap_or_else(|| shared_config().clone())
}

fn with_service<T>(
    f: impl FnOnce(&mut StoreService<'_>) -> Result<T, NotebookError>,
) -> Result<T, String> {
    let config = resolve_config();
    let conn = open_db(&config.db_path).map_err(|err| format!("store open failed: {err}"))?;
    let store =
        SqliteKeyValueStore::try_new(&conn).map_err(|err| format!("store init failed: {err}"))?;
    let repo = KvNotebookRepository::new(store);
    let mut service = NotebookService::load(repo, Theme::new(config.default_theme.as_str()))
        .map_err(|err| format!("notebook load failed: {err}"))?;
    f(&mut service).map_err(|err| err.to_string())
}

fn date_call(
    year: i32,
    month: i32,
    day: i32,
    op: impl FnOnce(&mut StoreService<'_>) -> Result<(), NotebookError>,
) -> DateNotesResponse {
    let result = with_service(|service| {
        let date = service.open_date(CalendarDate::new(year, month, day))?;
        op(service)?;
        describe(service, date)
    });
    result.unwrap_or_else(DateNotesResponse::failure)
}

fn describe<R: NotebookRepository>(
    service: &NotebookService<R>,
    date: CalendarDate,
) -> Result<DateNotesResponse, NotebookError> {
    let current = service.current_page();
    let pages = service
        .pages()?
        .iter()
        .enumerate()
        .map(|(index, page)| PageView {
            name: page.name.clone(),
            active: index == current,
        })
        .collect();
    Ok(DateNotesResponse {
        ok: true,
        date_key: date.key(),
        pages,
        current_page: current as u32,
        content: service.current_content()?.to_string(),
        message: String::new(),
    })
}

fn to_reminder_view(request: ReminderRequest) -> ReminderView {
    ReminderView {
        id: request.id.0,
        title: request.title,
        text: request.text,
        trigger_at_ms: request.trigger_at.timestamp_millis(),
        foreground: request.foreground,
        vibrate: request.vibrate,
        sound: request.sound,
        priority: request.priority,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        add_page, core_version, delete_page, init_logging, load_page, month_grid, open_date,
        ping, plan_reminders, rename_page, save_page,
    };
    use calnote_core::CoreConfig;
    use std::cell::RefCell;
    use tempfile::TempDir;

    thread_local! {
        static SCOPED_CONFIG: RefCell<Option<CoreConfig>> = RefCell::new(None);
    }

    pub(super) fn scoped_config() -> Option<CoreConfig> {
        SCOPED_CONFIG.with(|config| config.borrow().clone())
    }

    /// Points API calls on this test thread at a fresh database.
    ///
    /// The database lives as long as the returned directory.
    fn use_test_db() -> TempDir {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = CoreConfig {
            db_path: dir.path().join("calnote.sqlite3"),
            ..CoreConfig::default()
        };
        SCOPED_CONFIG.with(|scoped| *scoped.borrow_mut() = Some(config));
        dir
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn month_grid_always_has_42_cells() {
        let _db = use_test_db();
        let grid = month_grid(2024, 12);
        assert!(grid.message.is_empty(), "{}", grid.message);
        assert_eq!(grid.title, "January 2025");
        assert_eq!(grid.cells.len(), 42);
    }

    #[test]
    fn month_grid_reports_unsupported_months() {
        let _db = use_test_db();
        for (year, month) in [(262142, 11), (i32::MAX, 11), (i32::MIN, 0)] {
            let grid = month_grid(year, month);
            assert!(!grid.message.is_empty(), "{year}-{month}");
            assert!(grid.cells.is_empty());
        }
    }

    #[test]
    fn calls_on_separate_databases_do_not_share_notes() {
        let first = use_test_db();
        let saved = save_page(2030, 0, 1, 0, "kept".to_string());
        assert!(saved.ok, "{}", saved.message);
        assert_eq!(plan_reminders(0).len(), 1);

        let _second = use_test_db();
        assert!(plan_reminders(0).is_empty());
        drop(first);
    }

    #[test]
    fn page_flow_round_trips_through_the_store() {
        let _db = use_test_db();
        let year = 2030;

        let opened = open_date(year, 3, 7);
        assert!(opened.ok, "{}", opened.message);
        assert_eq!(opened.pages.len(), 1);
        assert_eq!(opened.date_key, format!("{year}-3-7"));

        let added = add_page(year, 3, 7);
        assert_eq!(added.current_page, 1);
        assert_eq!(added.pages[1].name, "Page 2");

        let saved = save_page(year, 3, 7, 1, "<b>Plan</b> trip".to_string());
        assert!(saved.ok, "{}", saved.message);
        assert_eq!(saved.message, "Page 2 Saved!");
        let reminder = saved.reminder.expect("reminder planned");
        assert_eq!(reminder.text, "Plan trip");

        let renamed = rename_page(year, 3, 7, 1, "Trip".to_string());
        assert_eq!(renamed.pages[1].name, "Trip");
        assert_eq!(renamed.content, "<b>Plan</b> trip");

        let loaded = load_page(year, 3, 7, 1);
        assert_eq!(loaded.content, "<b>Plan</b> trip");

        let planned = plan_reminders(0);
        assert!(planned.iter().any(|view| view.id == reminder.id));

        let deleted = delete_page(year, 3, 7, 0);
        assert_eq!(deleted.pages.len(), 1);
        assert_eq!(deleted.content, "<b>Plan</b> trip");
        let kept = delete_page(year, 3, 7, 0);
        assert_eq!(kept.pages.len(), 1);
    }

    #[test]
    fn saving_whitespace_plans_no_reminder() {
        let _db = use_test_db();
        let year = 2030;
        let saved = save_page(year, 0, 1, 0, " <br> ".to_string());
        assert!(saved.ok, "{}", saved.message);
        assert!(saved.reminder.is_none());
    }

    #[test]
    fn bad_page_index_reports_error() {
        let _db = use_test_db();
        let response = load_page(2030, 5, 5, 9);
        assert!(!response.ok);
        assert!(!response.message.is_empty());
    }
}
