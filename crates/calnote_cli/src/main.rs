//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `calnote_core` linkage.
//! - Render one month grid from the configured store for quick checks.
//!
//! Usage: `calnote_cli [YEAR MONTH]` with a 1-based month; defaults to the
//! current month. Set `CALNOTE_CONFIG` to read settings from a JSON file.

use calnote_core::db::open_db;
use calnote_core::{
    build_month_grid, CoreConfig, KvNotebookRepository, MonthGrid, NotebookService,
    SqliteKeyValueStore, Theme, YearMonth,
};
use chrono::Local;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("calnote_core ping={}", calnote_core::ping());
    println!("calnote_core version={}", calnote_core::core_version());

    let today = Local::now().date_naive();
    let month = match parse_month(std::env::args().skip(1).collect()) {
        Ok(Some(month)) => month,
        Ok(None) => YearMonth::from_date(today),
        Err(message) => {
            eprintln!("{message}");
            eprintln!("usage: calnote_cli [YEAR MONTH]");
            return ExitCode::from(2);
        }
    };

    let config = match CoreConfig::resolve() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = calnote_core::init_logging_from_config(&config) {
        eprintln!("logging disabled: {err}");
    }
    let grid = match load_grid(&config, month, today) {
        Ok(grid) => grid,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };
    print!("{}", render(&grid));
    ExitCode::SUCCESS
}

fn parse_month(args: Vec<String>) -> Result<Option<YearMonth>, String> {
    match args.as_slice() {
        [] => Ok(None),
        [year, month] => {
            let year: i32 = year
                .parse()
                .map_err(|_| format!("invalid year `{year}`"))?;
            let month: i32 = month
                .parse()
                .ok()
                .filter(|month| (1..=12).contains(month))
                .ok_or_else(|| format!("invalid month `{month}`"))?;
            Ok(Some(YearMonth::new(year, month - 1)))
        }
        _ => Err("expected zero or two arguments".to_string()),
    }
}

fn load_grid(
    config: &CoreConfig,
    month: YearMonth,
    today: chrono::NaiveDate,
) -> Result<MonthGrid, String> {
    let conn = open_db(&config.db_path).map_err(|err| format!("store open failed: {err}"))?;
    let store =
        SqliteKeyValueStore::try_new(&conn).map_err(|err| format!("store init failed: {err}"))?;
    let service = NotebookService::load(
        KvNotebookRepository::new(store),
        Theme::new(config.default_theme.as_str()),
    )
    .map_err(|err| format!("notebook load failed: {err}"))?;
    build_month_grid(month, today, |key| service.has_note(key)).map_err(|err| err.to_string())
}

/// `*` marks dates with notes, `[..]` today, `(..)` adjacent months.
fn render(grid: &MonthGrid) -> String {
    let mut out = format!("{}\n Su   Mo   Tu   We   Th   Fr   Sa\n", grid.title);
    for week in grid.cells.chunks(7) {
        let row: Vec<String> = week
            .iter()
            .map(|cell| {
                let note = if cell.has_note { '*' } else { ' ' };
                let (open, close) = match (cell.other_month, cell.today) {
                    (true, _) => ('(', ')'),
                    (false, true) => ('[', ']'),
                    (false, false) => (' ', ' '),
                };
                format!("{open}{:>2}{close}{note}", cell.day)
            })
            .collect();
        out.push_str(row.join("").trim_end());
        out.push('\n');
    }
    out
}
