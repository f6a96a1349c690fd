//! Notebook use-case service.
//!
//! # Responsibility
//! - Own the in-memory notebook, selected date and active page.
//! - Mirror every page mutation and save to the repository.
//! - Hold the theme preference and notification permission flag.
//!
//! # Invariants
//! - Opened dates are canonicalized before their key is built.
//! - Opening a date resets the active page to 0 and is not persisted.
//! - The active page index always addresses an existing page.
//! - Switching pages is suppressed while a rename is in progress.

use crate::model::date_key::CalendarDate;
use crate::model::notebook::{Notebook, Page, PageError};
use crate::model::theme::Theme;
use crate::repo::kv_repo::RepoError;
use crate::repo::notebook_repo::NotebookRepository;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for notebook use-cases.
#[derive(Debug)]
pub enum NotebookError {
    /// A page operation ran with no date open.
    NoDateOpen,
    /// Components do not resolve to a real date.
    InvalidDate(CalendarDate),
    /// No rename was started.
    NoRenameInProgress,
    Page(PageError),
    Repo(RepoError),
}

impl Display for NotebookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDateOpen => write!(f, "no date is open"),
            Self::InvalidDate(date) => write!(f, "not a calendar date: {date}"),
            Self::NoRenameInProgress => write!(f, "no page rename in progress"),
            Self::Page(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NotebookError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Page(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PageError> for NotebookError {
    fn from(value: PageError) -> Self {
        Self::Page(value)
    }
}

impl From<RepoError> for NotebookError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type NotebookResult<T> = Result<T, NotebookError>;

/// Result of saving the active page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedPage {
    pub date: CalendarDate,
    pub page_index: usize,
    pub page_name: String,
}

/// Notebook state manager over a repository implementation.
pub struct NotebookService<R: NotebookRepository> {
    repo: R,
    notebook: Notebook,
    theme: Theme,
    selected: Option<CalendarDate>,
    current_page: usize,
    renaming: Option<usize>,
}

impl<R: NotebookRepository> NotebookService<R> {
    /// Loads stored state; `default_theme` applies when none was saved.
    pub fn load(repo: R, default_theme: Theme) -> NotebookResult<Self> {
        let notebook = repo.load_notebook()?;
        let theme = repo.load_theme()?.unwrap_or(default_theme);
        info!(
            "event=notebook_load module=notebook status=ok dates={} theme={}",
            notebook.pages().len(),
            theme.name()
        );
        Ok(Self {
            repo,
            notebook,
            theme,
            selected: None,
            current_page: 0,
            renaming: None,
        })
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn notebook(&self) -> &Notebook {
        &self.notebook
    }

    pub fn has_note(&self, key: &str) -> bool {
        self.notebook.has_note(key)
    }

    pub fn selected_date(&self) -> Option<CalendarDate> {
        self.selected
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn renaming(&self) -> Option<usize> {
        self.renaming
    }

    /// Selects a date, creating its first page in memory when new.
    ///
    /// Returns the canonical date that was opened.
    pub fn open_date(&mut self, date: CalendarDate) -> NotebookResult<CalendarDate> {
        let date = date
            .canonical()
            .ok_or(NotebookError::InvalidDate(date))?;
        let key = date.key();
        let created = self.notebook.ensure_date(key.as_str());
        self.selected = Some(date);
        self.current_page = 0;
        self.renaming = None;
        info!(
            "event=date_open module=notebook status=ok date_key={} created={}",
            key, created
        );
        Ok(date)
    }

    /// Deselects the date (back to the calendar).
    pub fn close_date(&mut self) {
        self.selected = None;
        self.current_page = 0;
        self.renaming = None;
    }

    pub fn pages(&self) -> NotebookResult<&[Page]> {
        let key = self.selected_key()?;
        Ok(self.notebook.pages_for(key.as_str())?)
    }

    /// Appends `Page N` and makes it active.
    pub fn add_page(&mut self) -> NotebookResult<usize> {
        let key = self.selected_key()?;
        let index = self.notebook.add_page(key.as_str())?;
        self.current_page = index;
        self.renaming = None;
        self.persist("page_add")?;
        info!(
            "event=page_add module=notebook status=ok date_key={} page_index={}",
            key, index
        );
        Ok(index)
    }

    /// Enters rename mode for a page and returns its current name.
    pub fn begin_rename(&mut self, index: usize) -> NotebookResult<String> {
        let name = self
            .pages()?
            .get(index)
            .map(|page| page.name.clone())
            .ok_or_else(|| self.out_of_range(index))?;
        self.renaming = Some(index);
        Ok(name)
    }

    /// Commits the pending rename.
    pub fn commit_rename(&mut self, name: &str) -> NotebookResult<String> {
        let index = self.renaming.ok_or(NotebookError::NoRenameInProgress)?;
        self.renaming = None;
        self.rename_page(index, name)
    }

    /// Renames a page; blank input becomes `Page`.
    pub fn rename_page(&mut self, index: usize, name: &str) -> NotebookResult<String> {
        let key = self.selected_key()?;
        let applied = self
            .notebook
            .rename_page(key.as_str(), index, name)?
            .to_string();
        self.persist("page_rename")?;
        info!(
            "event=page_rename module=notebook status=ok date_key={} page_index={} name_len={}",
            key,
            index,
            applied.chars().count()
        );
        Ok(applied)
    }

    /// Deletes a page unless it is the only one.
    ///
    /// Returns `false` when nothing changed.
    pub fn delete_page(&mut self, index: usize) -> NotebookResult<bool> {
        let key = self.selected_key()?;
        if !self.notebook.delete_page(key.as_str(), index)? {
            info!(
                "event=page_delete module=notebook status=skip date_key={} reason=last_page",
                key
            );
            return Ok(false);
        }

        let remaining = self.notebook.pages_for(key.as_str())?.len();
        if self.current_page >= remaining {
            self.current_page = remaining - 1;
        }
        self.renaming = None;
        self.persist("page_delete")?;
        info!(
            "event=page_delete module=notebook status=ok date_key={} page_index={} remaining={}",
            key, index, remaining
        );
        Ok(true)
    }

    /// Activates a page. Returns `false` while a rename is in progress.
    pub fn switch_page(&mut self, index: usize) -> NotebookResult<bool> {
        if self.renaming.is_some() {
            return Ok(false);
        }
        if index >= self.pages()?.len() {
            return Err(self.out_of_range(index));
        }
        self.current_page = index;
        Ok(true)
    }

    /// Saved HTML of the active page, `""` when never saved.
    pub fn current_content(&self) -> NotebookResult<&str> {
        let key = self.selected_key()?;
        Ok(self.notebook.page_content(key.as_str(), self.current_page)?)
    }

    /// Stores HTML for the active page in both maps and persists.
    pub fn save_current(&mut self, html: &str) -> NotebookResult<SavedPage> {
        let date = self.selected.ok_or(NotebookError::NoDateOpen)?;
        let key = date.key();
        let index = self.current_page;
        self.notebook.save_content(key.as_str(), index, html)?;
        self.persist("page_save")?;

        let page_name = self.notebook.pages_for(key.as_str())?[index].name.clone();
        info!(
            "event=page_save module=notebook status=ok date_key={} page_index={} html_len={}",
            key,
            index,
            html.len()
        );
        Ok(SavedPage {
            date,
            page_index: index,
            page_name,
        })
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Applies and persists a theme.
    pub fn set_theme(&mut self, theme: Theme) -> NotebookResult<()> {
        self.repo.save_theme(&theme)?;
        info!(
            "event=theme_set module=notebook status=ok theme={}",
            theme.name()
        );
        self.theme = theme;
        Ok(())
    }

    pub fn permission_granted(&self) -> NotebookResult<bool> {
        Ok(self.repo.permission_granted()?)
    }

    pub fn record_permission_granted(&self) -> NotebookResult<()> {
        Ok(self.repo.record_permission_granted()?)
    }

    fn selected_key(&self) -> NotebookResult<String> {
        self.selected
            .map(|date| date.key())
            .ok_or(NotebookError::NoDateOpen)
    }

    fn out_of_range(&self, index: usize) -> NotebookError {
        let date_key = self.selected.map(|date| date.key()).unwrap_or_default();
        let len = self
            .notebook
            .pages_for(date_key.as_str())
            .map_or(0, <[Page]>::len);
        NotebookError::Page(PageError::PageOutOfRange {
            date_key,
            index,
            len,
        })
    }

    fn persist(&self, event: &str) -> NotebookResult<()> {
        if let Err(err) = self.repo.save_notebook(&self.notebook) {
            warn!(
                "event={} module=notebook status=error error_code=persist_failed error={}",
                event, err
            );
            return Err(err.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{NotebookError, NotebookService};
    use crate::model::date_key::CalendarDate;
    use crate::model::theme::Theme;
    use crate::repo::kv_repo::MemoryKeyValueStore;
    use crate::repo::notebook_repo::{KvNotebookRepository, NotebookRepository};

    type Service = NotebookService<KvNotebookRepository<MemoryKeyValueStore>>;

    fn service() -> Service {
        let repo = KvNotebookRepository::new(MemoryKeyValueStore::new());
        NotebookService::load(repo, Theme::default()).expect("load")
    }

    #[test]
    fn page_operations_require_an_open_date() {
        let mut service = service();
        assert!(matches!(service.add_page(), Err(NotebookError::NoDateOpen)));
        assert!(matches!(service.pages(), Err(NotebookError::NoDateOpen)));
    }

    #[test]
    fn open_canonicalizes_overflowed_dates() {
        let mut service = service();
        let opened = service.open_date(CalendarDate::new(2023, 12, 1)).unwrap();
        assert_eq!(opened, CalendarDate::new(2024, 0, 1));
        assert_eq!(service.notebook().pages().keys().next().unwrap(), "2024-0-1");
    }

    #[test]
    fn open_is_not_persisted_until_a_mutation() {
        let mut service = service();
        service.open_date(CalendarDate::new(2024, 0, 15)).unwrap();
        assert!(service.repo().load_notebook().unwrap().pages().is_empty());

        service.add_page().unwrap();
        let stored = service.repo().load_notebook().unwrap();
        assert_eq!(stored.pages_for("2024-0-15").unwrap().len(), 2);
    }

    #[test]
    fn delete_clamps_active_page() {
        let mut service = service();
        service.open_date(CalendarDate::new(2024, 0, 15)).unwrap();
        service.add_page().unwrap();
        service.add_page().unwrap();
        assert_eq!(service.current_page(), 2);

        assert!(service.delete_page(2).unwrap());
        assert_eq!(service.current_page(), 1);
        assert!(service.delete_page(0).unwrap());
        assert_eq!(service.current_page(), 0);
        assert!(!service.delete_page(0).unwrap());
    }

    #[test]
    fn switch_is_suppressed_during_rename() {
        let mut service = service();
        service.open_date(CalendarDate::new(2024, 0, 15)).unwrap();
        service.add_page().unwrap();

        assert_eq!(service.begin_rename(0).unwrap(), "Page 1");
        assert!(!service.switch_page(0).unwrap());
        assert_eq!(service.current_page(), 1);

        assert_eq!(service.commit_rename("").unwrap(), "Page");
        assert!(service.switch_page(0).unwrap());
        assert_eq!(service.current_page(), 0);
        assert!(matches!(
            service.commit_rename("x"),
            Err(NotebookError::NoRenameInProgress)
        ));
    }

    #[test]
    fn save_returns_page_name_for_feedback() {
        let mut service = service();
        service.open_date(CalendarDate::new(2024, 0, 15)).unwrap();
        service.rename_page(0, "Work").unwrap();
        let saved = service.save_current("<p>hi</p>").unwrap();
        assert_eq!(saved.page_name, "Work");
        assert_eq!(service.current_content().unwrap(), "<p>hi</p>");
        assert!(service.has_note("2024-0-15"));
    }

    #[test]
    fn theme_defaults_then_persists() {
        let mut service = service();
        assert_eq!(service.theme().name(), "lavender");
        service.set_theme(Theme::new("rose")).unwrap();
        assert_eq!(
            service.repo().load_theme().unwrap(),
            Some(Theme::new("rose"))
        );
    }
}
