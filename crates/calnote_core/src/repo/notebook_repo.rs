//! Notebook persistence over a key-value store.
//!
//! # Responsibility
//! - Encode notebook maps as JSON under the fixed storage keys.
//! - Load settings (theme, notification permission) with defaults.
//!
//! # Invariants
//! - Absent keys load as empty maps / no setting.
//! - Malformed stored JSON fails loading with `RepoError::InvalidData`.
//! - Only a granted notification permission is ever stored.

use crate::model::notebook::{Notebook, NotesData, PagesData};
use crate::model::theme::Theme;
use crate::repo::kv_repo::{KeyValueStore, RepoError, RepoResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const NOTES_KEY: &str = "calendarNotes";
pub const PAGES_KEY: &str = "pagesData";
pub const THEME_KEY: &str = "selectedTheme";
pub const PERMISSION_KEY: &str = "notificationPermission";
pub const PERMISSION_GRANTED: &str = "granted";

/// Persistence contract for notebook state and settings.
pub trait NotebookRepository {
    fn load_notebook(&self) -> RepoResult<Notebook>;
    /// Writes both maps. Last write wins.
    fn save_notebook(&self, notebook: &Notebook) -> RepoResult<()>;
    fn load_theme(&self) -> RepoResult<Option<Theme>>;
    fn save_theme(&self, theme: &Theme) -> RepoResult<()>;
    fn permission_granted(&self) -> RepoResult<bool>;
    fn record_permission_granted(&self) -> RepoResult<()>;
}

/// [`NotebookRepository`] on top of any [`KeyValueStore`].
pub struct KvNotebookRepository<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> KvNotebookRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn load_json<T: DeserializeOwned + Default>(&self, key: &'static str) -> RepoResult<T> {
        match self.store.get(key)? {
            Some(raw) => serde_json::from_str(raw.as_str())
                .map_err(|err| RepoError::InvalidData(format!("`{key}`: {err}"))),
            None => Ok(T::default()),
        }
    }

    fn save_json<T: Serialize>(&self, key: &'static str, value: &T) -> RepoResult<()> {
        let raw = serde_json::to_string(value)
            .map_err(|source| RepoError::Serialization { key, source })?;
        self.store.set(key, raw.as_str())
    }
}

impl<S: KeyValueStore> NotebookRepository for KvNotebookRepository<S> {
    fn load_notebook(&self) -> RepoResult<Notebook> {
        let notes: NotesData = self.load_json(NOTES_KEY)?;
        let pages: PagesData = self.load_json(PAGES_KEY)?;
        Ok(Notebook::new(notes, pages))
    }

    fn save_notebook(&self, notebook: &Notebook) -> RepoResult<()> {
        self.save_json(NOTES_KEY, notebook.notes())?;
        self.save_json(PAGES_KEY, notebook.pages())
    }

    fn load_theme(&self) -> RepoResult<Option<Theme>> {
        Ok(self
            .store
            .get(THEME_KEY)?
            .filter(|name| !name.trim().is_empty())
            .map(Theme::new))
    }

    fn save_theme(&self, theme: &Theme) -> RepoResult<()> {
        self.store.set(THEME_KEY, theme.name())
    }

    fn permission_granted(&self) -> RepoResult<bool> {
        Ok(self.store.get(PERMISSION_KEY)?.as_deref() == Some(PERMISSION_GRANTED))
    }

    fn record_permission_granted(&self) -> RepoResult<()> {
        self.store.set(PERMISSION_KEY, PERMISSION_GRANTED)
    }
}
