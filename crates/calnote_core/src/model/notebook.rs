//! Per-date pages and saved note content.
//!
//! # Responsibility
//! - Hold the two persisted maps: saved HTML per page index (`NotesData`)
//!   and ordered named pages (`PagesData`).
//! - Apply page add/rename/delete while keeping both maps aligned.
//!
//! # Invariants
//! - Every opened date has at least one page.
//! - Indices in `notes[key]` always address a page in `pages[key]`.
//! - Deleting page `i` shifts saved content above `i` down by one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Saved HTML per page index for one date. Sparse: only saved pages appear.
pub type PageContents = BTreeMap<usize, String>;
/// Saved content keyed by date key.
pub type NotesData = BTreeMap<String, PageContents>;
/// Ordered pages keyed by date key.
pub type PagesData = BTreeMap<String, Vec<Page>>;

/// Name used when a rename input is blank.
pub const RENAME_FALLBACK_NAME: &str = "Page";

/// One named page attached to a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub name: String,
    /// Mirror of the last saved HTML for this page.
    #[serde(default)]
    pub content: String,
}

impl Page {
    /// Default page for 1-based position `number`.
    pub fn numbered(number: usize) -> Self {
        Self {
            name: format!("Page {number}"),
            content: String::new(),
        }
    }
}

/// Page-level rule violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// The date has never been opened.
    DateNotOpen(String),
    /// Index does not address an existing page.
    PageOutOfRange {
        date_key: String,
        index: usize,
        len: usize,
    },
}

impl Display for PageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DateNotOpen(key) => write!(f, "date `{key}` has no pages"),
            Self::PageOutOfRange {
                date_key,
                index,
                len,
            } => write!(
                f,
                "page index {index} out of range for `{date_key}` ({len} pages)"
            ),
        }
    }
}

impl Error for PageError {}

/// In-memory notebook state for all dates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notebook {
    notes: NotesData,
    pages: PagesData,
}

impl Notebook {
    pub fn new(notes: NotesData, pages: PagesData) -> Self {
        Self { notes, pages }
    }

    pub fn notes(&self) -> &NotesData {
        &self.notes
    }

    pub fn pages(&self) -> &PagesData {
        &self.pages
    }

    /// Creates `[Page 1]` and an empty content map if the date is new.
    ///
    /// Returns `true` when anything was created.
    pub fn ensure_date(&mut self, key: &str) -> bool {
        let mut created = false;
        if !self.pages.contains_key(key) {
            self.pages.insert(key.to_string(), vec![Page::numbered(1)]);
            created = true;
        }
        if !self.notes.contains_key(key) {
            self.notes.insert(key.to_string(), PageContents::new());
            created = true;
        }
        created
    }

    pub fn pages_for(&self, key: &str) -> Result<&[Page], PageError> {
        self.pages
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| PageError::DateNotOpen(key.to_string()))
    }

    /// True when at least one page of the date has saved content.
    pub fn has_note(&self, key: &str) -> bool {
        self.notes.get(key).is_some_and(|pages| !pages.is_empty())
    }

    /// Saved HTML of a page, or `""` when never saved.
    pub fn page_content(&self, key: &str, index: usize) -> Result<&str, PageError> {
        self.check_index(key, index)?;
        Ok(self
            .notes
            .get(key)
            .and_then(|pages| pages.get(&index))
            .map_or("", String::as_str))
    }

    /// Appends `Page N` (N = count + 1) and returns its index.
    pub fn add_page(&mut self, key: &str) -> Result<usize, PageError> {
        let pages = self.pages_mut(key)?;
        pages.push(Page::numbered(pages.len() + 1));
        Ok(pages.len() - 1)
    }

    /// Renames a page; blank input becomes [`RENAME_FALLBACK_NAME`].
    pub fn rename_page(&mut self, key: &str, index: usize, name: &str) -> Result<&str, PageError> {
        self.check_index(key, index)?;
        let page = &mut self.pages_mut(key)?[index];
        page.name = if name.is_empty() {
            RENAME_FALLBACK_NAME.to_string()
        } else {
            name.to_string()
        };
        Ok(page.name.as_str())
    }

    /// Deletes page `index`, renumbering saved content above it.
    ///
    /// Returns `false` without changes when it is the only page.
    pub fn delete_page(&mut self, key: &str, index: usize) -> Result<bool, PageError> {
        self.check_index(key, index)?;
        let pages = self.pages_mut(key)?;
        if pages.len() <= 1 {
            return Ok(false);
        }
        pages.remove(index);

        if let Some(contents) = self.notes.get_mut(key) {
            let shifted = std::mem::take(contents)
                .into_iter()
                .filter(|(page_index, _)| *page_index != index)
                .map(|(page_index, html)| {
                    if page_index > index {
                        (page_index - 1, html)
                    } else {
                        (page_index, html)
                    }
                })
                .collect();
            *contents = shifted;
        }
        Ok(true)
    }

    /// Stores HTML for a page in both maps.
    pub fn save_content(&mut self, key: &str, index: usize, html: &str) -> Result<(), PageError> {
        self.check_index(key, index)?;
        self.pages_mut(key)?[index].content = html.to_string();
        self.notes
            .entry(key.to_string())
            .or_default()
            .insert(index, html.to_string());
        Ok(())
    }

    fn pages_mut(&mut self, key: &str) -> Result<&mut Vec<Page>, PageError> {
        self.pages
            .get_mut(key)
            .ok_or_else(|| PageError::DateNotOpen(key.to_string()))
    }

    fn check_index(&self, key: &str, index: usize) -> Result<(), PageError> {
        let len = self.pages_for(key)?.len();
        if index >= len {
            return Err(PageError::PageOutOfRange {
                date_key: key.to_string(),
                index,
                len,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Notebook, Page, PageError};

    const KEY: &str = "2024-0-15";

    fn notebook_with_pages(count: usize) -> Notebook {
        let mut notebook = Notebook::default();
        notebook.ensure_date(KEY);
        for _ in 1..count {
            notebook.add_page(KEY).expect("add page");
        }
        notebook
    }

    #[test]
    fn ensure_date_seeds_page_one_once() {
        let mut notebook = Notebook::default();
        assert!(notebook.ensure_date(KEY));
        assert!(!notebook.ensure_date(KEY));
        assert_eq!(notebook.pages_for(KEY).unwrap(), &[Page::numbered(1)]);
        assert!(notebook.notes()[KEY].is_empty());
        assert!(!notebook.has_note(KEY));
    }

    #[test]
    fn add_page_numbers_by_count_not_by_history() {
        let mut notebook = notebook_with_pages(3);
        notebook.rename_page(KEY, 2, "Groceries").unwrap();
        notebook.delete_page(KEY, 0).unwrap();
        let index = notebook.add_page(KEY).unwrap();
        let names: Vec<_> = notebook
            .pages_for(KEY)
            .unwrap()
            .iter()
            .map(|page| page.name.as_str())
            .collect();
        assert_eq!(index, 2);
        assert_eq!(names, vec!["Page 2", "Groceries", "Page 3"]);
    }

    #[test]
    fn rename_falls_back_on_empty_input() {
        let mut notebook = notebook_with_pages(1);
        assert_eq!(notebook.rename_page(KEY, 0, "").unwrap(), "Page");
        assert_eq!(notebook.rename_page(KEY, 0, "Work").unwrap(), "Work");
    }

    #[test]
    fn delete_refuses_last_page() {
        let mut notebook = notebook_with_pages(1);
        assert!(!notebook.delete_page(KEY, 0).unwrap());
        assert_eq!(notebook.pages_for(KEY).unwrap().len(), 1);
    }

    #[test]
    fn delete_renumbers_sparse_contents() {
        for removed in 0..4 {
            let mut notebook = notebook_with_pages(4);
            for index in [0usize, 1, 3] {
                notebook
                    .save_content(KEY, index, &format!("content {index}"))
                    .unwrap();
            }

            assert!(notebook.delete_page(KEY, removed).unwrap());
            assert_eq!(notebook.pages_for(KEY).unwrap().len(), 3);

            let contents = &notebook.notes()[KEY];
            for original in [0usize, 1, 3] {
                if original == removed {
                    continue;
                }
                let expected_index = if original < removed {
                    original
                } else {
                    original - 1
                };
                assert_eq!(
                    contents.get(&expected_index).map(String::as_str),
                    Some(format!("content {original}").as_str())
                );
            }
            assert!(contents.keys().all(|index| *index < 3));
        }
    }

    #[test]
    fn page_content_defaults_to_empty_and_rejects_bad_index() {
        let mut notebook = notebook_with_pages(2);
        notebook.save_content(KEY, 1, "<b>hi</b>").unwrap();
        assert_eq!(notebook.page_content(KEY, 0).unwrap(), "");
        assert_eq!(notebook.page_content(KEY, 1).unwrap(), "<b>hi</b>");
        assert_eq!(notebook.pages_for(KEY).unwrap()[1].content, "<b>hi</b>");
        assert!(notebook.has_note(KEY));
        assert!(matches!(
            notebook.page_content(KEY, 2),
            Err(PageError::PageOutOfRange { index: 2, len: 2, .. })
        ));
        assert!(matches!(
            notebook.add_page("2024-0-16"),
            Err(PageError::DateNotOpen(_))
        ));
    }
}
