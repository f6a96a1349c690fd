//! Editable region state: one page's document plus selection.
//!
//! # Responsibility
//! - Route toolbar commands to document operations.
//! - Keep pending inline styles for a collapsed caret until text is typed.
//! - Report toolbar active state from the caret's formatting path.
//!
//! # Invariants
//! - The selection always lies within the document text.
//! - Pending styles are dropped on any selection change or page load.
//! - Highlight and clear-formatting are never reported as active.

use crate::editor::document::{MarkKind, RichDocument};
use crate::editor::format::{FormatError, HighlightChange, TextRange};
use crate::model::advisory::Advisory;

/// Toolbar commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatCommand {
    Bold,
    Italic,
    Underline,
    Highlight,
    ClearFormatting,
}

/// Active state of toolbar buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolbarState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl ToolbarState {
    /// One-shot actions have no active state.
    pub fn is_active(&self, command: FormatCommand) -> bool {
        match command {
            FormatCommand::Bold => self.bold,
            FormatCommand::Italic => self.italic,
            FormatCommand::Underline => self.underline,
            FormatCommand::Highlight | FormatCommand::ClearFormatting => false,
        }
    }
}

/// The note editor for one page.
#[derive(Debug, Clone, Default)]
pub struct EditorSession {
    document: RichDocument,
    selection: TextRange,
    pending: Vec<(MarkKind, bool)>,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the content with a page's HTML and puts the caret at the end.
    pub fn load_html(&mut self, html: &str) {
        self.document = RichDocument::from_html(html);
        self.selection = TextRange::caret(self.document.text_len());
        self.pending.clear();
    }

    pub fn html(&self) -> String {
        self.document.to_html()
    }

    pub fn document(&self) -> &RichDocument {
        &self.document
    }

    pub fn selection(&self) -> TextRange {
        self.selection
    }

    /// Moves the selection, clamped to the document text.
    pub fn select(&mut self, anchor: usize, focus: usize) {
        let len = self.document.text_len();
        self.selection = TextRange::new(anchor.min(len), focus.min(len));
        self.pending.clear();
    }

    /// Runs a toolbar command.
    ///
    /// Returns the advisory to show when the command needs a selection.
    pub fn apply(&mut self, command: FormatCommand) -> Result<(), Advisory> {
        let result = match command {
            FormatCommand::Bold => self.toggle_inline(MarkKind::Bold),
            FormatCommand::Italic => self.toggle_inline(MarkKind::Italic),
            FormatCommand::Underline => self.toggle_inline(MarkKind::Underline),
            FormatCommand::Highlight => self.highlight().map(|_| ()),
            FormatCommand::ClearFormatting => self.clear_formatting(),
        };
        match result {
            Ok(()) => Ok(()),
            Err(err) => match err.advisory() {
                Some(advisory) => Err(advisory),
                None => {
                    log::warn!(
                        "event=format_apply module=editor status=error command={:?} error={}",
                        command,
                        err
                    );
                    Ok(())
                }
            },
        }
    }

    /// Toggles bold/italic/underline on the selection, or as a pending style
    /// for the next typed text when the caret is collapsed.
    pub fn toggle_inline(&mut self, kind: MarkKind) -> Result<(), FormatError> {
        if !self.selection.is_collapsed() {
            return self.document.toggle_mark(self.selection, kind);
        }

        let current = self.effective_pending(kind);
        self.pending.retain(|(pending_kind, _)| *pending_kind != kind);
        self.pending.push((kind, !current));
        Ok(())
    }

    /// Toggles a highlight marker on the selection; the caret moves to the end.
    pub fn highlight(&mut self) -> Result<HighlightChange, FormatError> {
        let change = self.document.toggle_highlight(self.selection)?;
        self.selection = TextRange::caret(self.document.text_len());
        self.pending.clear();
        Ok(change)
    }

    /// Replaces the selection with plain text; the caret lands after it.
    pub fn clear_formatting(&mut self) -> Result<(), FormatError> {
        let caret = self.document.strip_marks(self.selection)?;
        self.selection = TextRange::caret(caret);
        self.pending.clear();
        Ok(())
    }

    /// Types text over the selection, applying pending styles.
    pub fn insert_text(&mut self, text: &str) -> Result<(), FormatError> {
        self.document.delete_range(self.selection)?;
        let start = self.selection.start;
        self.document.insert_text(start, text)?;
        let inserted = TextRange::new(start, start + text.chars().count());
        for (kind, on) in std::mem::take(&mut self.pending) {
            self.document.set_mark(inserted, kind, on)?;
        }
        self.selection = TextRange::caret(inserted.end);
        Ok(())
    }

    /// Pending style state for `kind`, falling back to the caret's formatting.
    pub fn effective_pending(&self, kind: MarkKind) -> bool {
        self.pending
            .iter()
            .find(|(pending_kind, _)| *pending_kind == kind)
            .map_or_else(
                || self.document.marks_at(self.selection.start).contains(kind),
                |(_, on)| *on,
            )
    }

    /// Bold/italic/underline state of the caret's formatting path.
    pub fn toolbar_state(&self) -> ToolbarState {
        let marks = self.document.marks_at(self.selection.start);
        ToolbarState {
            bold: marks.bold,
            italic: marks.italic,
            underline: marks.underline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EditorSession, FormatCommand};
    use crate::model::advisory::{Advisory, SelectionAction};

    fn session(html: &str) -> EditorSession {
        let mut session = EditorSession::new();
        session.load_html(html);
        session
    }

    #[test]
    fn load_puts_caret_at_end() {
        let session = session("<b>ab</b>c");
        assert_eq!(session.selection().start, 3);
        assert!(session.selection().is_collapsed());
    }

    #[test]
    fn collapsed_bold_applies_to_next_typed_text() {
        let mut session = session("ab");
        session.apply(FormatCommand::Bold).unwrap();
        assert_eq!(session.html(), "ab");
        session.insert_text("cd").unwrap();
        assert_eq!(session.html(), "ab<b>cd</b>");
        session.insert_text("e").unwrap();
        assert_eq!(session.html(), "ab<b>cde</b>");
    }

    #[test]
    fn collapsed_bold_inside_bold_turns_it_off() {
        let mut session = session("<b>ab</b>");
        session.apply(FormatCommand::Bold).unwrap();
        session.insert_text("c").unwrap();
        assert_eq!(session.html(), "<b>ab</b>c");
    }

    #[test]
    fn pending_style_typed_inside_a_line_stays_on_that_line() {
        let mut session = session("<div>first</div><div>ab</div>");
        session.apply(FormatCommand::Bold).unwrap();
        session.insert_text("c").unwrap();
        assert_eq!(session.html(), "<div>first</div><div>ab<b>c</b></div>");
    }

    #[test]
    fn selection_change_drops_pending_style() {
        let mut session = session("ab");
        session.apply(FormatCommand::Italic).unwrap();
        session.select(1, 1);
        session.insert_text("x").unwrap();
        assert_eq!(session.html(), "axb");
    }

    #[test]
    fn highlight_without_selection_reports_advisory() {
        let mut session = session("abc");
        assert_eq!(
            session.apply(FormatCommand::Highlight),
            Err(Advisory::SelectTextFirst(SelectionAction::Highlight))
        );
        assert_eq!(
            session.apply(FormatCommand::ClearFormatting),
            Err(Advisory::SelectTextFirst(SelectionAction::ClearFormatting))
        );
        assert_eq!(session.html(), "abc");
    }

    #[test]
    fn highlight_moves_caret_to_end() {
        let mut session = session("abcdef");
        session.select(1, 3);
        session.apply(FormatCommand::Highlight).unwrap();
        assert_eq!(session.selection().start, 6);
        assert!(session.html().contains("<mark"));
    }

    #[test]
    fn clear_formatting_places_caret_after_text() {
        let mut session = session("<u>abc</u>def");
        session.select(4, 1);
        session.apply(FormatCommand::ClearFormatting).unwrap();
        assert_eq!(session.html(), "<u>a</u>bcdef");
        assert_eq!(session.selection().start, 4);
    }

    #[test]
    fn toolbar_tracks_caret_path_and_never_marks_one_shot_actions() {
        let mut session = session("<b><i>ab</i></b><mark>cd</mark>");
        session.select(1, 1);
        let state = session.toolbar_state();
        assert!(state.bold && state.italic && !state.underline);

        session.select(4, 4);
        let state = session.toolbar_state();
        assert!(!state.bold);
        assert!(!state.is_active(FormatCommand::Highlight));
        assert!(!state.is_active(FormatCommand::ClearFormatting));
    }
}
