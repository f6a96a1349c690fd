//! Formatting operations over [`RichDocument`] ranges.
//!
//! # Responsibility
//! - Toggle bold/italic/underline over a range like a browser's inline-style
//!   command: remove when the whole range already has the style, else apply.
//! - Toggle highlight markers and strip all markup from a range.
//!
//! # Invariants
//! - Formatting never changes `text_content()`; only clear-formatting
//!   rewrites structure, and it keeps the same characters.
//! - Highlight and clear-formatting require a non-collapsed range.

use crate::editor::document::{edit_range, split_nodes, DocNode, Element, MarkKind, RichDocument};
use crate::model::advisory::{Advisory, SelectionAction};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Character range `[start, end)` in document text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    /// Builds a range from two endpoints in either order.
    pub fn new(anchor: usize, focus: usize) -> Self {
        Self {
            start: anchor.min(focus),
            end: anchor.max(focus),
        }
    }

    pub fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }
}

/// Outcome of a highlight toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightChange {
    Added,
    Removed,
}

/// Formatting failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Selection is collapsed (or whitespace-only for clear-formatting).
    NoSelection(SelectionAction),
    /// Range is collapsed where a styled span is required.
    EmptyRange,
    /// Range ends past the document text.
    OutOfBounds { end: usize, len: usize },
}

impl FormatError {
    /// User-facing message, when this error is meant for the user.
    pub fn advisory(&self) -> Option<Advisory> {
        match self {
            Self::NoSelection(action) => Some(Advisory::SelectTextFirst(*action)),
            _ => None,
        }
    }
}

impl Display for FormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSelection(action) => {
                write!(f, "{}", Advisory::SelectTextFirst(*action))
            }
            Self::EmptyRange => write!(f, "formatting range is empty"),
            Self::OutOfBounds { end, len } => {
                write!(f, "range end {end} exceeds document length {len}")
            }
        }
    }
}

impl Error for FormatError {}

impl RichDocument {
    /// Toggles `kind` over `range`.
    ///
    /// Highlight unwraps every marker touching the range when one exists,
    /// otherwise wraps the range in a new marker. Other marks follow
    /// inline-style toggling.
    pub fn toggle_mark(&mut self, range: TextRange, kind: MarkKind) -> Result<(), FormatError> {
        if kind == MarkKind::Highlight {
            return self.toggle_highlight(range).map(|_| ());
        }
        self.check_range(range)?;
        if range.is_collapsed() {
            return Err(FormatError::EmptyRange);
        }
        let active = self.mark_covers(range, kind);
        self.set_mark(range, kind, !active)
    }

    /// Forces `kind` on or off over `range`.
    pub fn set_mark(&mut self, range: TextRange, kind: MarkKind, on: bool) -> Result<(), FormatError> {
        self.check_range(range)?;
        if range.is_collapsed() {
            return Ok(());
        }

        let nodes = std::mem::take(&mut self.nodes);
        let mut pos = 0;
        self.nodes = restyle(
            nodes,
            range,
            &mut pos,
            &|element| !element.marks().contains(kind),
            &|inline| {
                let inline = strip_kind(inline, kind);
                if on {
                    vec![DocNode::Element(Element::mark(kind, inline))]
                } else {
                    inline
                }
            },
        );
        self.normalize();
        Ok(())
    }

    /// True when every character in `range` carries `kind`.
    pub fn mark_covers(&self, range: TextRange, kind: MarkKind) -> bool {
        let mut touched = false;
        for run in self.runs() {
            if run.end <= range.start || run.start >= range.end {
                continue;
            }
            touched = true;
            if !run.marks.contains(kind) {
                return false;
            }
        }
        touched
    }

    /// True when a highlight marker overlaps `range` by at least one character.
    pub fn has_highlight(&self, range: TextRange) -> bool {
        let mut pos = 0;
        any_highlight(&self.nodes, range, &mut pos)
    }

    /// Adds or removes highlight markers over a non-collapsed range.
    pub fn toggle_highlight(&mut self, range: TextRange) -> Result<HighlightChange, FormatError> {
        if range.is_collapsed() {
            return Err(FormatError::NoSelection(SelectionAction::Highlight));
        }
        self.check_range(range)?;

        let highlighted = self.has_highlight(range);
        let nodes = std::mem::take(&mut self.nodes);
        let change = if highlighted {
            let mut pos = 0;
            self.nodes = unwrap_highlights(nodes, range, &mut pos);
            HighlightChange::Removed
        } else {
            let mut pos = 0;
            self.nodes = restyle(nodes, range, &mut pos, &|_| true, &|inline| {
                vec![DocNode::Element(Element::mark(MarkKind::Highlight, inline))]
            });
            HighlightChange::Added
        };
        self.normalize();
        Ok(change)
    }

    /// Replaces the range with its plain text and returns the caret after it.
    ///
    /// Each line keeps its block element; only the inline content inside the
    /// range is flattened. Rejects collapsed and whitespace-only selections.
    pub fn strip_marks(&mut self, range: TextRange) -> Result<usize, FormatError> {
        self.check_range(range)?;
        let text = self.slice_text(range.start, range.end);
        if range.is_collapsed() || text.trim().is_empty() {
            return Err(FormatError::NoSelection(SelectionAction::ClearFormatting));
        }

        let caret = range.start + text.chars().count();
        let nodes = std::mem::take(&mut self.nodes);
        let mut pos = 0;
        self.nodes = restyle(
            nodes,
            range,
            &mut pos,
            &|element| element.marks().is_empty(),
            &|inline| vec![DocNode::Text(RichDocument::new(inline).text_content())],
        );
        self.normalize();
        Ok(caret)
    }

    /// Removes the characters in `range`.
    pub fn delete_range(&mut self, range: TextRange) -> Result<(), FormatError> {
        self.check_range(range)?;
        if range.is_collapsed() {
            return Ok(());
        }
        let nodes = std::mem::take(&mut self.nodes);
        self.nodes = edit_range(nodes, range.start, range.end, &|element| !element.is_void(), |_| {
            Vec::new()
        });
        self.normalize();
        Ok(())
    }

    /// Inserts plain text at `offset`, inheriting formatting from the
    /// character before it.
    pub fn insert_text(&mut self, offset: usize, text: &str) -> Result<(), FormatError> {
        self.check_range(TextRange::caret(offset))?;
        if text.is_empty() {
            return Ok(());
        }
        let mut pos = 0;
        if offset == 0 || !insert_after_char(&mut self.nodes, offset, text, &mut pos) {
            let nodes = std::mem::take(&mut self.nodes);
            let (mut before, after) = split_nodes(nodes, offset);
            before.push(DocNode::text(text));
            before.extend(after);
            self.nodes = before;
        }
        self.normalize();
        Ok(())
    }

    fn check_range(&self, range: TextRange) -> Result<(), FormatError> {
        let len = self.text_len();
        if range.end > len {
            return Err(FormatError::OutOfBounds {
                end: range.end,
                len,
            });
        }
        Ok(())
    }
}

fn overlaps(start: usize, end: usize, range: TextRange) -> bool {
    start.max(range.start) < end.min(range.end)
}

fn any_highlight(nodes: &[DocNode], range: TextRange, pos: &mut usize) -> bool {
    for node in nodes {
        let start = *pos;
        match node {
            DocNode::Text(_) => *pos += node.text_len(),
            DocNode::Element(element) => {
                if element.tag_mark() == Some(MarkKind::Highlight)
                    && overlaps(start, start + node.text_len(), range)
                {
                    return true;
                }
                if any_highlight(&element.children, range, pos) {
                    return true;
                }
            }
        }
    }
    false
}

fn unwrap_highlights(nodes: Vec<DocNode>, range: TextRange, pos: &mut usize) -> Vec<DocNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        let start = *pos;
        let len = node.text_len();
        match node {
            DocNode::Element(mut element) => {
                let children = std::mem::take(&mut element.children);
                let children = unwrap_highlights(children, range, pos);
                if element.tag_mark() == Some(MarkKind::Highlight) && overlaps(start, start + len, range)
                {
                    out.extend(children);
                } else {
                    element.children = children;
                    out.push(DocNode::Element(element));
                }
            }
            text => {
                *pos += len;
                out.push(text);
            }
        }
    }
    out
}

/// Rewrites the inline content inside `range` with `apply`.
///
/// Block elements are never cut or wrapped: the walk descends into them and
/// `apply` runs once per stretch of inline nodes. Other elements fully
/// containing the range are entered when `descend` allows, otherwise they are
/// split at the range edges and their overlapping part joins the stretch.
fn restyle(
    nodes: Vec<DocNode>,
    range: TextRange,
    pos: &mut usize,
    descend: &dyn Fn(&Element) -> bool,
    apply: &dyn Fn(Vec<DocNode>) -> Vec<DocNode>,
) -> Vec<DocNode> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut stretch = Vec::new();
    for node in nodes {
        let start = *pos;
        let len = node.text_len();
        let end = start + len;

        if len == 0 {
            let inside = range.start < start && start < range.end;
            if inside && !matches!(&node, DocNode::Element(element) if element.is_block()) {
                stretch.push(node);
            } else {
                flush(&mut stretch, &mut out, apply);
                out.push(node);
            }
            continue;
        }
        if end <= range.start || start >= range.end {
            flush(&mut stretch, &mut out, apply);
            out.push(node);
            *pos = end;
            continue;
        }

        let enter = match &node {
            DocNode::Element(element) => {
                element.is_block()
                    || (start <= range.start
                        && range.end <= end
                        && !element.is_void()
                        && descend(element))
            }
            DocNode::Text(_) => false,
        };
        match node {
            DocNode::Element(mut element) if enter => {
                flush(&mut stretch, &mut out, apply);
                let children = std::mem::take(&mut element.children);
                element.children = restyle(children, range, pos, descend, apply);
                out.push(DocNode::Element(element));
            }
            node if range.start <= start && end <= range.end => {
                stretch.push(node);
                *pos = end;
            }
            node => {
                let (before, rest) = split_nodes(vec![node], range.start.saturating_sub(start));
                let inside = range.end.min(end) - range.start.max(start);
                let (middle, after) = split_nodes(rest, inside);
                out.extend(before);
                stretch.extend(middle);
                if !after.is_empty() {
                    flush(&mut stretch, &mut out, apply);
                    out.extend(after);
                }
                *pos = end;
            }
        }
    }
    flush(&mut stretch, &mut out, apply);
    out
}

fn flush(
    stretch: &mut Vec<DocNode>,
    out: &mut Vec<DocNode>,
    apply: &dyn Fn(Vec<DocNode>) -> Vec<DocNode>,
) {
    if !stretch.is_empty() {
        out.extend(apply(std::mem::take(stretch)));
    }
}

/// Removes `kind` from every node: unwraps tag marks, drops style declarations.
fn strip_kind(nodes: Vec<DocNode>, kind: MarkKind) -> Vec<DocNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            DocNode::Element(mut element) => {
                let children = strip_kind(std::mem::take(&mut element.children), kind);
                if element.tag_mark() == Some(kind) {
                    out.extend(children);
                } else {
                    element.remove_style_mark(kind);
                    element.children = children;
                    out.push(DocNode::Element(element));
                }
            }
            text => out.push(text),
        }
    }
    out
}

fn insert_after_char(nodes: &mut [DocNode], offset: usize, text: &str, pos: &mut usize) -> bool {
    for node in nodes.iter_mut() {
        let start = *pos;
        let len = node.text_len();
        if start < offset && offset <= start + len {
            match node {
                DocNode::Text(existing) => {
                    let byte = existing
                        .char_indices()
                        .nth(offset - start)
                        .map_or(existing.len(), |(byte, _)| byte);
                    existing.insert_str(byte, text);
                    return true;
                }
                DocNode::Element(element) if !element.is_void() => {
                    return insert_after_char(&mut element.children, offset, text, pos);
                }
                DocNode::Element(_) => return false,
            }
        }
        *pos += len;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::{FormatError, HighlightChange, TextRange};
    use crate::editor::document::{MarkKind, RichDocument};
    use crate::model::advisory::SelectionAction;

    fn doc(html: &str) -> RichDocument {
        RichDocument::from_html(html)
    }

    #[test]
    fn bold_toggle_applies_then_removes() {
        let mut document = doc("hello world");
        document.toggle_mark(TextRange::new(0, 5), MarkKind::Bold).unwrap();
        assert_eq!(document.to_html(), "<b>hello</b> world");

        document.toggle_mark(TextRange::new(0, 5), MarkKind::Bold).unwrap();
        assert_eq!(document.to_html(), "hello world");
    }

    #[test]
    fn bold_toggle_on_mixed_range_applies_to_all() {
        let mut document = doc("<b>hel</b>lo world");
        document.toggle_mark(TextRange::new(0, 5), MarkKind::Bold).unwrap();
        assert_eq!(document.to_html(), "<b>hello</b> world");
    }

    #[test]
    fn removing_bold_from_middle_splits_wrapper() {
        let mut document = doc("<b>hello</b>");
        document.toggle_mark(TextRange::new(1, 4), MarkKind::Bold).unwrap();
        assert_eq!(document.to_html(), "<b>h</b>ell<b>o</b>");
    }

    #[test]
    fn removing_style_based_bold_keeps_other_declarations() {
        let mut document = doc(r#"<span style="font-weight: bold; color: red">ab</span>"#);
        document.toggle_mark(TextRange::new(0, 2), MarkKind::Bold).unwrap();
        assert_eq!(document.to_html(), r#"<span style="color: red;">ab</span>"#);
    }

    #[test]
    fn bold_inside_a_line_keeps_the_line() {
        let mut document = doc("<div>hello world</div>");
        document.toggle_mark(TextRange::new(6, 11), MarkKind::Bold).unwrap();
        assert_eq!(document.to_html(), "<div>hello <b>world</b></div>");

        document.toggle_mark(TextRange::new(6, 11), MarkKind::Bold).unwrap();
        assert_eq!(document.to_html(), "<div>hello world</div>");
    }

    #[test]
    fn bold_across_lines_wraps_each_line_separately() {
        let mut document = doc("<div>ab</div><div>cd</div>");
        document.toggle_mark(TextRange::new(1, 3), MarkKind::Bold).unwrap();
        assert_eq!(document.to_html(), "<div>a<b>b</b></div><div><b>c</b>d</div>");
        assert_eq!(document.text_content(), "abcd");
    }

    #[test]
    fn removing_bold_inside_a_line_splits_only_the_wrapper() {
        let mut document = doc("<p><b>hello world</b></p>");
        document.toggle_mark(TextRange::new(6, 11), MarkKind::Bold).unwrap();
        assert_eq!(document.to_html(), "<p><b>hello </b>world</p>");
    }

    #[test]
    fn italic_nests_inside_enclosing_inline_element() {
        let mut document = doc("<u>abcdef</u>");
        document.toggle_mark(TextRange::new(2, 4), MarkKind::Italic).unwrap();
        assert_eq!(document.to_html(), "<u>ab<i>cd</i>ef</u>");
    }

    #[test]
    fn highlight_wraps_inside_common_container() {
        let mut document = doc("<i>abcdef</i>");
        let change = document.toggle_highlight(TextRange::new(1, 3)).unwrap();
        assert_eq!(change, HighlightChange::Added);
        assert_eq!(
            document.to_html(),
            r#"<i>a<mark style="background-color: #ffeb3b; padding: 2px 0;">bc</mark>def</i>"#
        );
    }

    #[test]
    fn highlight_toggle_twice_restores_every_selection() {
        let originals = [
            "one <b>two</b> three",
            "<b>a<i>bc</i>d</b>e",
            "<div>ab<i>c<u>de</u></i></div><div>f<b>gh</b></div>",
            "<div>ab<br>cd</div><p><u>ef</u></p>",
        ];
        for original in originals {
            let len = doc(original).text_len();
            for start in 0..len {
                for end in start + 1..=len {
                    let range = TextRange::new(start, end);
                    let mut document = doc(original);
                    let text = document.text_content();

                    let change = document.toggle_highlight(range).unwrap();
                    assert_eq!(change, HighlightChange::Added, "{original} {start}..{end}");
                    assert!(document.has_highlight(range));
                    assert_eq!(document.text_content(), text);

                    let change = document.toggle_highlight(range).unwrap();
                    assert_eq!(change, HighlightChange::Removed, "{original} {start}..{end}");
                    assert_eq!(document.to_html(), original, "{start}..{end}");
                }
            }
        }
    }

    #[test]
    fn highlight_across_lines_marks_each_line() {
        let mut document = doc("<div>ab</div><div>cd</div>");
        document.toggle_highlight(TextRange::new(1, 3)).unwrap();
        assert_eq!(
            document.to_html(),
            concat!(
                r#"<div>a<mark style="background-color: #ffeb3b; padding: 2px 0;">b</mark></div>"#,
                r#"<div><mark style="background-color: #ffeb3b; padding: 2px 0;">c</mark>d</div>"#,
            )
        );
    }

    #[test]
    fn unhighlight_removes_whole_marker_and_keeps_children() {
        let mut document = doc(r#"x<mark style="s">a<b>b</b>c</mark>y"#);
        document.toggle_highlight(TextRange::new(2, 3)).unwrap();
        assert_eq!(document.to_html(), "xa<b>b</b>cy");
    }

    #[test]
    fn highlight_requires_selection() {
        let mut document = doc("abc");
        assert_eq!(
            document.toggle_highlight(TextRange::caret(1)),
            Err(FormatError::NoSelection(SelectionAction::Highlight))
        );
        assert_eq!(document.to_html(), "abc");
    }

    #[test]
    fn strip_marks_replaces_range_with_plain_text() {
        let mut document = doc(r#"<b>bo<i>ld</i></b> <mark style="s">hi</mark>!"#);
        let caret = document.strip_marks(TextRange::new(2, 7)).unwrap();
        assert_eq!(caret, 7);
        assert_eq!(document.to_html(), "<b>bo</b>ld hi!");
        assert_eq!(document.text_content(), "bold hi!");
    }

    #[test]
    fn strip_marks_across_lines_keeps_each_line() {
        let mut document = doc("<div><b>ab</b></div><div><i>cd</i></div>");
        let caret = document.strip_marks(TextRange::new(1, 3)).unwrap();
        assert_eq!(caret, 3);
        assert_eq!(document.to_html(), "<div><b>a</b>b</div><div>c<i>d</i></div>");
    }

    #[test]
    fn strip_marks_rejects_whitespace_only_selection() {
        let mut document = doc("<b>a</b>   <i>b</i>");
        let err = document.strip_marks(TextRange::new(1, 4)).unwrap_err();
        assert_eq!(err, FormatError::NoSelection(SelectionAction::ClearFormatting));
        assert!(err.advisory().is_some());
        assert_eq!(document.to_html(), "<b>a</b>   <i>b</i>");
    }

    #[test]
    fn out_of_bounds_range_is_rejected() {
        let mut document = doc("abc");
        assert_eq!(
            document.toggle_mark(TextRange::new(1, 9), MarkKind::Italic),
            Err(FormatError::OutOfBounds { end: 9, len: 3 })
        );
    }

    #[test]
    fn insert_text_inherits_formatting_of_previous_character() {
        let mut document = doc("<b>ab</b>cd");
        document.insert_text(2, "X").unwrap();
        assert_eq!(document.to_html(), "<b>abX</b>cd");
        document.insert_text(0, "Y").unwrap();
        assert_eq!(document.to_html(), "Y<b>abX</b>cd");
    }

    #[test]
    fn delete_range_keeps_surrounding_formatting() {
        let mut document = doc("<b>abc</b>def");
        document.delete_range(TextRange::new(2, 4)).unwrap();
        assert_eq!(document.to_html(), "<b>ab</b>ef");
    }
}
