//! Rich-text note editor.

pub mod document;
pub mod format;
pub mod session;

pub use document::{DocNode, Element, MarkKind, MarkSet, RichDocument, HIGHLIGHT_STYLE};
pub use format::{FormatError, HighlightChange, TextRange};
pub use session::{EditorSession, FormatCommand, ToolbarState};
