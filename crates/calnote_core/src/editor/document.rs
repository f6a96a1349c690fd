//! Rich-text document tree.
//!
//! # Responsibility
//! - Represent one page's HTML as a tree of text and elements.
//! - Parse HTML fragments and serialize them back.
//! - Address content by character offsets into the document text.
//!
//! # Invariants
//! - Offsets count Unicode scalar values of `text_content()`.
//! - Void elements (`br`, `img`, ...) contribute no text and have no children.
//! - `normalize()` leaves no empty or adjacent text nodes.

use scraper::{ElementRef, Html};

/// Inline style applied by a mark element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MarkKind {
    Bold,
    Italic,
    Underline,
    Highlight,
}

impl MarkKind {
    /// Tag emitted when this mark is applied.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Bold => "b",
            Self::Italic => "i",
            Self::Underline => "u",
            Self::Highlight => "mark",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "b" | "strong" => Some(Self::Bold),
            "i" | "em" => Some(Self::Italic),
            "u" => Some(Self::Underline),
            "mark" => Some(Self::Highlight),
            _ => None,
        }
    }
}

/// Inline style attribute of a new highlight marker.
pub const HIGHLIGHT_STYLE: &str = "background-color: #ffeb3b; padding: 2px 0;";

const VOID_ELEMENTS: &[&str] = &[
    "area", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// Elements that start their own line; inline formatting never wraps them.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Set of marks active on a piece of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkSet {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub highlight: bool,
}

impl MarkSet {
    pub fn contains(&self, kind: MarkKind) -> bool {
        match kind {
            MarkKind::Bold => self.bold,
            MarkKind::Italic => self.italic,
            MarkKind::Underline => self.underline,
            MarkKind::Highlight => self.highlight,
        }
    }

    pub fn set(&mut self, kind: MarkKind, on: bool) {
        match kind {
            MarkKind::Bold => self.bold = on,
            MarkKind::Italic => self.italic = on,
            MarkKind::Underline => self.underline = on,
            MarkKind::Highlight => self.highlight = on,
        }
    }

    pub fn union(self, other: MarkSet) -> MarkSet {
        MarkSet {
            bold: self.bold || other.bold,
            italic: self.italic || other.italic,
            underline: self.underline || other.underline,
            highlight: self.highlight || other.highlight,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == MarkSet::default()
    }
}

/// Element node with ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<DocNode>,
}

impl Element {
    pub fn new(tag: impl Into<String>, children: Vec<DocNode>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attrs: Vec::new(),
            children,
        }
    }

    /// New wrapper for `kind`; highlights carry the fixed marker style.
    pub fn mark(kind: MarkKind, children: Vec<DocNode>) -> Self {
        let mut element = Self::new(kind.tag(), children);
        if kind == MarkKind::Highlight {
            element
                .attrs
                .push(("style".to_string(), HIGHLIGHT_STYLE.to_string()));
        }
        element
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }

    pub fn is_block(&self) -> bool {
        BLOCK_ELEMENTS.contains(&self.tag.as_str())
    }

    /// Mark implied by the tag name alone.
    pub fn tag_mark(&self) -> Option<MarkKind> {
        MarkKind::from_tag(self.tag.as_str())
    }

    /// Marks implied by tag and inline `style` declarations.
    ///
    /// Highlight is only ever recognized from the `mark` tag.
    pub fn marks(&self) -> MarkSet {
        let mut marks = MarkSet::default();
        if let Some(kind) = self.tag_mark() {
            marks.set(kind, true);
        }
        if let Some(style) = self.attr("style") {
            for (property, value) in style_declarations(style) {
                if let Some(kind) = style_mark(property.as_str(), value.as_str()) {
                    marks.set(kind, true);
                }
            }
        }
        marks
    }

    /// Removes style declarations implying `kind`. Returns `true` if any.
    pub fn remove_style_mark(&mut self, kind: MarkKind) -> bool {
        let Some(index) = self.attrs.iter().position(|(key, _)| key == "style") else {
            return false;
        };
        let declarations = style_declarations(self.attrs[index].1.as_str());
        let kept: Vec<_> = declarations
            .iter()
            .filter(|(property, value)| style_mark(property, value) != Some(kind))
            .collect();
        if kept.len() == declarations.len() {
            return false;
        }
        if kept.is_empty() {
            self.attrs.remove(index);
        } else {
            self.attrs[index].1 = kept
                .iter()
                .map(|(property, value)| format!("{property}: {value};"))
                .collect::<Vec<_>>()
                .join(" ");
        }
        true
    }

    fn shell(&self, children: Vec<DocNode>) -> Self {
        Self {
            tag: self.tag.clone(),
            attrs: self.attrs.clone(),
            children,
        }
    }
}

fn style_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim().to_ascii_lowercase();
            if property.is_empty() {
                None
            } else {
                Some((property, value))
            }
        })
        .collect()
}

fn style_mark(property: &str, value: &str) -> Option<MarkKind> {
    match property {
        "font-weight" => {
            let heavy = value == "bold"
                || value == "bolder"
                || value.parse::<u32>().is_ok_and(|weight| weight >= 700);
            heavy.then_some(MarkKind::Bold)
        }
        "font-style" => {
            (value == "italic" || value.starts_with("oblique")).then_some(MarkKind::Italic)
        }
        "text-decoration" | "text-decoration-line" => {
            value.contains("underline").then_some(MarkKind::Underline)
        }
        _ => None,
    }
}

/// Document node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocNode {
    Text(String),
    Element(Element),
}

impl DocNode {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Length in characters of this node's text content.
    pub fn text_len(&self) -> usize {
        match self {
            Self::Text(text) => text.chars().count(),
            Self::Element(element) => nodes_text_len(&element.children),
        }
    }

    fn push_text(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(text),
            Self::Element(element) => {
                for child in &element.children {
                    child.push_text(out);
                }
            }
        }
    }

    /// Splits at a character offset strictly inside this node.
    ///
    /// Elements are cloned on both sides so formatting is preserved.
    fn split_at(self, offset: usize) -> (DocNode, DocNode) {
        match self {
            Self::Text(text) => {
                let byte = char_to_byte(&text, offset);
                let (left, right) = text.split_at(byte);
                (Self::Text(left.to_string()), Self::Text(right.to_string()))
            }
            Self::Element(mut element) => {
                let children = std::mem::take(&mut element.children);
                let (left, right) = split_nodes(children, offset);
                (
                    Self::Element(element.shell(left)),
                    Self::Element(Element { children: right, ..element }),
                )
            }
        }
    }
}

/// Text run with the marks applying to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRun {
    pub start: usize,
    pub end: usize,
    pub marks: MarkSet,
}

/// One page's rich-text content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichDocument {
    pub(crate) nodes: Vec<DocNode>,
}

impl RichDocument {
    pub fn new(nodes: Vec<DocNode>) -> Self {
        let mut document = Self { nodes };
        document.normalize();
        document
    }

    /// Parses an HTML fragment. Comments and processing instructions are dropped.
    pub fn from_html(html: &str) -> Self {
        if html.is_empty() {
            return Self::default();
        }
        let fragment = Html::parse_fragment(html);
        Self::new(convert_children(fragment.root_element()))
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            write_node(node, &mut out);
        }
        out
    }

    pub fn nodes(&self) -> &[DocNode] {
        &self.nodes
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.push_text(&mut out);
        }
        out
    }

    pub fn text_len(&self) -> usize {
        nodes_text_len(&self.nodes)
    }

    /// Text between two character offsets.
    pub fn slice_text(&self, start: usize, end: usize) -> String {
        self.text_content()
            .chars()
            .skip(start)
            .take(end.saturating_sub(start))
            .collect()
    }

    /// Styled text runs in document order.
    pub fn runs(&self) -> Vec<TextRun> {
        let mut runs = Vec::new();
        let mut pos = 0;
        collect_runs(&self.nodes, MarkSet::default(), &mut pos, &mut runs);
        runs
    }

    /// Marks on the path from the caret to the root.
    ///
    /// The caret reads the character before it, like a browser anchor node;
    /// at the start of the document it reads the first character.
    pub fn marks_at(&self, offset: usize) -> MarkSet {
        let runs = self.runs();
        runs.iter()
            .find(|run| run.start < offset && offset <= run.end)
            .or_else(|| runs.iter().find(|run| run.start >= offset))
            .map(|run| run.marks)
            .unwrap_or_default()
    }

    /// Merges adjacent text, drops empty text and empty mark wrappers, and
    /// merges adjacent identical mark wrappers.
    pub fn normalize(&mut self) {
        let nodes = std::mem::take(&mut self.nodes);
        self.nodes = normalize_nodes(nodes);
    }
}

fn nodes_text_len(nodes: &[DocNode]) -> usize {
    nodes.iter().map(DocNode::text_len).sum()
}

fn char_to_byte(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map_or(text.len(), |(byte, _)| byte)
}

/// Splits a node list at a character offset.
///
/// Zero-length nodes sitting exactly on the offset go to the right side.
pub(crate) fn split_nodes(nodes: Vec<DocNode>, at: usize) -> (Vec<DocNode>, Vec<DocNode>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut pos = 0;
    for node in nodes {
        let len = node.text_len();
        if len == 0 {
            if pos < at {
                left.push(node);
            } else {
                right.push(node);
            }
        } else if pos + len <= at {
            left.push(node);
        } else if pos >= at {
            right.push(node);
        } else {
            let (head, tail) = node.split_at(at - pos);
            left.push(head);
            right.push(tail);
        }
        pos += len;
    }
    (left, right)
}

/// Applies `edit` to the nodes covering `[start, end)`.
///
/// Descends into the innermost element that fully contains the range and
/// satisfies `descend`; the range is cut out of that element's children.
pub(crate) fn edit_range(
    nodes: Vec<DocNode>,
    start: usize,
    end: usize,
    descend: &dyn Fn(&Element) -> bool,
    edit: impl FnOnce(Vec<DocNode>) -> Vec<DocNode>,
) -> Vec<DocNode> {
    let mut pos = 0;
    let mut container = None;
    for (index, node) in nodes.iter().enumerate() {
        let len = node.text_len();
        if let DocNode::Element(element) = node {
            if len > 0
                && pos <= start
                && end <= pos + len
                && !element.is_void()
                && descend(element)
            {
                container = Some((index, pos));
                break;
            }
        }
        pos += len;
    }

    if let Some((index, offset)) = container {
        let mut nodes = nodes;
        if let DocNode::Element(element) = &mut nodes[index] {
            let children = std::mem::take(&mut element.children);
            element.children = edit_range(children, start - offset, end - offset, descend, edit);
        }
        return nodes;
    }

    let (before, rest) = split_nodes(nodes, start);
    let (middle, after) = split_nodes(rest, end - start);
    let mut out = before;
    out.extend(edit(middle));
    out.extend(after);
    out
}

fn collect_runs(nodes: &[DocNode], inherited: MarkSet, pos: &mut usize, out: &mut Vec<TextRun>) {
    for node in nodes {
        match node {
            DocNode::Text(text) => {
                let len = text.chars().count();
                if len > 0 {
                    out.push(TextRun {
                        start: *pos,
                        end: *pos + len,
                        marks: inherited,
                    });
                }
                *pos += len;
            }
            DocNode::Element(element) => {
                collect_runs(&element.children, inherited.union(element.marks()), pos, out);
            }
        }
    }
}

fn normalize_nodes(nodes: Vec<DocNode>) -> Vec<DocNode> {
    let mut out: Vec<DocNode> = Vec::with_capacity(nodes.len());
    for node in nodes {
        let node = match node {
            DocNode::Text(text) if text.is_empty() => continue,
            DocNode::Element(mut element) => {
                element.children = normalize_nodes(std::mem::take(&mut element.children));
                if element.tag_mark().is_some() && element.children.is_empty() {
                    continue;
                }
                DocNode::Element(element)
            }
            text => text,
        };

        let mergeable = match (out.last(), &node) {
            (Some(DocNode::Text(_)), DocNode::Text(_)) => true,
            (Some(DocNode::Element(previous)), DocNode::Element(element)) => {
                previous.tag_mark().is_some()
                    && previous.tag == element.tag
                    && previous.attrs == element.attrs
            }
            _ => false,
        };
        if !mergeable {
            out.push(node);
            continue;
        }

        match (out.last_mut(), node) {
            (Some(DocNode::Text(previous)), DocNode::Text(text)) => previous.push_str(&text),
            (Some(DocNode::Element(previous)), DocNode::Element(element)) => {
                let mut merged = std::mem::take(&mut previous.children);
                merged.extend(element.children);
                previous.children = normalize_nodes(merged);
            }
            _ => {}
        }
    }
    out
}

fn convert_children(parent: ElementRef<'_>) -> Vec<DocNode> {
    let mut nodes = Vec::new();
    for child in parent.children() {
        if let Some(element) = ElementRef::wrap(child) {
            let value = element.value();
            let mut converted = Element::new(value.name(), Vec::new());
            converted.attrs = value
                .attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect();
            if !converted.is_void() {
                converted.children = convert_children(element);
            }
            nodes.push(DocNode::Element(converted));
        } else if let Some(text) = child.value().as_text() {
            nodes.push(DocNode::text(&**text));
        }
    }
    nodes
}

fn write_node(node: &DocNode, out: &mut String) {
    match node {
        DocNode::Text(text) => escape_into(text, false, out),
        DocNode::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_into(value, true, out);
                out.push('"');
            }
            out.push('>');
            if element.is_void() {
                return;
            }
            for child in &element.children {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
    }
}

fn escape_into(value: &str, attribute: bool, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
}
