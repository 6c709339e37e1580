use std::fmt;

/// The block-level kind of a segmented element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementKind {
    #[default]
    PlainText,
    /// A stand-alone command element. Never produced by segmentation, kept so
    /// the renderer can reject it explicitly.
    Command,
    Headline,
    BlockQuote,
    UnorderedList,
    OrderedList,
    Image,
    Table,
}

impl ElementKind {
    /// Kinds whose text is a newline-terminated list of body lines.
    pub fn has_line_body(self) -> bool {
        matches!(
            self,
            ElementKind::UnorderedList | ElementKind::OrderedList | ElementKind::Table
        )
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::PlainText => "Text",
            ElementKind::Command => "Command",
            ElementKind::Headline => "Headline",
            ElementKind::BlockQuote => "BlockQuote",
            ElementKind::UnorderedList => "Ul",
            ElementKind::OrderedList => "Ol",
            ElementKind::Image => "Image",
            ElementKind::Table => "Table",
        };
        write!(f, "{}", name)
    }
}

/// Heading level used by the `---` underline marker.
pub const SUBTITLE_LEVEL: i32 = -1;
/// Heading level used by the `===` underline marker.
pub const TITLE_LEVEL: i32 = 0;

/// One segmented unit of the document.
///
/// `text` stays `None` until some content is appended; an element without
/// text is never committed to the document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockElement {
    pub kind: ElementKind,
    pub text: Option<String>,
    /// Meaning depends on `kind`: the heading level for headlines, the
    /// space-separated `(...)` arguments for images and tables.
    pub args: Vec<String>,
    /// Identifier from `![label](...)`; empty for every other kind.
    pub label: String,
    /// 1-based source line the element started on.
    pub line: usize,
}

impl BlockElement {
    pub fn new(line: usize) -> Self {
        BlockElement {
            line,
            ..Default::default()
        }
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Append to the text, creating it if this is the first content.
    pub fn push_text(&mut self, s: &str) {
        self.text.get_or_insert_with(String::new).push_str(s);
    }

    /// Heading level from `args[0]`, if this element carries one.
    pub fn heading_level(&self) -> Option<i32> {
        self.args.first().and_then(|a| a.parse().ok())
    }

    /// Body lines of a list or table.
    ///
    /// Bodies are accumulated newline-terminated, so splitting always leaves
    /// an empty trailing fragment; it is not an item.
    pub fn items(&self) -> Vec<&str> {
        let mut parts: Vec<&str> = self.text().split('\n').collect();
        parts.pop();
        parts
    }
}

impl fmt::Display for BlockElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} #{} T={} A={}",
            self.kind,
            self.line,
            self.text().replace('\n', "\\n"),
            self.args.join(" ")
        )?;
        if !self.label.is_empty() {
            write!(f, " L={}", self.label)?;
        }
        Ok(())
    }
}
