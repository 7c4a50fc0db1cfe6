//! Document tree types produced by the parser
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InlineSpan {
    Literal(String),
    HardLineBreak,
    Emphasis(Vec<InlineSpan>),
    Strong(Vec<InlineSpan>),
    InlineCode(String),
    DirectLink {
        children: Vec<InlineSpan>,
        url: String,
        title: Option<String>,
    },
    IndirectLink {
        children: Vec<InlineSpan>,
        original: String, // Source text, used when the key is not defined
        key: String,
    },
    DirectImage {
        alt: String,
        url: String,
        title: Option<String>,
    },
    IndirectImage {
        alt: String,
        original: String,
        key: String,
    },
    LatexInlineMath(String),
    LatexDisplayMath(String),
}

impl InlineSpan {
    /// Visible text of the span with all markup removed
    pub fn plain_text(&self) -> String {
        match self {
            InlineSpan::Literal(text)
            | InlineSpan::InlineCode(text)
            | InlineSpan::LatexInlineMath(text)
            | InlineSpan::LatexDisplayMath(text) => text.clone(),
            InlineSpan::HardLineBreak => "\n".to_string(),
            InlineSpan::Emphasis(children)
            | InlineSpan::Strong(children)
            | InlineSpan::DirectLink { children, .. }
            | InlineSpan::IndirectLink { children, .. } => plain_text(children),
            InlineSpan::DirectImage { alt, .. } | InlineSpan::IndirectImage { alt, .. } => {
                alt.clone()
            }
        }
    }
}

/// Concatenated visible text of a span sequence
pub fn plain_text(spans: &[InlineSpan]) -> String {
    spans.iter().map(InlineSpan::plain_text).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListKind {
    Ordered,
    Unordered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Default,
    Left,
    Right,
    Center,
}

/// A table cell holds block content (usually a single paragraph)
pub type TableCell = Vec<BlockParagraph>;
pub type TableRow = Vec<TableCell>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockParagraph {
    Heading {
        level: u8,
        children: Vec<InlineSpan>,
    },
    Paragraph(Vec<InlineSpan>),
    /// Tight content of a simple list item, rendered without a paragraph wrapper
    Span(Vec<InlineSpan>),
    CodeBlock {
        lines: Vec<String>,
        language: String,
        ignored: String, // Info string after the language tag
    },
    QuotedBlock(Vec<BlockParagraph>),
    ListBlock {
        kind: ListKind,
        items: Vec<Vec<BlockParagraph>>,
    },
    HorizontalRule(char),
    TableBlock {
        header: Option<TableRow>,
        alignments: Vec<Alignment>,
        rows: Vec<TableRow>,
    },
    LatexBlock(Vec<String>),
    InlineBlock(String), // Raw HTML (passed through unchanged)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDefinition {
    pub url: String,
    pub title: Option<String>,
}

/// Link reference definitions: key -> (url, title). Keys are case-sensitive.
pub type LinkTable = BTreeMap<String, LinkDefinition>;

/// Result of a top-level parse: the blocks plus the links needed to resolve them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub blocks: Vec<BlockParagraph>,
    pub links: LinkTable,
}

impl Document {
    /// Look up the definition an indirect link or image refers to
    pub fn resolve(&self, key: &str) -> Option<&LinkDefinition> {
        self.links.get(key)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
