//! A Markdown parser producing a serializable document tree
pub mod ast;
pub mod error;
pub mod options;
pub mod parser;

pub use ast::{
    Alignment, BlockParagraph, Document, InlineSpan, LinkDefinition, LinkTable, ListKind,
    TableCell, TableRow, plain_text,
};
pub use error::{ParseError, Result};
pub use options::ParserOptions;
pub use parser::{Parser, parse_spans};

/// Parse a document already split into lines
pub fn parse_lines(lines: &[&str], options: &ParserOptions) -> Result<Document> {
    Parser::new(options).parse(lines)
}

/// Split `text` on `\n` or `\r\n` and parse the lines
pub fn parse_str(text: &str, options: &ParserOptions) -> Result<Document> {
    let lines: Vec<&str> = text.lines().collect();
    parse_lines(&lines, options)
}
