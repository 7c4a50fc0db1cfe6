//! Block paragraph driver: tries each block recognizer in priority order and
//! recurses into quotes, list items and table cells
mod blocks;
mod inline;
mod lists;
mod tables;
mod utils;

pub use inline::parse_spans;

use crate::ast::{BlockParagraph, Document, LinkDefinition, LinkTable, TableRow};
use crate::error::{ParseError, Result};
use crate::options::ParserOptions;

use blocks::{
    blockquote, fenced_code_block, heading, horizontal_rule, html_block, indented_code_block,
    latex_block, link_definition, paragraph_lines,
};
use lists::{ListGroup, list_run};
use tables::{RawRow, RawTable, grid_table, pipe_table};
use utils::is_blank;

/// State shared by every nested parse of one document
#[derive(Debug, Clone, Default)]
struct ParsingContext {
    newline: String,
    links: LinkTable,
}

pub struct Parser {
    context: ParsingContext,
}

impl Parser {
    pub fn new(options: &ParserOptions) -> Self {
        Parser {
            context: ParsingContext {
                newline: options.newline.clone(),
                links: LinkTable::new(),
            },
        }
    }

    /// Parse a whole document. The parser is consumed since its link table
    /// belongs to the returned document.
    pub fn parse(mut self, lines: &[&str]) -> Result<Document> {
        let blocks = self.parse_blocks(lines)?;
        log::debug!(
            "Parsed document: {} blocks, {} link definitions",
            blocks.len(),
            self.context.links.len()
        );
        Ok(Document {
            blocks,
            links: self.context.links,
        })
    }

    fn parse_owned(&mut self, lines: &[String]) -> Result<Vec<BlockParagraph>> {
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        self.parse_blocks(&lines)
    }

    /// Parse a sequence of lines into blocks, registering link definitions
    /// along the way
    pub fn parse_blocks(&mut self, lines: &[&str]) -> Result<Vec<BlockParagraph>> {
        let mut blocks = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            let rest = &lines[i..];

            // Blank lines only separate blocks
            if is_blank(line) {
                i += 1;
                continue;
            }

            // Link definitions produce no block
            if let Some((key, url, title)) = link_definition(line) {
                self.define_link(key, url, title);
                i += 1;
                continue;
            }

            // Code blocks
            if let Some((code, consumed)) =
                indented_code_block(rest).or_else(|| fenced_code_block(rest))
            {
                log::debug!("Parsed code block at line {} ({} lines)", i + 1, consumed);
                blocks.push(code);
                i += consumed;
                continue;
            }

            // Blockquote, parsed as a nested document
            if let Some((body, consumed)) = blockquote(rest) {
                log::debug!("Parsed blockquote at line {} ({} lines)", i + 1, consumed);
                let children = self.parse_owned(&body)?;
                blocks.push(BlockParagraph::QuotedBlock(children));
                i += consumed;
                continue;
            }

            // Tables: grid first, since a grid line also splits as a pipe row
            if let Some((table, consumed)) = grid_table(rest).or_else(|| pipe_table(rest)) {
                log::debug!("Parsed table at line {} ({} lines)", i + 1, consumed);
                blocks.push(self.format_table(table)?);
                i += consumed;
                continue;
            }

            if let Some(rule_char) = horizontal_rule(line) {
                blocks.push(BlockParagraph::HorizontalRule(rule_char));
                i += 1;
                continue;
            }

            if let Some((body, consumed)) = latex_block(rest) {
                log::debug!("Parsed LaTeX block at line {} ({} lines)", i + 1, consumed);
                blocks.push(BlockParagraph::LatexBlock(body));
                i += consumed;
                continue;
            }

            if let Some((group, consumed)) = list_run(rest) {
                log::debug!(
                    "Parsed list at line {} ({} items, {} lines)",
                    i + 1,
                    group.items.len(),
                    consumed
                );
                blocks.push(self.format_list(group)?);
                i += consumed;
                continue;
            }

            if let Some((level, text, consumed)) = heading(rest) {
                blocks.push(BlockParagraph::Heading {
                    level,
                    children: parse_spans(&text),
                });
                i += consumed;
                continue;
            }

            if let Some(consumed) = html_block(rest) {
                log::debug!("Parsed HTML block at line {} ({} lines)", i + 1, consumed);
                blocks.push(BlockParagraph::InlineBlock(
                    rest[..consumed].join(self.context.newline.as_str()),
                ));
                i += consumed;
                continue;
            }

            match paragraph_lines(rest) {
                0 => return Err(ParseError::malformed(i + 1, rest)),
                consumed => {
                    let text = rest[..consumed]
                        .iter()
                        .map(|line| line.trim_start())
                        .collect::<Vec<_>>()
                        .join(self.context.newline.as_str());
                    blocks.push(BlockParagraph::Paragraph(parse_spans(&text)));
                    i += consumed;
                }
            }
        }

        Ok(blocks)
    }

    /// Register a link definition; the first definition of a key wins
    fn define_link(&mut self, key: String, url: String, title: Option<String>) {
        if self.context.links.contains_key(&key) {
            log::debug!("Ignoring duplicate link definition [{}]", key);
            return;
        }
        log::debug!("Defined link [{}] -> {}", key, url);
        self.context.links.insert(key, LinkDefinition { url, title });
    }

    fn format_table(&mut self, table: RawTable) -> Result<BlockParagraph> {
        let header = match table.header {
            Some(row) => Some(self.format_row(row)?),
            None => None,
        };
        let rows = table
            .rows
            .into_iter()
            .map(|row| self.format_row(row))
            .collect::<Result<Vec<_>>>()?;

        Ok(BlockParagraph::TableBlock {
            header,
            alignments: table.alignments,
            rows,
        })
    }

    /// Each cell is parsed as a nested document
    fn format_row(&mut self, row: RawRow) -> Result<TableRow> {
        row.iter().map(|cell| self.parse_owned(cell)).collect()
    }

    /// Simple items become a single `Span`, the others a nested document.
    /// Sub-lists follow the item's own content.
    fn format_list(&mut self, group: ListGroup) -> Result<BlockParagraph> {
        let mut items = Vec::with_capacity(group.items.len());

        for item in group.items {
            let mut content = if item.simple {
                vec![BlockParagraph::Span(parse_spans(
                    &item.lines.join(self.context.newline.as_str()),
                ))]
            } else {
                self.parse_owned(&item.lines)?
            };
            for sublist in item.sublists {
                content.push(self.format_list(sublist)?);
            }
            items.push(content);
        }

        Ok(BlockParagraph::ListBlock {
            kind: group.kind,
            items,
        })
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(&ParserOptions::default())
    }
}
