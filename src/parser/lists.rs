//! List items and the list tree.
//!
//! A list run is recognized as a flat sequence of items tagged with their
//! indentation. The items are then nested by indentation, runs of the other
//! list kind are moved into sub-lists, and the tight/loose flag is unified
//! across each list.

use crate::ast::ListKind;

use super::blocks::{heading, horizontal_rule};
use super::utils::{count_indent_columns, is_blank, is_unindented, remove_indent_columns};

/// The marker line of a list item
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ListStart<'a> {
    pub kind: ListKind,
    /// Columns before the marker
    pub indent: usize,
    /// Column where the item's content starts
    pub end_indent: usize,
    /// Text after the marker and its separating space
    pub content: &'a str,
}

/// Check if a line starts a list item: `+ `, `* `, `- ` or digits followed by `. `
pub(crate) fn list_start(line: &str) -> Option<ListStart<'_>> {
    if horizontal_rule(line).is_some() {
        return None;
    }

    let indent = count_indent_columns(line);
    let trimmed = line.trim_start_matches([' ', '\t']);

    let (kind, marker_len, content) = if let Some(content) = ["+ ", "* ", "- "]
        .iter()
        .find_map(|marker| trimmed.strip_prefix(marker))
    {
        (ListKind::Unordered, 2, content)
    } else {
        let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return None;
        }
        let content = trimmed[digits..].strip_prefix(". ")?;
        (ListKind::Ordered, digits + 2, content)
    };

    // Content indented by 5 or more is an indented code block starting one column in
    let spaces = count_indent_columns(content);
    let end_indent = indent + marker_len + if spaces >= 5 { 1 } else { spaces };

    Some(ListStart {
        kind,
        indent,
        end_indent,
        content,
    })
}

/// One recognized list item, before nesting
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ListItem {
    pub indent: usize,
    pub simple: bool,
    pub kind: ListKind,
    pub lines: Vec<String>,
}

/// Kind and indentation of the first item of a run
#[derive(Debug, Clone, Copy, PartialEq)]
struct Run {
    kind: ListKind,
    indent: usize,
}

impl Run {
    /// A marker of the other kind at or left of the run's first marker
    fn is_broken_by(&self, line: &str) -> bool {
        list_start(line).is_some_and(|start| start.kind != self.kind && start.indent <= self.indent)
    }

    /// A blank line followed by a marker that ends this run
    fn breaks_at(&self, lines: &[&str]) -> bool {
        matches!(lines, [blank, next, ..] if is_blank(blank) && self.is_broken_by(next))
    }
}

/// Lines after the first blank that still belong to an item: everything up to
/// another list marker, an unindented line, two blank lines, or a blank line
/// followed by a marker that ends the run
fn continued_len(next: &[&str], run: Run) -> usize {
    let mut n = 0;
    while n < next.len() {
        let line = next[n];
        if list_start(line).is_some() || is_unindented(line) {
            break;
        }
        if is_blank(line)
            && let Some(following) = next.get(n + 1)
            && (is_blank(following) || run.is_broken_by(following))
        {
            break;
        }
        n += 1;
    }
    n
}

/// Tight/loose classification of an item.
///
/// `next` holds the lines after the item's first paragraph, `rest` the lines
/// after the whole item.
fn is_simple(content: &str, next: &[&str], rest: &[&str], run: Run, prev_simple: bool) -> bool {
    if count_indent_columns(content) >= 4 {
        return false;
    }

    match (next, rest) {
        ([blank, ..], [following, ..]) if is_blank(blank) && list_start(following).is_some() => false,
        ([following, ..], _) if list_start(following).is_some() => true,
        ([], _) => true,
        ([blank], _) if is_blank(blank) => true,
        ([first, second, ..], _) if is_blank(first) && is_blank(second) => true,
        _ if run.breaks_at(next) => true,
        ([following, ..], _) if is_unindented(following) => prev_simple,
        _ => false,
    }
}

/// A single list item at the start of `lines`
fn list_item(lines: &[&str], run: Run, prev_simple: bool) -> Option<(ListItem, usize)> {
    let start = list_start(lines.first()?)?;

    // Lazy continuation of the first paragraph, up to a blank line, marker, rule or heading
    let more_len = lines[1..]
        .iter()
        .take_while(|&&line| {
            !is_blank(line)
                && list_start(line).is_none()
                && horizontal_rule(line).is_none()
                && heading(&[line]).is_none()
        })
        .count();
    let next = &lines[1 + more_len..];
    let continued = continued_len(next, run);
    let rest = &next[continued..];

    let simple = is_simple(start.content, next, rest, run, prev_simple);

    let mut item_lines = vec![start.content.to_string()];
    item_lines.extend(lines[1..=more_len].iter().map(|line| line.trim_start().to_string()));
    item_lines.extend(next[..continued].iter().map(|line| {
        if is_blank(line) {
            String::new()
        } else {
            remove_indent_columns(line, start.end_indent)
        }
    }));

    log::trace!(
        "List item at indent {} ({} lines, simple: {simple})",
        start.indent,
        item_lines.len()
    );

    Some((
        ListItem {
            indent: start.indent,
            simple,
            kind: start.kind,
            lines: item_lines,
        },
        1 + more_len + continued,
    ))
}

/// Consecutive list items starting at the first line, nested and unified.
/// The run ends at the first line that does not start an item.
pub(crate) fn list_run(lines: &[&str]) -> Option<(ListGroup, usize)> {
    let first = list_start(lines.first()?)?;
    let run = Run {
        kind: first.kind,
        indent: first.indent,
    };

    let mut items = Vec::new();
    let mut consumed = 0;
    let mut prev_simple = true;
    while let Some((item, len)) = list_item(&lines[consumed..], run, prev_simple) {
        prev_simple = item.simple;
        items.push(item);
        consumed += len;
    }

    let mut group = nest_kinds(build_tree(items))?;
    unify_simple(&mut group, false);
    Some((group, consumed))
}

/// An item with the items indented under it
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TreeNode {
    pub item: ListItem,
    pub children: Vec<TreeNode>,
}

/// Nest items by indentation: each item becomes a child of the nearest
/// preceding item with a smaller indent
pub(crate) fn build_tree(items: Vec<ListItem>) -> Vec<TreeNode> {
    fn attach(stack: &mut Vec<TreeNode>, roots: &mut Vec<TreeNode>, node: TreeNode) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }

    let mut roots = Vec::new();
    let mut stack: Vec<TreeNode> = Vec::new();

    for item in items {
        while stack.last().is_some_and(|top| top.item.indent >= item.indent) {
            if let Some(done) = stack.pop() {
                attach(&mut stack, &mut roots, done);
            }
        }
        stack.push(TreeNode {
            item,
            children: Vec::new(),
        });
    }
    while let Some(done) = stack.pop() {
        attach(&mut stack, &mut roots, done);
    }

    roots
}

/// Items of a single kind, ready to become a `ListBlock`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ListGroup {
    pub kind: ListKind,
    pub items: Vec<GroupedItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GroupedItem {
    pub simple: bool,
    pub lines: Vec<String>,
    /// Rendered after the item's own content, in order
    pub sublists: Vec<ListGroup>,
}

/// Move each run of siblings whose kind differs from the first sibling's into
/// a sub-list of the sibling before the run
pub(crate) fn nest_kinds(nodes: Vec<TreeNode>) -> Option<ListGroup> {
    fn flush(items: &mut [GroupedItem], pending: &mut Vec<TreeNode>) {
        if pending.is_empty() {
            return;
        }
        if let (Some(last), Some(group)) = (items.last_mut(), nest_kinds(std::mem::take(pending))) {
            last.sublists.push(group);
        }
    }

    let kind = nodes.first()?.item.kind;
    let mut items: Vec<GroupedItem> = Vec::new();
    let mut pending: Vec<TreeNode> = Vec::new();

    for node in nodes {
        if node.item.kind == kind {
            flush(&mut items, &mut pending);
            items.push(GroupedItem {
                simple: node.item.simple,
                lines: node.item.lines,
                sublists: nest_kinds(node.children).into_iter().collect(),
            });
        } else {
            pending.push(node);
        }
    }
    flush(&mut items, &mut pending);

    Some(ListGroup { kind, items })
}

/// One loose item makes its whole list loose, down to every nested list
pub(crate) fn unify_simple(group: &mut ListGroup, force_loose: bool) {
    let loose = force_loose || group.items.iter().any(|item| !item.simple);
    for item in &mut group.items {
        if loose {
            item.simple = false;
        }
        for sublist in &mut item.sublists {
            unify_simple(sublist, loose);
        }
    }
}
