//! Pipe tables and emacs-style grid tables.
//!
//! Recognizers return cells as raw lines; the driver parses each cell as a
//! nested document.

use crate::ast::Alignment;

use super::inline::{code_span_len, math_span_len};
use super::utils::{dedent, is_repeated};

/// Lines of one cell
pub(crate) type RawCell = Vec<String>;
pub(crate) type RawRow = Vec<RawCell>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawTable {
    pub header: Option<RawRow>,
    pub alignments: Vec<Alignment>,
    pub rows: Vec<RawRow>,
}

/// `---`, `:--`, `--:` or `:-:`
fn cell_alignment(cell: &str) -> Option<Alignment> {
    let starts_colon = cell.starts_with(':');
    let ends_colon = cell.len() > 1 && cell.ends_with(':');
    let dashes = &cell[usize::from(starts_colon)..cell.len() - usize::from(ends_colon)];
    if !is_repeated(dashes, '-') {
        return None;
    }

    Some(match (starts_colon, ends_colon) {
        (true, true) => Alignment::Center,
        (true, false) => Alignment::Left,
        (false, true) => Alignment::Right,
        (false, false) => Alignment::Default,
    })
}

/// Split a row on any of `delimiters`, skipping over code and math spans and
/// backslash escapes
fn split_row(line: &str, delimiters: &[char]) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    let mut cells = Vec::new();
    let mut cell_start = 0;
    let mut i = 0;

    while i < chars.len() {
        let rest = &chars[i..];
        if let Some(len) = math_span_len(rest).or_else(|| code_span_len(rest)) {
            i += len;
        } else if delimiters.contains(&chars[i]) {
            cells.push(chars[cell_start..i].iter().collect());
            i += 1;
            cell_start = i;
        } else if chars[i] == '\\' {
            i += 2;
        } else {
            i += 1;
        }
    }
    cells.push(chars[cell_start..i.min(chars.len())].iter().collect());
    cells
}

/// Cells of a pipe table row.
///
/// Empty cells produced by a leading or trailing pipe are dropped when the row
/// would otherwise have more columns than `size` (1 when no size is known yet).
/// With a known size, the row must have exactly that many cells.
fn pipe_row(line: &str, size: Option<usize>, delimiters: &[char]) -> Option<Vec<String>> {
    let parts: Vec<String> = split_row(line, delimiters)
        .iter()
        .map(|part| part.trim().to_string())
        .collect();
    let n = parts.len();
    if n == 1 {
        return None;
    }

    let m = size.unwrap_or(1);
    let first = if parts[0].is_empty() && n > m { 1 } else { 0 };
    let last = if parts[n - 1].is_empty() && n - first > m {
        n - 2
    } else {
        n - 1
    };

    if size.is_some_and(|m| last + 1 - first != m) {
        return None;
    }
    Some(parts[first..=last].to_vec())
}

fn pipe_separator_row(line: &str, size: Option<usize>) -> Option<Vec<Alignment>> {
    pipe_row(line, size, &['|', '+'])?
        .iter()
        .map(|cell| cell_alignment(cell))
        .collect()
}

/// Pipe table, with or without a header row.
/// Rows after the separator must have exactly as many cells as the separator.
pub(crate) fn pipe_table(lines: &[&str]) -> Option<(RawTable, usize)> {
    let first = lines.first()?;

    let (header, alignments, mut consumed) = if let Some(alignments) =
        pipe_separator_row(first, None)
    {
        (None, alignments, 1)
    } else {
        let header = pipe_row(first, None, &['|'])?;
        let alignments = pipe_separator_row(lines.get(1)?, Some(header.len()))?;
        (Some(header), alignments, 2)
    };

    let mut rows = Vec::new();
    while let Some(row) = lines
        .get(consumed)
        .and_then(|line| pipe_row(line, Some(alignments.len()), &['|']))
    {
        rows.push(row);
        consumed += 1;
    }

    let to_raw =
        |row: Vec<String>| -> RawRow { row.into_iter().map(|cell| vec![cell]).collect() };
    Some((
        RawTable {
            header: header.map(to_raw),
            alignments,
            rows: rows.into_iter().map(to_raw).collect(),
        },
        consumed,
    ))
}

/// A grid line: `c` must appear at every column of `grid` (or, for the first
/// line, wherever it appears) and the text between must satisfy `check`.
/// Returns the grid columns and the cell texts.
fn grid_line(
    line: &str,
    grid: Option<&[usize]>,
    c: char,
    check: impl Fn(&str) -> bool,
) -> Option<(Vec<usize>, Vec<String>)> {
    let chars: Vec<char> = line.chars().collect();
    let positions: Vec<usize> = match grid {
        Some(grid) => grid.to_vec(),
        None => (0..chars.len()).filter(|&i| chars[i] == c).collect(),
    };

    let columns = positions.len().checked_sub(1)?;
    if columns == 0 || positions.iter().any(|&p| chars.get(p) != Some(&c)) {
        return None;
    }

    let parts: Vec<String> = positions
        .windows(2)
        .map(|w| chars[w[0] + 1..w[1]].iter().collect())
        .collect();
    if parts.iter().all(|part| check(part)) {
        Some((positions, parts))
    } else {
        None
    }
}

/// Emacs-style grid table.
///
/// The first `+---+---+` line fixes the column boundaries. Content lines
/// accumulate into the current row until a `-` separator line; an `=` line
/// before the first body row closes the header.
pub(crate) fn grid_table(lines: &[&str]) -> Option<(RawTable, usize)> {
    let first = lines.first()?;
    let trimmed = first.trim();
    if !trimmed.starts_with('+') || !trimmed.ends_with('+') {
        return None;
    }

    let (grid, parts) = grid_line(first, None, '+', |part| cell_alignment(part).is_some())?;
    let alignments: Vec<Alignment> = parts.iter().filter_map(|p| cell_alignment(p)).collect();
    let columns = alignments.len();

    let mut header = None;
    let mut rows = Vec::new();
    let mut current: RawRow = vec![Vec::new(); columns];
    let mut has_content = false;
    let mut consumed = 1;

    let finish_row = |current: &mut RawRow| -> RawRow {
        std::mem::replace(current, vec![Vec::new(); columns])
            .iter()
            .map(|cell| dedent(cell))
            .collect()
    };

    let boundaries = Some(grid.as_slice());
    while let Some(line) = lines.get(consumed) {
        if let Some((_, parts)) = grid_line(line, boundaries, '|', |_| true) {
            for (cell, part) in current.iter_mut().zip(parts) {
                cell.push(part.trim_end().to_string());
            }
            has_content = true;
        } else if grid_line(line, boundaries, '+', |part| is_repeated(part, '-')).is_some() {
            if has_content {
                rows.push(finish_row(&mut current));
                has_content = false;
            }
        } else if header.is_none()
            && rows.is_empty()
            && has_content
            && grid_line(line, boundaries, '+', |part| is_repeated(part, '=')).is_some()
        {
            header = Some(finish_row(&mut current));
            has_content = false;
        } else {
            break;
        }
        consumed += 1;
    }

    // A row without a closing grid line is still kept
    if has_content {
        rows.push(finish_row(&mut current));
    }

    if header.is_none() && rows.is_empty() {
        return None;
    }

    Some((
        RawTable {
            header,
            alignments,
            rows,
        },
        consumed,
    ))
}
