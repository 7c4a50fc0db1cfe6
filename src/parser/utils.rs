//! Character and line recognizers shared by the block and span scanners.

/// A line containing only whitespace
pub(crate) fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// A non-blank line that starts in the first column
pub(crate) fn is_unindented(line: &str) -> bool {
    !is_blank(line) && !line.starts_with([' ', '\t'])
}

/// Count the number of columns of indentation, treating tabs as advancing to next multiple of 4
pub(crate) fn count_indent_columns(line: &str) -> usize {
    let mut col = 0;
    for ch in line.chars() {
        match ch {
            ' ' => col += 1,
            '\t' => col = (col / 4 + 1) * 4,
            _ => break,
        }
    }
    col
}

/// Remove up to `columns` worth of indentation from a line
/// Handles tabs properly (tabs advance to next multiple of 4)
pub(crate) fn remove_indent_columns(line: &str, columns: usize) -> String {
    let mut col = 0;
    let mut chars = line.chars().peekable();
    let mut result = String::new();

    while col < columns {
        match chars.peek() {
            Some(&' ') => {
                chars.next();
                col += 1;
            }
            Some(&'\t') => {
                chars.next();
                let next_tab_stop = (col / 4 + 1) * 4;
                if next_tab_stop <= columns {
                    col = next_tab_stop;
                } else {
                    // Partial tab: keep the columns that stick out past `columns`
                    result.push_str(&" ".repeat(next_tab_stop - columns));
                    col = columns;
                }
            }
            _ => break,
        }
    }

    result.extend(chars);
    result
}

/// Strip the indentation common to all non-blank lines
pub(crate) fn dedent(lines: &[String]) -> Vec<String> {
    let common = lines
        .iter()
        .filter(|line| !is_blank(line))
        .map(|line| count_indent_columns(line))
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|line| {
            if is_blank(line) {
                String::new()
            } else {
                remove_indent_columns(line, common)
            }
        })
        .collect()
}

/// Non-empty string made of a single repeated character
pub(crate) fn is_repeated(text: &str, c: char) -> bool {
    !text.is_empty() && text.chars().all(|ch| ch == c)
}

/// Length of the run of `c` at the start of `input`
pub(crate) fn repeated_run(input: &[char], c: char) -> usize {
    input.iter().take_while(|&&ch| ch == c).count()
}

pub(crate) fn starts_with(input: &[char], prefix: &[char]) -> bool {
    input.len() >= prefix.len() && input[..prefix.len()] == *prefix
}

pub(crate) fn starts_with_str(input: &[char], prefix: &str) -> bool {
    let mut i = 0;
    for c in prefix.chars() {
        if input.get(i) != Some(&c) {
            return false;
        }
        i += 1;
    }
    true
}

pub(crate) fn to_string(chars: &[char]) -> String {
    chars.iter().collect()
}

/// Characters a backslash may escape in ordinary text
pub(crate) fn is_escapable(c: char) -> bool {
    matches!(
        c,
        '*' | '\\'
            | '`'
            | '_'
            | '{'
            | '}'
            | '['
            | ']'
            | '('
            | ')'
            | '>'
            | '#'
            | '.'
            | '!'
            | '+'
            | '-'
            | '$'
    )
}

/// Match `open body close` at the start of `input`, taking the first `close` found.
/// Returns the body and the total number of characters consumed.
pub(crate) fn delimited_with<'a>(
    input: &'a [char],
    open: &[char],
    close: &[char],
) -> Option<(&'a [char], usize)> {
    if !starts_with(input, open) {
        return None;
    }
    let mut j = open.len();
    while j < input.len() {
        if starts_with(&input[j..], close) {
            return Some((&input[open.len()..j], j + close.len()));
        }
        j += 1;
    }
    None
}

/// Like [`delimited_with`] with the same delimiter on both sides, but a backslash
/// followed by an `escapable` character never closes the span. The escape stays in
/// the body.
pub(crate) fn delimited_with_escapes<'a>(
    input: &'a [char],
    delimiter: &[char],
    escapable: impl Fn(char) -> bool,
) -> Option<(&'a [char], usize)> {
    if !starts_with(input, delimiter) {
        return None;
    }
    let mut j = delimiter.len();
    while j < input.len() {
        if input[j] == '\\' && input.get(j + 1).is_some_and(|&c| escapable(c)) {
            j += 2;
            continue;
        }
        if starts_with(&input[j..], delimiter) {
            return Some((&input[delimiter.len()..j], j + delimiter.len()));
        }
        j += 1;
    }
    None
}

/// Match a bracketed body with balanced nesting, e.g. `[a [b] c]`.
/// An escaped closing bracket does not count.
pub(crate) fn bracket_delimited(input: &[char], open: char, close: char) -> Option<(&[char], usize)> {
    if input.first() != Some(&open) {
        return None;
    }
    let mut depth = 0;
    let mut j = 1;
    while j < input.len() {
        let c = input[j];
        if c == '\\' && input.get(j + 1) == Some(&close) {
            j += 2;
            continue;
        }
        if c == close {
            if depth == 0 {
                return Some((&input[1..j], j + 1));
            }
            depth -= 1;
        } else if c == open {
            depth += 1;
        }
        j += 1;
    }
    None
}
