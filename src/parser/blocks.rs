//! Block structure recognizers. Each takes the remaining lines and returns the
//! recognized construct with the number of lines it consumed, or `None`.

use crate::ast::BlockParagraph;

use super::inline::{is_autolink_target, split_link_target};
use super::utils::{count_indent_columns, is_blank, is_repeated, remove_indent_columns};

/// A fenced code block opening line
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Fence {
    pub fence_char: char,
    pub fence_len: usize,
    pub indent: usize,
    pub info: String,
}

/// Check if a line starts a fenced code block
pub(crate) fn fence_start(line: &str) -> Option<Fence> {
    let indent = line.chars().take_while(|&c| c == ' ').count();
    if indent >= 4 {
        return None;
    }

    let after_indent = &line[indent..];
    let fence_char = after_indent.chars().next()?;
    if fence_char != '`' && fence_char != '~' {
        return None;
    }

    let fence_len = after_indent
        .chars()
        .take_while(|&c| c == fence_char)
        .count();
    if fence_len < 3 {
        return None;
    }

    // A backtick in the info string means this is inline code, not a fence
    let info = &after_indent[fence_len..];
    if fence_char == '`' && info.contains('`') {
        return None;
    }

    Some(Fence {
        fence_char,
        fence_len,
        indent,
        info: info.trim().to_string(),
    })
}

/// Check if a line is a valid closing fence
fn is_closing_fence(line: &str, fence: &Fence) -> bool {
    let indent = line.chars().take_while(|&c| c == ' ').count();
    if indent >= 4 {
        return false;
    }

    let after_indent = &line[indent..];
    let fence_len = after_indent
        .chars()
        .take_while(|&c| c == fence.fence_char)
        .count();
    if fence_len < fence.fence_len {
        return false;
    }

    after_indent[fence_len..].trim().is_empty()
}

/// Fenced code block. Runs to the closing fence or to the end of input.
pub(crate) fn fenced_code_block(lines: &[&str]) -> Option<(BlockParagraph, usize)> {
    let fence = fence_start(lines.first()?)?;

    let mut code_lines = Vec::new();
    let mut i = 1;
    let mut closed = false;
    while i < lines.len() {
        let line = lines[i];
        i += 1;
        if is_closing_fence(line, &fence) {
            closed = true;
            break;
        }
        code_lines.push(reindent_fence_line(line, fence.indent));
    }
    if !closed {
        log::debug!("Fenced code block has no closing fence, taking remaining lines");
    }

    // First word is the language, the rest of the header line is kept separately
    let (language, ignored) = match fence.info.split_once(char::is_whitespace) {
        Some((language, rest)) => (language.to_string(), rest.trim().to_string()),
        None => (fence.info.clone(), String::new()),
    };

    Some((
        BlockParagraph::CodeBlock {
            lines: code_lines,
            language,
            ignored,
        },
        i,
    ))
}

/// Strip the opening fence's indentation, or all of it when the line has less
fn reindent_fence_line(line: &str, indent: usize) -> String {
    if is_blank(line) {
        return String::new();
    }
    let leading = line.chars().take_while(|&c| c == ' ').count();
    if leading >= indent {
        line[indent..].to_string()
    } else {
        line.trim_start().to_string()
    }
}

fn is_indented_code_line(line: &str) -> bool {
    count_indent_columns(line) >= 4
}

/// Indented code block: lines indented by 4+ columns, blank lines inside preserved
pub(crate) fn indented_code_block(lines: &[&str]) -> Option<(BlockParagraph, usize)> {
    if !lines.first().is_some_and(|line| is_indented_code_line(line) && !is_blank(line)) {
        return None;
    }

    let consumed = lines
        .iter()
        .take_while(|line| is_blank(line) || is_indented_code_line(line))
        .count();

    let mut code_lines: Vec<String> = lines[..consumed]
        .iter()
        .map(|line| {
            if is_blank(line) {
                String::new()
            } else {
                remove_indent_columns(line, 4)
            }
        })
        .collect();

    // Remove trailing blank lines
    while code_lines.last().is_some_and(|l| l.is_empty()) {
        code_lines.pop();
    }

    Some((
        BlockParagraph::CodeBlock {
            lines: code_lines,
            language: String::new(),
            ignored: String::new(),
        },
        consumed,
    ))
}

/// `[key]: url "title"` with up to 3 spaces of indentation.
/// Returns key, url, title.
pub(crate) fn link_definition(line: &str) -> Option<(String, String, Option<String>)> {
    let indent = line.chars().take_while(|&c| c == ' ').count();
    if indent > 3 {
        return None;
    }

    let after_bracket = line[indent..].strip_prefix('[')?;
    let close = after_bracket.find("]:")?;
    let key = &after_bracket[..close];
    if key.is_empty() {
        return None;
    }

    let (url, title) = split_link_target(&after_bracket[close + 2..]);
    Some((key.to_string(), url, title))
}

/// Content of a blockquote line: up to 3 spaces, `>`, then at most one whitespace character
pub(crate) fn blockquote_start(line: &str) -> Option<&str> {
    let indent = line.chars().take_while(|&c| c == ' ').count();
    if indent > 3 {
        return None;
    }

    let after_marker = line[indent..].strip_prefix('>')?;
    match after_marker.chars().next() {
        Some(c) if c.is_whitespace() => Some(&after_marker[c.len_utf8()..]),
        _ => Some(after_marker),
    }
}

/// Lines of a blockquote with the markers stripped.
///
/// A quote line is followed by lazy continuation lines up to a blank line, a
/// heading or the next quote line. An empty quote line ends the quote unless
/// the very next line opens another one.
pub(crate) fn blockquote(lines: &[&str]) -> Option<(Vec<String>, usize)> {
    let mut body = Vec::new();
    let mut i = 0;

    while let Some(content) = lines.get(i).and_then(|line| blockquote_start(line)) {
        i += 1;
        if content.trim().is_empty() {
            body.push(String::new());
        } else {
            body.push(content.to_string());
            while i < lines.len()
                && !is_blank(lines[i])
                && blockquote_start(lines[i]).is_none()
                && heading(&lines[i..]).is_none()
            {
                body.push(lines[i].to_string());
                i += 1;
            }
        }
    }

    if i == 0 { None } else { Some((body, i)) }
}

/// A line of whitespace and 3 or more of one of `-`, `*`, `_`
pub(crate) fn horizontal_rule(line: &str) -> Option<char> {
    let mut rule_char = None;
    let mut count = 0;

    for c in line.chars() {
        if c.is_whitespace() {
            continue;
        }
        if !matches!(c, '-' | '*' | '_') {
            return None;
        }
        match rule_char {
            None => rule_char = Some(c),
            Some(r) if r != c => return None,
            Some(_) => {}
        }
        count += 1;
    }

    if count >= 3 { rule_char } else { None }
}

/// ATX heading line: returns level and text
fn atx_heading(line: &str) -> Option<(u8, String)> {
    // 4+ spaces = indented code block, not a heading
    let leading_spaces = line.chars().take_while(|&c| c == ' ').count();
    if leading_spaces >= 4 {
        return None;
    }

    let trimmed = line.trim_start();
    let hash_count = trimmed.chars().take_while(|&c| c == '#').count();
    if hash_count == 0 || hash_count > 6 {
        return None;
    }

    let after_hashes = &trimmed[hash_count..];
    if !after_hashes.is_empty() && !after_hashes.starts_with([' ', '\t']) {
        return None;
    }

    // The closing hash run is dropped only when preceded by whitespace ("## F#" keeps its hash)
    let mut text = after_hashes.trim();
    let without_hashes = text.trim_end_matches('#');
    if without_hashes.is_empty() {
        text = "";
    } else if without_hashes.len() < text.len() && without_hashes.ends_with([' ', '\t']) {
        text = without_hashes.trim_end();
    }

    Some((hash_count as u8, text.to_string()))
}

/// Setext underline: a run of `=` (level 1) or `-` (level 2)
fn setext_underline(line: &str) -> Option<u8> {
    let trimmed = line.trim_end();
    if is_repeated(trimmed, '=') {
        Some(1)
    } else if is_repeated(trimmed, '-') {
        Some(2)
    } else {
        None
    }
}

/// ATX or setext heading: returns level, raw text and lines consumed
pub(crate) fn heading(lines: &[&str]) -> Option<(u8, String, usize)> {
    let first = lines.first()?;
    if let Some((level, text)) = atx_heading(first) {
        return Some((level, text, 1));
    }

    if !is_blank(first)
        && let Some(level) = lines.get(1).and_then(|line| setext_underline(line))
    {
        return Some((level, first.trim().to_string(), 2));
    }

    None
}

/// Number of lines that continue a paragraph: stops at a blank line, a
/// heading, a code fence or a blockquote start
pub(crate) fn paragraph_lines(lines: &[&str]) -> usize {
    let mut i = 0;
    while i < lines.len()
        && !is_blank(lines[i])
        && heading(&lines[i..]).is_none()
        && fence_start(lines[i]).is_none()
        && blockquote_start(lines[i]).is_none()
    {
        i += 1;
    }
    i
}

/// `$$$` on its own line opens a LaTeX block running to the end of the paragraph
pub(crate) fn latex_block(lines: &[&str]) -> Option<(Vec<String>, usize)> {
    if lines.first()?.trim_end() != "$$$" {
        return None;
    }
    let count = paragraph_lines(&lines[1..]);
    let body = lines[1..=count].iter().map(|l| l.to_string()).collect();
    Some((body, count + 1))
}

/// Paragraph run starting with `<`, unless it opens with an autolink or email.
/// Returns the number of lines in the run.
pub(crate) fn html_block(lines: &[&str]) -> Option<usize> {
    let first = lines.first()?;
    if !first.starts_with('<') {
        return None;
    }

    if let Some(close) = first.find('>')
        && is_autolink_target(&first[1..close])
    {
        return None;
    }

    match paragraph_lines(lines) {
        0 => None,
        count => Some(count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("---", Some('-'))]
    #[case(" * * *", Some('*'))]
    #[case("___   ", Some('_'))]
    #[case("--", None)]
    #[case("-*-", None)]
    #[case("--- a", None)]
    fn test_horizontal_rule(#[case] line: &str, #[case] expected: Option<char>) {
        assert_eq!(horizontal_rule(line), expected);
    }

    #[rstest]
    #[case("# Title", Some((1, "Title")))]
    #[case("###### Six", Some((6, "Six")))]
    #[case("####### Seven", None)]
    #[case("#NoSpace", None)]
    #[case("    # Code", None)]
    #[case("## Closed ##", Some((2, "Closed")))]
    #[case("## Hello F#", Some((2, "Hello F#")))]
    #[case("#", Some((1, "")))]
    fn test_atx_heading(#[case] line: &str, #[case] expected: Option<(u8, &str)>) {
        assert_eq!(
            atx_heading(line),
            expected.map(|(level, text)| (level, text.to_string()))
        );
    }

    #[test]
    fn test_setext_heading() {
        assert_eq!(heading(&["Title", "====="]), Some((1, "Title".to_string(), 2)));
        assert_eq!(heading(&["Title", "---  "]), Some((2, "Title".to_string(), 2)));
        assert_eq!(heading(&["Title", "- item"]), None);
        assert_eq!(heading(&["", "==="]), None);
    }

    #[test]
    fn test_fenced_code_header() {
        let (block, consumed) =
            fenced_code_block(&["```rust  ignore this", "fn main() {}", "```", "after"]).unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(
            block,
            BlockParagraph::CodeBlock {
                lines: vec!["fn main() {}".to_string()],
                language: "rust".to_string(),
                ignored: "ignore this".to_string(),
            }
        );
    }

    #[test]
    fn test_fenced_code_reindents_relative_to_fence() {
        let (block, _) = fenced_code_block(&["  ~~~", "    a", " b", "", "  ~~~"]).unwrap();
        assert_eq!(
            block,
            BlockParagraph::CodeBlock {
                lines: vec!["  a".to_string(), "b".to_string(), String::new()],
                language: String::new(),
                ignored: String::new(),
            }
        );
    }

    #[test]
    fn test_closing_fence_rules() {
        // Wrong character, too short, trailing text and 4-space indent do not close
        let lines = ["````", "~~~~", "```", "```` x", "    ````", "`````"];
        let (block, consumed) = fenced_code_block(&lines).unwrap();
        assert_eq!(consumed, 6);
        match block {
            BlockParagraph::CodeBlock { lines, .. } => assert_eq!(lines.len(), 4),
            other => panic!("expected code block, got {:?}", other),
        }
    }

    #[test]
    fn test_backtick_in_info_string_is_not_a_fence() {
        assert!(fence_start("``` a`b").is_none());
        assert!(fence_start("~~~ a`b").is_some());
    }

    #[test]
    fn test_indented_code_block() {
        let lines = ["    a", "", "\tb", "", "c"];
        let (block, consumed) = indented_code_block(&lines).unwrap();
        assert_eq!(consumed, 4);
        assert_eq!(
            block,
            BlockParagraph::CodeBlock {
                lines: vec!["a".to_string(), String::new(), "b".to_string()],
                language: String::new(),
                ignored: String::new(),
            }
        );
    }

    #[test]
    fn test_link_definition() {
        assert_eq!(
            link_definition(r#"   [Key]: http://x.org "T""#),
            Some((
                "Key".to_string(),
                "http://x.org".to_string(),
                Some("T".to_string())
            ))
        );
        assert_eq!(link_definition("    [k]: url"), None);
        assert_eq!(link_definition("[k] not a definition"), None);
    }

    #[test]
    fn test_blockquote_lazy_continuation() {
        let lines = ["> a", "b", "> c", "", "d"];
        let (body, consumed) = blockquote(&lines).unwrap();
        assert_eq!(body, vec!["a", "b", "c"]);
        assert_eq!(consumed, 3);
    }

    #[test]
    fn test_blockquote_empty_line_reopened() {
        let lines = [">a", ">", "> b", ">", "c"];
        let (body, consumed) = blockquote(&lines).unwrap();
        assert_eq!(body, vec!["a", "", "b", ""]);
        assert_eq!(consumed, 4);
    }

    #[test]
    fn test_blockquote_stops_at_heading() {
        let (body, consumed) = blockquote(&["> a", "# H"]).unwrap();
        assert_eq!(body, vec!["a"]);
        assert_eq!(consumed, 1);
    }

    #[test]
    fn test_latex_block() {
        let (body, consumed) = latex_block(&["$$$ ", "a = b", "c", "", "text"]).unwrap();
        assert_eq!(body, vec!["a = b", "c"]);
        assert_eq!(consumed, 3);
        assert!(latex_block(&["$$"]).is_none());
    }

    #[test]
    fn test_html_block_skips_autolinks() {
        assert!(html_block(&["<http://x.org>"]).is_none());
        assert!(html_block(&["<me@x.org> wrote"]).is_none());
        assert_eq!(html_block(&["<div>", "hi", "</div>", "", "p"]), Some(3));
    }

    #[test]
    fn test_paragraph_lines_stop() {
        assert_eq!(paragraph_lines(&["a", "b", "", "c"]), 2);
        assert_eq!(paragraph_lines(&["a", "> q"]), 1);
        assert_eq!(paragraph_lines(&["a", "```"]), 1);
        assert_eq!(paragraph_lines(&["a", "b", "==="]), 1);
    }
}
