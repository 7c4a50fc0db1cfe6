//! Inline span scanner: turns one run of text into emphasis, links, code and math spans.

use crate::ast::InlineSpan;

use super::utils::{
    bracket_delimited, delimited_with, delimited_with_escapes, is_escapable, repeated_run,
    starts_with_str, to_string,
};

const AUTOLINK_SCHEMES: [&str; 2] = ["http://", "https://"];

/// Parse inline elements from a trimmed text run
pub fn parse_spans(text: &str) -> Vec<InlineSpan> {
    let chars: Vec<char> = text.trim().chars().collect();
    log::trace!("Scanning {} characters of inline text", chars.len());
    scan(&chars)
}

/// Single forward pass over `chars`; the pending literal is flushed whenever a
/// construct is emitted
fn scan(chars: &[char]) -> Vec<InlineSpan> {
    let mut spans = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        let rest = &chars[i..];

        if let Some(len) = hard_line_break(rest) {
            flush(&mut literal, &mut spans);
            spans.push(InlineSpan::HardLineBreak);
            i += len;
            continue;
        }

        // `&amp;` is kept as is, any other `&` is encoded
        if chars[i] == '&' {
            literal.push_str("&amp;");
            i += if starts_with_str(rest, "&amp;") { 5 } else { 1 };
            continue;
        }

        if chars[i] == '\\' && i + 1 < chars.len() && is_escapable(chars[i + 1]) {
            literal.push(chars[i + 1]);
            i += 2;
            continue;
        }

        if chars[i] == '`' {
            if let Some((code, len)) = try_parse_code_span(rest) {
                flush(&mut literal, &mut spans);
                spans.push(InlineSpan::InlineCode(code));
                i += len;
            } else {
                // Unmatched run stays literal as a whole
                let run = repeated_run(rest, '`');
                literal.extend(&rest[..run]);
                i += run;
            }
            continue;
        }

        if chars[i] == '$' {
            if let Some((body, len)) = delimited_with_escapes(rest, &['$', '$'], |c| c == '$') {
                flush(&mut literal, &mut spans);
                spans.push(InlineSpan::LatexDisplayMath(to_string(body).trim().to_string()));
                i += len;
                continue;
            }
            if let Some((body, len)) = delimited_with_escapes(rest, &['$'], |c| c == '$') {
                flush(&mut literal, &mut spans);
                spans.push(InlineSpan::LatexInlineMath(to_string(body).trim().to_string()));
                i += len;
                continue;
            }
        }

        if chars[i] == '<'
            && let Some((body, len)) = delimited_with(rest, &['<'], &['>'])
        {
            let target = to_string(body);
            if is_autolink_target(&target) {
                flush(&mut literal, &mut spans);
                spans.push(InlineSpan::DirectLink {
                    children: vec![InlineSpan::Literal(target.clone())],
                    url: target,
                    title: None,
                });
            } else {
                // Inline HTML tag, copied through unscanned
                literal.push('<');
                literal.push_str(&target);
                literal.push('>');
            }
            i += len;
            continue;
        }

        if chars[i] == '[' {
            if let Some((body, target, len)) = try_parse_direct_link(rest) {
                flush(&mut literal, &mut spans);
                let (url, title) = split_link_target(&target);
                spans.push(InlineSpan::DirectLink {
                    children: scan(body),
                    url,
                    title,
                });
                i += len;
                continue;
            }
            if let Some((body, original, key, len)) = try_parse_indirect_link(rest) {
                flush(&mut literal, &mut spans);
                spans.push(InlineSpan::IndirectLink {
                    children: scan(body),
                    original,
                    key,
                });
                i += len;
                continue;
            }
        }

        if let Some((url, len)) = try_parse_bare_autolink(rest) {
            flush(&mut literal, &mut spans);
            spans.push(InlineSpan::DirectLink {
                children: vec![InlineSpan::Literal(url.clone())],
                url,
                title: None,
            });
            i += len;
            continue;
        }

        if chars[i] == '!' {
            let after = &rest[1..];
            if let Some((body, target, len)) = try_parse_direct_link(after) {
                flush(&mut literal, &mut spans);
                let (url, title) = split_link_target(&target);
                spans.push(InlineSpan::DirectImage {
                    alt: to_string(body),
                    url,
                    title,
                });
                i += len + 1;
                continue;
            }
            if let Some((body, original, key, len)) = try_parse_indirect_link(after) {
                flush(&mut literal, &mut spans);
                spans.push(InlineSpan::IndirectImage {
                    alt: to_string(body),
                    original,
                    key,
                });
                i += len + 1;
                continue;
            }
        }

        if (chars[i] == '*' || chars[i] == '_')
            && let Some((span, len)) = try_parse_emphasis(rest)
        {
            flush(&mut literal, &mut spans);
            spans.push(span);
            i += len;
            continue;
        }

        match chars[i] {
            '<' => literal.push_str("&lt;"),
            '>' => literal.push_str("&gt;"),
            c => literal.push(c),
        }
        i += 1;
    }

    flush(&mut literal, &mut spans);
    spans
}

fn flush(literal: &mut String, spans: &mut Vec<InlineSpan>) {
    if !literal.is_empty() {
        spans.push(InlineSpan::Literal(std::mem::take(literal)));
    }
}

/// Two spaces followed by a line terminator
fn hard_line_break(input: &[char]) -> Option<usize> {
    match input {
        [' ', ' ', '\r', '\n', ..] => Some(4),
        [' ', ' ', '\n' | '\r', ..] => Some(3),
        _ => None,
    }
}

/// Either the space-padded form "`` code ``" or a run of N backticks closed by
/// exactly N backticks. Content is taken verbatim and trimmed.
fn try_parse_code_span(input: &[char]) -> Option<(String, usize)> {
    if let Some((body, len)) = delimited_with(input, &['`', '`', ' '], &[' ', '`', '`']) {
        return Some((to_string(body).trim().to_string(), len));
    }

    let ticks = repeated_run(input, '`');
    let mut j = ticks;
    while j < input.len() {
        if input[j] == '`' {
            let run = repeated_run(&input[j..], '`');
            if run == ticks {
                let code = to_string(&input[ticks..j]);
                return Some((code.trim().to_string(), j + run));
            }
            j += run;
        } else {
            j += 1;
        }
    }

    None
}

/// Returns the size of a `$...$` or `$$...$$` span at the start of `input`
pub(crate) fn math_span_len(input: &[char]) -> Option<usize> {
    delimited_with_escapes(input, &['$', '$'], |c| c == '$')
        .or_else(|| delimited_with_escapes(input, &['$'], |c| c == '$'))
        .map(|(_, len)| len)
}

/// Returns the size of a code span at the start of `input`
pub(crate) fn code_span_len(input: &[char]) -> Option<usize> {
    if input.first() != Some(&'`') {
        return None;
    }
    try_parse_code_span(input).map(|(_, len)| len)
}

/// `[body](target)`
fn try_parse_direct_link(input: &[char]) -> Option<(&[char], String, usize)> {
    let (body, body_len) = bracket_delimited(input, '[', ']')?;
    let (target, target_len) = bracket_delimited(&input[body_len..], '(', ')')?;
    Some((body, to_string(target), body_len + target_len))
}

/// `[body][key]`, `[body][]` or `[body]`; returns body, original text and key.
/// An empty key refers to the body text.
fn try_parse_indirect_link(input: &[char]) -> Option<(&[char], String, String, usize)> {
    let (body, body_len) = bracket_delimited(input, '[', ']')?;
    let body_text = to_string(body);

    if let Some((key, key_len)) = bracket_delimited(&input[body_len..], '[', ']') {
        let key_text = to_string(key);
        let original = format!("[{}][{}]", body_text, key_text);
        let key = if key_text.is_empty() {
            body_text
        } else {
            key_text
        };
        return Some((body, original, key, body_len + key_len));
    }

    let original = format!("[{}]", body_text);
    Some((body, original, body_text, body_len))
}

/// `http://...` or `https://...` up to the next whitespace
fn try_parse_bare_autolink(input: &[char]) -> Option<(String, usize)> {
    if !AUTOLINK_SCHEMES
        .iter()
        .any(|scheme| starts_with_str(input, scheme))
    {
        return None;
    }
    let len = input
        .iter()
        .position(|c| c.is_whitespace())
        .unwrap_or(input.len());
    Some((to_string(&input[..len]), len))
}

/// Triple delimiters give strong emphasis, double strong, single emphasis
fn try_parse_emphasis(input: &[char]) -> Option<(InlineSpan, usize)> {
    let delimiter = *input.first()?;

    for count in [3, 2, 1] {
        let run = vec![delimiter; count];
        if let Some((body, len)) = delimited_with_escapes(input, &run, is_escapable)
            && !body.is_empty()
        {
            let children = scan(body);
            let span = match count {
                3 => InlineSpan::Strong(vec![InlineSpan::Emphasis(children)]),
                2 => InlineSpan::Strong(children),
                _ => InlineSpan::Emphasis(children),
            };
            return Some((span, len));
        }
    }

    None
}

/// Text inside `<...>` that should become a link rather than an HTML tag
pub(crate) fn is_autolink_target(text: &str) -> bool {
    !text.is_empty()
        && !text.chars().any(char::is_whitespace)
        && (text.contains('@') || text.contains("://"))
}

/// Split a link target into URL and optional quoted title.
/// A trailing single- or double-quoted segment is the title; angle brackets
/// around the URL are dropped.
pub(crate) fn split_link_target(target: &str) -> (String, Option<String>) {
    let target = target.trim();
    let (url, title) = match target.chars().last() {
        Some(quote @ ('"' | '\'')) => match target.find(quote) {
            Some(start) if start < target.len() - 1 => (
                target[..start].trim(),
                Some(target[start + 1..target.len() - 1].trim().to_string()),
            ),
            _ => (target, None),
        },
        _ => (target, None),
    };
    let url = url.trim_start_matches('<').trim_end_matches('>');
    (url.to_string(), title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::InlineSpan::*;
    use pretty_assertions::assert_eq;

    fn lit(text: &str) -> InlineSpan {
        Literal(text.to_string())
    }

    #[test]
    fn test_plain_text_is_single_literal() {
        assert_eq!(parse_spans("just some words"), vec![lit("just some words")]);
    }

    #[test]
    fn test_input_is_trimmed() {
        assert_eq!(parse_spans("  padded \n"), vec![lit("padded")]);
        assert_eq!(parse_spans("   "), vec![]);
    }

    #[test]
    fn test_strong() {
        assert_eq!(parse_spans("**bold**"), vec![Strong(vec![lit("bold")])]);
    }

    #[test]
    fn test_emphasis_both_delimiters() {
        assert_eq!(
            parse_spans("*a* and _b_"),
            vec![Emphasis(vec![lit("a")]), lit(" and "), Emphasis(vec![lit("b")])]
        );
    }

    #[test]
    fn test_triple_delimiter_is_strong_emphasis() {
        assert_eq!(
            parse_spans("***both***"),
            vec![Strong(vec![Emphasis(vec![lit("both")])])]
        );
    }

    #[test]
    fn test_nested_emphasis_body_is_rescanned() {
        assert_eq!(
            parse_spans("**a `b` c**"),
            vec![Strong(vec![lit("a "), InlineCode("b".to_string()), lit(" c")])]
        );
    }

    #[test]
    fn test_escaped_delimiters_are_literal() {
        let spans = parse_spans(r"\*not emphasis\*");
        assert_eq!(spans, vec![lit("*not emphasis*")]);
    }

    #[test]
    fn test_escaped_delimiter_inside_emphasis() {
        assert_eq!(
            parse_spans(r"*a \* b*"),
            vec![Emphasis(vec![lit("a * b")])]
        );
    }

    #[test]
    fn test_unmatched_delimiters_stay_literal() {
        assert_eq!(parse_spans("2 * 3"), vec![lit("2 * 3")]);
        assert_eq!(parse_spans("a ** b"), vec![lit("a ** b")]);
    }

    #[test]
    fn test_backslash_before_ordinary_char_is_kept() {
        assert_eq!(parse_spans(r"a\b"), vec![lit(r"a\b")]);
    }

    #[test]
    fn test_ampersand_encoding() {
        assert_eq!(parse_spans("a & b"), vec![lit("a &amp; b")]);
        assert_eq!(parse_spans("a &amp; b"), vec![lit("a &amp; b")]);
        // Other entities are encoded again
        assert_eq!(parse_spans("&lt;"), vec![lit("&amp;lt;")]);
    }

    #[test]
    fn test_angle_brackets_encoded() {
        assert_eq!(parse_spans("a > b"), vec![lit("a &gt; b")]);
        assert_eq!(parse_spans("a < b"), vec![lit("a &lt; b")]);
    }

    #[test]
    fn test_inline_html_copied_through() {
        assert_eq!(
            parse_spans("<b>*x*</b>"),
            vec![lit("<b>"), Emphasis(vec![lit("x")]), lit("</b>")]
        );
    }

    #[test]
    fn test_angle_autolink() {
        let link = "http://example.com";
        assert_eq!(
            parse_spans("<http://example.com>"),
            vec![DirectLink {
                children: vec![lit(link)],
                url: link.to_string(),
                title: None,
            }]
        );
        assert!(matches!(
            parse_spans("<me@example.com>")[0],
            DirectLink { .. }
        ));
    }

    #[test]
    fn test_bare_autolink_ends_at_whitespace() {
        assert_eq!(
            parse_spans("see https://x.org/a_b_c now"),
            vec![
                lit("see "),
                DirectLink {
                    children: vec![lit("https://x.org/a_b_c")],
                    url: "https://x.org/a_b_c".to_string(),
                    title: None,
                },
                lit(" now"),
            ]
        );
    }

    #[test]
    fn test_code_spans() {
        assert_eq!(parse_spans("`code`"), vec![InlineCode("code".to_string())]);
        assert_eq!(
            parse_spans("`` a ` b ``"),
            vec![InlineCode("a ` b".to_string())]
        );
        assert_eq!(
            parse_spans("``a`b``"),
            vec![InlineCode("a`b".to_string())]
        );
        // Content is not scanned
        assert_eq!(parse_spans("`*x*`"), vec![InlineCode("*x*".to_string())]);
    }

    #[test]
    fn test_unmatched_backticks() {
        assert_eq!(parse_spans("``a`"), vec![lit("``a`")]);
    }

    #[test]
    fn test_latex_math() {
        assert_eq!(
            parse_spans("$$ x^2 $$"),
            vec![LatexDisplayMath("x^2".to_string())]
        );
        assert_eq!(
            parse_spans("cost $a_1 * b$"),
            vec![lit("cost "), LatexInlineMath("a_1 * b".to_string())]
        );
        assert_eq!(
            parse_spans(r"$\$5$"),
            vec![LatexInlineMath(r"\$5".to_string())]
        );
    }

    #[test]
    fn test_direct_link_with_title() {
        assert_eq!(
            parse_spans(r#"[*go*](http://x.org "Title")"#),
            vec![DirectLink {
                children: vec![Emphasis(vec![lit("go")])],
                url: "http://x.org".to_string(),
                title: Some("Title".to_string()),
            }]
        );
    }

    #[test]
    fn test_indirect_link_forms() {
        assert_eq!(
            parse_spans("[text][ref]"),
            vec![IndirectLink {
                children: vec![lit("text")],
                original: "[text][ref]".to_string(),
                key: "ref".to_string(),
            }]
        );
        assert_eq!(
            parse_spans("[text][]"),
            vec![IndirectLink {
                children: vec![lit("text")],
                original: "[text][]".to_string(),
                key: "text".to_string(),
            }]
        );
        assert_eq!(
            parse_spans("[text]"),
            vec![IndirectLink {
                children: vec![lit("text")],
                original: "[text]".to_string(),
                key: "text".to_string(),
            }]
        );
    }

    #[test]
    fn test_images_keep_raw_alt_text() {
        assert_eq!(
            parse_spans("![a *b*](<img.png> 'T')"),
            vec![DirectImage {
                alt: "a *b*".to_string(),
                url: "img.png".to_string(),
                title: Some("T".to_string()),
            }]
        );
        assert_eq!(
            parse_spans("![alt][logo]"),
            vec![IndirectImage {
                alt: "alt".to_string(),
                original: "[alt][logo]".to_string(),
                key: "logo".to_string(),
            }]
        );
    }

    #[test]
    fn test_hard_line_break() {
        assert_eq!(
            parse_spans("one  \ntwo"),
            vec![lit("one"), HardLineBreak, lit("two")]
        );
        assert_eq!(
            parse_spans("one  \r\ntwo"),
            vec![lit("one"), HardLineBreak, lit("two")]
        );
        assert_eq!(parse_spans("one\ntwo"), vec![lit("one\ntwo")]);
    }

    #[test]
    fn test_split_link_target() {
        assert_eq!(split_link_target(" /url "), ("/url".to_string(), None));
        assert_eq!(
            split_link_target(r#"/url "a title""#),
            ("/url".to_string(), Some("a title".to_string()))
        );
        assert_eq!(split_link_target("<x>"), ("x".to_string(), None));
        assert_eq!(split_link_target("x'"), ("x'".to_string(), None));
    }
}
