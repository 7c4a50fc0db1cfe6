use thiserror::Error;

/// Number of unconsumed lines kept for diagnostics
const CONTEXT_LINES: usize = 5;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// No block recognizer matched a non-blank line.
    #[error("no block construct matches line {line}: {remaining:?}")]
    MalformedInput { line: usize, remaining: Vec<String> },
}

pub type Result<T> = std::result::Result<T, ParseError>;

impl ParseError {
    pub(crate) fn malformed(line: usize, remaining: &[&str]) -> Self {
        ParseError::MalformedInput {
            line,
            remaining: remaining
                .iter()
                .take(CONTEXT_LINES)
                .map(|l| l.to_string())
                .collect(),
        }
    }
}
