use serde::Deserialize;

#[cfg(windows)]
const HOST_NEWLINE: &str = "\r\n";
#[cfg(not(windows))]
const HOST_NEWLINE: &str = "\n";

/// Parser configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Used when joining the lines of a paragraph or list item for span scanning
    pub newline: String,
}

impl ParserOptions {
    pub fn with_newline(newline: impl Into<String>) -> Self {
        ParserOptions {
            newline: newline.into(),
        }
    }
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            newline: HOST_NEWLINE.to_string(),
        }
    }
}
