use crate::types::ParseError;
use regex::Regex;

/// Substring that marks an error-level line.
pub const ERROR_MARKER: &str = " [error] ";

/// Pulls the message out of an nginx error line such as
/// `2023/01/02 03:04:05 [error] 7#7: *42 connect() failed, client: 1.2.3.4, server: _`.
/// The message stops at the first `, client:`.
pub const ERROR_LOG_PATTERN: &str = r" \[.+\] .* \*[0-9]+ (?P<message>.*?), client:.*, server:.*";

/// Recognises error annotations written just before their access line.
#[derive(Debug, Clone)]
pub struct ErrorPrefixDetector {
    message: Regex,
}

impl ErrorPrefixDetector {
    pub fn new() -> Result<Self, ParseError> {
        Ok(Self {
            message: Regex::new(ERROR_LOG_PATTERN)?,
        })
    }

    pub fn is_error_line(&self, line: &str) -> bool {
        line.contains(ERROR_MARKER)
    }

    /// The free-text message, or `None` when the line carries the marker but
    /// not the expected layout.
    pub fn extract_message(&self, line: &str) -> Option<String> {
        self.message
            .captures(line)
            .and_then(|caps| caps.name("message"))
            .map(|m| m.as_str())
            .filter(|message| !message.is_empty())
            .map(str::to_string)
    }
}
