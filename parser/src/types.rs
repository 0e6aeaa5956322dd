use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// One assembled access event, optionally annotated by the error line that
/// preceded it.
///
/// Every field has a zero value (`None`, `0`, empty string) which is what an
/// event carries when its access line did not match or a field failed to
/// coerce.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogEvent {
    pub time: Option<DateTime<FixedOffset>>,
    pub client_id: String,
    pub status: u64,
    pub method: String,
    pub url: String,
    pub protocol_version: String,
    pub upstream_addr: String,
    pub user_agent_raw: String,
    pub user_agent: Option<UserAgentInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Decoded user-agent details as handed back by a `UserAgentDecoder`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserAgentInfo {
    pub browser: String,
    pub browser_version: String,
    pub os_name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON encode error: {0}")]
    Json(#[source] serde_json::Error),
    #[error("CSV encode error: {0}")]
    Csv(#[source] csv::Error),
    #[error("Invalid log format pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("{0}")]
    Custom(String),
}

// Write failures inside an encoder stay `Io` so callers can tell a closed
// output apart from a bad record.
impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            ParseError::Io(e.into())
        } else {
            ParseError::Json(e)
        }
    }
}

impl From<csv::Error> for ParseError {
    fn from(e: csv::Error) -> Self {
        if !e.is_io_error() {
            return ParseError::Csv(e);
        }
        match e.into_kind() {
            csv::ErrorKind::Io(io) => ParseError::Io(io),
            other => ParseError::Custom(format!("CSV encode error: {other:?}")),
        }
    }
}

impl From<String> for ParseError {
    fn from(msg: String) -> Self {
        ParseError::Custom(msg)
    }
}

impl From<&str> for ParseError {
    fn from(msg: &str) -> Self {
        ParseError::Custom(msg.to_string())
    }
}
