//! User-facing error categories and the translation into them.

use crate::request::ValidationError;

/// The category a failed optimization is reported under.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ErrorCategory {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("optimization service unavailable")]
    ServiceUnavailable,
    #[error("network error")]
    NetworkError,
    #[error("optimization timed out")]
    Timeout,
    #[error("optimization server error")]
    ServerError,
    #[error("no water supplies found")]
    NoCandidatesFound,
    #[error("unknown error")]
    Unknown,
}

impl ErrorCategory {
    pub fn user_message(&self) -> String {
        match self {
            ErrorCategory::Validation(err) => format!("Please check your input: {}.", err),
            ErrorCategory::ServiceUnavailable => {
                "The route optimization service is not available right now.".to_string()
            }
            ErrorCategory::NetworkError => {
                "Could not reach the server. Check your internet connection.".to_string()
            }
            ErrorCategory::Timeout => {
                "The optimization took too long. Try fewer points or the Fast preset.".to_string()
            }
            ErrorCategory::ServerError => {
                "The optimization server ran into a problem. Please try again.".to_string()
            }
            ErrorCategory::NoCandidatesFound => {
                "No water supplies were found for this route.".to_string()
            }
            ErrorCategory::Unknown => "Something went wrong while optimizing.".to_string(),
        }
    }
}

/// A low-level failure coming back from the optimizer call.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureSignal {
    Message(String),
    Http { status: u16, body: String },
    Timeout,
    Unreachable,
}

impl From<&reqwest::Error> for FailureSignal {
    fn from(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            FailureSignal::Timeout
        } else if err.is_connect() {
            FailureSignal::Unreachable
        } else if let Some(status) = err.status() {
            FailureSignal::Http {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            FailureSignal::Message(err.to_string())
        }
    }
}

impl From<reqwest::Error> for FailureSignal {
    fn from(err: reqwest::Error) -> Self {
        FailureSignal::from(&err)
    }
}

/// Failure of a best-effort collaborator (persistence, candidate source).
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("storage failed: {0}")]
    Storage(String),
    #[error("candidate source failed: {0}")]
    Source(String),
}

const NOT_FOUND_CODES: &[&str] = &["404"];
const NOT_FOUND_MARKERS: &[&str] = &["not found"];
const NETWORK_MARKERS: &[&str] = &[
    "network",
    "socket",
    "connection refused",
    "connection reset",
    "connection closed",
    "failed to connect",
    "host lookup",
    "dns",
    "unreachable",
];
const TIMEOUT_MARKERS: &[&str] = &["timeout", "timed out"];
const SERVER_CODES: &[&str] = &["500", "502", "503"];
const SERVER_MARKERS: &[&str] = &["server error"];
const NO_CANDIDATE_MARKERS: &[&str] = &["no water supplies", "no water supply", "no candidates"];

/// Maps a failure to exactly one category.
///
/// Categories are tried in a fixed order and the first match wins:
/// service unavailable, network, timeout, server error, no candidates.
pub fn translate(signal: &FailureSignal) -> ErrorCategory {
    let (status, text) = match signal {
        FailureSignal::Message(message) => (None, message.to_lowercase()),
        FailureSignal::Http { status, body } => (Some(*status), body.to_lowercase()),
        FailureSignal::Timeout => return ErrorCategory::Timeout,
        FailureSignal::Unreachable => return ErrorCategory::NetworkError,
    };
    let mentions = |markers: &[&str]| markers.iter().any(|marker| text.contains(marker));
    let cites = |codes: &[&str]| codes.iter().any(|code| contains_code(&text, code));

    if status == Some(404) || cites(NOT_FOUND_CODES) || mentions(NOT_FOUND_MARKERS) {
        ErrorCategory::ServiceUnavailable
    } else if mentions(NETWORK_MARKERS) {
        ErrorCategory::NetworkError
    } else if status == Some(408) || mentions(TIMEOUT_MARKERS) {
        ErrorCategory::Timeout
    } else if status.is_some_and(|code| (500..600).contains(&code))
        || cites(SERVER_CODES)
        || mentions(SERVER_MARKERS)
    {
        ErrorCategory::ServerError
    } else if mentions(NO_CANDIDATE_MARKERS) {
        ErrorCategory::NoCandidatesFound
    } else {
        ErrorCategory::Unknown
    }
}

/// True if `code` occurs in `text` as a whole number, not inside a longer one.
fn contains_code(text: &str, code: &str) -> bool {
    let bytes = text.as_bytes();
    text.match_indices(code).any(|(start, found)| {
        let end = start + found.len();
        let digit_before = start
            .checked_sub(1)
            .and_then(|before| bytes.get(before))
            .is_some_and(u8::is_ascii_digit);
        let digit_after = bytes.get(end).is_some_and(u8::is_ascii_digit);
        !digit_before && !digit_after
    })
}
