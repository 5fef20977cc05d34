//! Error types for the dashboard pipeline.
//!
//! `DashError` is the single error surfaced by every stage: configuration,
//! fetching, normalisation and aggregation. Nothing here is retried; the caller
//! decides whether to show the error or trigger a fresh fetch.

use std::{error::Error as StdError, fmt};

use thiserror::Error;

/// Maximum number of characters of a response body kept in a `FetchError`.
pub const BODY_PREVIEW_LIMIT: usize = 512;

#[derive(Error, Debug)]
pub enum DashError {
    /// Missing or invalid configuration. Raised before any fetch happens.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network or API failure while fetching tasks.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A raw record is missing a required field or has the wrong shape.
    #[error("malformed record at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    /// A non-empty date field could not be parsed.
    #[error("task {id}: cannot parse {field} {value:?} as a date")]
    DateParse {
        id: String,
        field: &'static str,
        value: String,
    },

    /// Terminal or file I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A non-empty burndown series was required but there are no tasks.
    #[error("cannot compute a burndown range from zero tasks")]
    EmptyDomain,
}

impl DashError {
    /// Process exit code used by the binary for this error.
    pub fn exit_code(&self) -> i32 {
        // 11: config, 20: fetch or I/O, 30: bad source data, 40: empty domain
        match self {
            DashError::Config(_) => 11,
            DashError::Fetch(_) | DashError::Io(_) => 20,
            DashError::MalformedRecord { .. } | DashError::DateParse { .. } => 30,
            DashError::EmptyDomain => 40,
        }
    }
}

/// Coarse classification of a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    Connect,
    Request,
    Body,
    Decode,
    Status,
    Unknown,
}

impl FetchErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Request => "request",
            Self::Body => "body",
            Self::Decode => "decode",
            Self::Status => "status",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed call to the task source.
#[derive(Debug)]
pub struct FetchError {
    kind: FetchErrorKind,
    status: Option<u16>,
    url: Option<String>,
    message: String,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, url: String) -> Self {
        let kind = if err.is_timeout() {
            FetchErrorKind::Timeout
        } else if err.is_connect() {
            FetchErrorKind::Connect
        } else if err.is_request() {
            FetchErrorKind::Request
        } else if err.is_body() {
            FetchErrorKind::Body
        } else if err.is_decode() {
            FetchErrorKind::Decode
        } else {
            FetchErrorKind::Unknown
        };
        FetchError {
            kind,
            status: err.status().map(|s| s.as_u16()),
            url: Some(url),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    pub(crate) fn status_error(status: u16, url: String, body: &str) -> Self {
        FetchError {
            kind: FetchErrorKind::Status,
            status: Some(status),
            url: Some(url),
            message: preview_body(body),
            source: None,
        }
    }

    pub(crate) fn decode_error(status: u16, url: String, err: serde_json::Error, body: &str) -> Self {
        FetchError {
            kind: FetchErrorKind::Decode,
            status: Some(status),
            url: Some(url),
            message: format!("failed to decode response body: {} | body={}", err, preview_body(body)),
            source: Some(Box::new(err)),
        }
    }

    pub(crate) fn shape_error(status: u16, url: String, message: impl Into<String>) -> Self {
        FetchError {
            kind: FetchErrorKind::Decode,
            status: Some(status),
            url: Some(url),
            message: message.into(),
            source: None,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fetch error kind={}", self.kind)?;
        if let Some(status) = self.status {
            write!(f, " status={}", status)?;
        }
        if let Some(url) = &self.url {
            write!(f, " url={}", url)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl StdError for FetchError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}

/// Trim a response body down to something that fits in a log line.
pub fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    if trimmed.chars().count() > BODY_PREVIEW_LIMIT {
        out.push_str("...");
    }
    out
}
