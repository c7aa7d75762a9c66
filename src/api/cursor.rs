//! Pagination cursor encoding
//!
//! A cursor is the publish timestamp of the last video on the previous page,
//! formatted as RFC-3339 in UTC. Callers treat it as opaque.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Invalid cursor '{value}': {source}")]
pub struct CursorError {
    pub value: String,
    #[source]
    pub source: chrono::ParseError,
}

/// Exclusive upper bound on publish time for the next page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor(DateTime<Utc>);

impl Cursor {
    pub fn new(published_at: DateTime<Utc>) -> Self {
        Self(published_at)
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.0
    }

    /// Decodes a cursor; any RFC-3339 offset is accepted and normalised to UTC
    pub fn decode(raw: &str) -> Result<Self, CursorError> {
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|parsed| Self(parsed.with_timezone(&Utc)))
            .map_err(|source| CursorError {
                value: raw.to_string(),
                source,
            })
    }

    /// Encodes the cursor, keeping sub-second digits only when present
    pub fn encode(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

impl FromStr for Cursor {
    type Err = CursorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
