//! Payload delivered by the scheduler when the job is triggered remotely.
//!
//! The `date` field is carried through for diagnostics only; the rotation
//! window is always computed from the wall clock at the start of a run.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Error, Debug)]
pub enum EventError {
    #[error("Failed to read invocation event from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invocation event is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid event date '{0}': expected RFC 3339 or YYYY-MM-DD")]
    InvalidDate(String),
}

impl InvocationEvent {
    pub fn from_json(payload: &str) -> Result<Self, EventError> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Read an event from a file, or from stdin when `path` is `-`.
    pub fn read(path: &Path) -> Result<Self, EventError> {
        let read_error = |source| EventError::Read {
            path: path.to_path_buf(),
            source,
        };

        let payload = if path == Path::new("-") {
            let mut payload = String::new();
            std::io::stdin()
                .read_to_string(&mut payload)
                .map_err(read_error)?;
            payload
        } else {
            std::fs::read_to_string(path).map_err(read_error)?
        };

        Self::from_json(&payload)
    }

    /// The event date, if one was supplied. Blank strings count as absent.
    pub fn date(&self) -> Result<Option<DateTime<Utc>>, EventError> {
        let Some(raw) = self.date.as_deref().map(str::trim) else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }

        if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some(timestamp.with_timezone(&Utc)));
        }

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|midnight| Some(midnight.and_utc()))
            .ok_or_else(|| EventError::InvalidDate(raw.to_string()))
    }
}
