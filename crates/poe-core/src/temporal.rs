//! # Execution Windows
//!
//! Artifacts carry zero or more execution windows — time ranges during
//! which their enforcement may run. Windows arrive from external adapters
//! as raw RFC 3339 strings and are validated here rather than trusted at
//! the boundary.
//!
//! A window is valid only if both bounds parse as real instants and the
//! start strictly precedes the end. The planner converts validation
//! failures into warnings; nothing in this module aborts planning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which bound of a window failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowBound {
    /// The window's opening instant.
    Start,
    /// The window's closing instant.
    End,
}

impl std::fmt::Display for WindowBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::End => f.write_str("end"),
        }
    }
}

/// Validation failure for a single execution window.
#[derive(Debug, Clone, Error)]
pub enum WindowError {
    /// A bound is not a parseable RFC 3339 instant.
    #[error("window {bound} bound is not a valid instant: {value:?}")]
    Unparseable {
        /// Which bound failed.
        bound: WindowBound,
        /// The raw bound text as supplied by the adapter.
        value: String,
    },

    /// Both bounds parsed but the start does not precede the end.
    #[error("window start {start} does not precede end {end}")]
    Inverted {
        /// The parsed start instant.
        start: DateTime<Utc>,
        /// The parsed end instant.
        end: DateTime<Utc>,
    },
}

/// A time range during which enforcement may run.
///
/// Bounds are kept in their raw adapter-supplied form; [`TimeWindow::parse`]
/// is the single validation path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Opening instant, RFC 3339.
    pub start: String,
    /// Closing instant, RFC 3339.
    pub end: String,
}

impl TimeWindow {
    /// Create a window from raw RFC 3339 bounds.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// The fallback window covering all representable time.
    ///
    /// Used by the planner when an artifact declares no windows at all, so
    /// that the validation pass always has at least one window to check.
    pub fn all_time() -> Self {
        Self {
            start: "1970-01-01T00:00:00Z".to_string(),
            end: "9999-12-31T23:59:59Z".to_string(),
        }
    }

    /// Validate and parse both bounds.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::Unparseable`] if either bound is not RFC 3339,
    /// or [`WindowError::Inverted`] if `start >= end`.
    pub fn parse(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), WindowError> {
        let start = DateTime::parse_from_rfc3339(&self.start)
            .map_err(|_| WindowError::Unparseable {
                bound: WindowBound::Start,
                value: self.start.clone(),
            })?
            .with_timezone(&Utc);
        let end = DateTime::parse_from_rfc3339(&self.end)
            .map_err(|_| WindowError::Unparseable {
                bound: WindowBound::End,
                value: self.end.clone(),
            })?
            .with_timezone(&Utc);

        if start >= end {
            return Err(WindowError::Inverted { start, end });
        }
        Ok((start, end))
    }

    /// Whether the given instant falls inside this window.
    ///
    /// # Errors
    ///
    /// Propagates the same validation failures as [`TimeWindow::parse`].
    pub fn contains(&self, at: DateTime<Utc>) -> Result<bool, WindowError> {
        let (start, end) = self.parse()?;
        Ok(at >= start && at < end)
    }
}
