//! Core record types for handsample.
//!
//! A [`Draft`] holds questionnaire answers while the contributor picks a photo;
//! a [`SubmissionRecord`] is the merged, persisted result of both steps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Textual timestamp format shared by storage names and records.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Format a UTC instant the way records and storage names expect.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Questionnaire answers awaiting an upload.
///
/// All fields are free-form; any string, including the empty string, is
/// accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Draft {
    /// Writing style, e.g. `cursive`.
    pub writing_style: String,
    /// Dominant hand of the writer.
    pub handedness: String,
    /// Age bracket, e.g. `18-25`.
    pub age_group: String,
    /// Self-reported gender.
    pub gender: String,
}

/// One accepted contribution: upload metadata merged with its draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// Generated storage name, unique within the upload directory.
    pub filename: String,
    /// Sanitized name supplied by the contributor. Never used for paths.
    pub original_name: String,
    /// Creation time in [`TIMESTAMP_FORMAT`].
    pub timestamp: String,
    /// Questionnaire answers.
    #[serde(flatten)]
    pub answers: Draft,
}

impl SubmissionRecord {
    /// Merge upload details with the questionnaire answers.
    #[must_use]
    pub fn new(
        filename: String,
        original_name: String,
        timestamp: String,
        answers: Draft,
    ) -> Self {
        Self {
            filename,
            original_name,
            timestamp,
            answers,
        }
    }
}
