//! Status vocabularies and payload schemas
//!
//! Each remote service names its job states differently and puts its output
//! in a different place. A [`ServiceProfile`] captures both so the poll state
//! machine can stay service-agnostic.

use serde_json::Value;

use crate::domain::job::JobStatus;

/// Mapping from a service's raw status strings to [`JobStatus`]
///
/// Matching is exact (case-sensitive). Anything not listed normalizes to
/// [`JobStatus::Unknown`], so the mapping is total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusVocabulary {
    pub pending: &'static [&'static str],
    pub running: &'static [&'static str],
    pub completed: &'static [&'static str],
    pub failed: &'static [&'static str],
}

impl StatusVocabulary {
    /// Segmind workflow API (`QUEUED`, `PROCESSING`, `COMPLETED`, `FAILED`)
    pub const SEGMIND: Self = Self {
        pending: &["QUEUED"],
        running: &["PROCESSING"],
        completed: &["COMPLETED"],
        failed: &["FAILED"],
    };

    /// FASHN try-on API
    pub const FASHN: Self = Self {
        pending: &["starting", "in_queue"],
        running: &["processing"],
        completed: &["completed"],
        failed: &["failed"],
    };

    /// Replicate predictions API
    pub const REPLICATE: Self = Self {
        pending: &["starting"],
        running: &["processing"],
        completed: &["succeeded"],
        failed: &["failed", "canceled"],
    };

    /// Normalizes a raw status string
    pub fn normalize(&self, raw: &str) -> JobStatus {
        if self.completed.contains(&raw) {
            JobStatus::Completed
        } else if self.failed.contains(&raw) {
            JobStatus::Failed
        } else if self.running.contains(&raw) {
            JobStatus::Running
        } else if self.pending.contains(&raw) {
            JobStatus::Pending
        } else {
            JobStatus::Unknown
        }
    }

    /// Every raw value this vocabulary recognizes
    pub fn known(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.pending
            .iter()
            .chain(self.running)
            .chain(self.completed)
            .chain(self.failed)
            .copied()
    }
}

/// Where the status, artifact and error live in a status payload
///
/// Locations are JSON pointers (RFC 6901), e.g. `/output/0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadSchema {
    pub status_pointer: String,
    pub artifact_pointer: String,
    pub error_pointer: String,
}

impl PayloadSchema {
    pub fn new(
        status_pointer: impl Into<String>,
        artifact_pointer: impl Into<String>,
        error_pointer: impl Into<String>,
    ) -> Self {
        Self {
            status_pointer: status_pointer.into(),
            artifact_pointer: artifact_pointer.into(),
            error_pointer: error_pointer.into(),
        }
    }

    /// Schema for payloads shaped like `{status, output: [url, ...], error}`
    pub fn output_list() -> Self {
        Self::new("/status", "/output/0", "/error")
    }

    /// Schema for payloads that put the artifact in a named top-level field
    pub fn named_output(field: &str) -> Self {
        Self::new("/status", format!("/{}", escape_pointer_token(field)), "/error")
    }

    /// Raw status string, if the payload carries one
    ///
    /// Non-string values are rendered as JSON so they still show up in
    /// diagnostics; they never match a vocabulary entry.
    pub fn status(&self, payload: &Value) -> Option<String> {
        match payload.pointer(&self.status_pointer)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Artifact reference, if present and a non-empty string
    pub fn artifact(&self, payload: &Value) -> Option<String> {
        payload
            .pointer(&self.artifact_pointer)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    }

    /// Error message, if the payload carries one
    ///
    /// Accepts either a plain string or an object with a `message` field.
    pub fn error(&self, payload: &Value) -> Option<String> {
        match payload.pointer(&self.error_pointer)? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => match map.get("message").and_then(Value::as_str) {
                Some(message) => Some(message.to_string()),
                None => Some(Value::Object(map.clone()).to_string()),
            },
            other => Some(other.to_string()),
        }
    }
}

fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Everything the poller needs to know about one remote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceProfile {
    pub name: &'static str,
    pub vocabulary: StatusVocabulary,
    pub schema: PayloadSchema,
}

impl ServiceProfile {
    pub fn new(name: &'static str, vocabulary: StatusVocabulary, schema: PayloadSchema) -> Self {
        Self {
            name,
            vocabulary,
            schema,
        }
    }

    /// Reads and normalizes the status of a payload
    ///
    /// A missing status field normalizes to [`JobStatus::Unknown`].
    pub fn read_status(&self, payload: &Value) -> (JobStatus, Option<String>) {
        let raw = self.schema.status(payload);
        let status = raw
            .as_deref()
            .map_or(JobStatus::Unknown, |r| self.vocabulary.normalize(r));
        (status, raw)
    }
}
