use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier the service hands back for a submitted job.
///
/// Always non-empty; construct with [`JobHandle::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    /// Wraps a job identifier, trimming surrounding whitespace.
    /// Returns `None` for an empty or blank identifier.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JobHandle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Remote job status as reported by the `status` endpoint.
///
/// Transitions are driven entirely by the service. `Pending` and `Running`
/// are the only non-terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    Finished,
    Failure,
    Error,
    NotFound,
}

impl JobStatus {
    /// True for every status after which the job can no longer change.
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Pending | JobStatus::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "PENDING"),
            JobStatus::Running => write!(f, "RUNNING"),
            JobStatus::Finished => write!(f, "FINISHED"),
            JobStatus::Failure => write!(f, "FAILURE"),
            JobStatus::Error => write!(f, "ERROR"),
            JobStatus::NotFound => write!(f, "NOT_FOUND"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown job status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for JobStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" | "QUEUED" => Ok(JobStatus::Pending),
            "RUNNING" => Ok(JobStatus::Running),
            "FINISHED" => Ok(JobStatus::Finished),
            "FAILURE" => Ok(JobStatus::Failure),
            "ERROR" => Ok(JobStatus::Error),
            "NOT_FOUND" => Ok(JobStatus::NotFound),
            _ => Err(UnknownStatus(s.trim().to_string())),
        }
    }
}

/// One output format a finished job can produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultDescriptor {
    pub identifier: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_media_type")]
    pub media_type: String,
    #[serde(default = "default_file_suffix")]
    pub file_suffix: String,
}

fn default_media_type() -> String {
    "application/octet-stream".to_string()
}

fn default_file_suffix() -> String {
    "txt".to_string()
}

impl ResultDescriptor {
    /// Text payloads are decoded as strings; everything else is opaque bytes.
    pub fn is_text(&self) -> bool {
        self.media_type.trim().to_ascii_lowercase().starts_with("text")
    }

    /// File name for this result under the given base, `{base}.{id}.{suffix}`.
    pub fn file_name(&self, base: &str) -> String {
        format!("{base}.{}.{}", self.identifier, self.file_suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_handle_rejects_blank_ids() {
        assert!(JobHandle::new("").is_none());
        assert!(JobHandle::new("  \n").is_none());
        let handle = JobHandle::new(" clustalo-R20240101-p1m \n").unwrap();
        assert_eq!(handle.as_str(), "clustalo-R20240101-p1m");
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("finished\n".parse::<JobStatus>(), Ok(JobStatus::Finished));
        assert_eq!("NOT_FOUND".parse::<JobStatus>(), Ok(JobStatus::NotFound));
        assert_eq!("Running".parse::<JobStatus>(), Ok(JobStatus::Running));
        assert_eq!(
            "DONE".parse::<JobStatus>(),
            Err(UnknownStatus("DONE".to_string()))
        );
    }

    #[test]
    fn only_pending_and_running_are_non_terminal() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        for status in [
            JobStatus::Finished,
            JobStatus::Failure,
            JobStatus::Error,
            JobStatus::NotFound,
        ] {
            assert!(status.is_terminal(), "{status} should be terminal");
        }
    }

    #[test]
    fn status_display_matches_wire_format() {
        assert_eq!(JobStatus::NotFound.to_string(), "NOT_FOUND");
        assert_eq!(JobStatus::Pending.to_string(), "PENDING");
    }

    #[test]
    fn descriptor_file_name_and_media_type() {
        let desc = ResultDescriptor {
            identifier: "aln-clustal".into(),
            label: None,
            description: None,
            media_type: "Text/Plain".into(),
            file_suffix: "aln".into(),
        };
        assert!(desc.is_text());
        assert_eq!(desc.file_name("job1"), "job1.aln-clustal.aln");

        let png: ResultDescriptor = serde_json::from_str(
            r#"{"identifier": "tree", "mediaType": "image/png", "fileSuffix": "png"}"#,
        )
        .unwrap();
        assert!(!png.is_text());
    }
}
