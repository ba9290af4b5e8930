use std::time::Duration;

use thiserror::Error;

use crate::job::JobStatus;
use crate::service::TransportError;

#[derive(Debug, Error)]
pub enum JobError {
    /// Local validation failed; nothing was sent to the service.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The service refused the `run` request.
    #[error("submission rejected: {0}")]
    SubmissionRejected(String),

    #[error("job {job_id} has not finished (status: {status})")]
    JobNotFinished { job_id: String, status: JobStatus },

    #[error("unknown result format {identifier:?} (available: {available})")]
    UnknownResultFormat {
        identifier: String,
        available: String,
    },

    #[error("invalid boolean value {value:?} for --{name} (expected true/yes/y or false/no/n)")]
    InvalidBooleanValue { name: String, value: String },

    #[error("gave up polling job {job_id} after {elapsed:?}")]
    PollDeadlineExceeded { job_id: String, elapsed: Duration },

    #[error("polling of job {job_id} was cancelled")]
    PollCancelled { job_id: String },

    /// Stopped by an interrupt before the requested action completed.
    #[error("interrupted")]
    Interrupted,

    #[error("schema error: {0}")]
    Schema(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl JobError {
    /// Process exit status for this error: `1` for argument and validation
    /// errors, `3` for everything that failed while talking to the service.
    pub fn exit_code(&self) -> i32 {
        match self {
            JobError::InvalidParameters(_)
            | JobError::InvalidBooleanValue { .. }
            | JobError::Schema(_) => 1,
            _ => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, JobError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_not_finished_display() {
        let err = JobError::JobNotFinished {
            job_id: "clustalo-R1".into(),
            status: JobStatus::Running,
        };
        assert_eq!(
            err.to_string(),
            "job clustalo-R1 has not finished (status: RUNNING)"
        );
    }

    #[test]
    fn invalid_boolean_display() {
        let err = JobError::InvalidBooleanValue {
            name: "goterms".into(),
            value: "maybe".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid boolean value \"maybe\" for --goterms (expected true/yes/y or false/no/n)"
        );
    }

    #[test]
    fn exit_codes_separate_usage_from_execution() {
        assert_eq!(JobError::InvalidParameters("email".into()).exit_code(), 1);
        assert_eq!(JobError::SubmissionRejected("nope".into()).exit_code(), 3);
        assert_eq!(
            JobError::PollCancelled {
                job_id: "j".into()
            }
            .exit_code(),
            3
        );
        assert_eq!(JobError::Interrupted.exit_code(), 3);
    }

    #[test]
    fn transport_errors_convert() {
        let err: JobError = TransportError::Malformed("bad json".into()).into();
        assert!(matches!(err, JobError::Transport(_)));
    }
}
