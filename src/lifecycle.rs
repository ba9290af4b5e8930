//! The asynchronous job lifecycle: submit, poll, fetch results.
//!
//! [`AsyncJobClient`] drives one job at a time against any [`JobService`].
//! Submission and result fetches fail fast; status polling treats transport
//! errors as transient and keeps going.

use std::io::Write;
use std::path::PathBuf;

use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::error::{JobError, Result};
use crate::job::{JobHandle, JobStatus, PollOptions, ResultDescriptor};
use crate::params::SubmissionParameters;
use crate::schema::ToolSchema;
use crate::service::{JobService, ParameterDetails, TransportError};

/// Where fetched results go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// One file per result type, named `{base}.{identifier}.{suffix}`.
    Files { base: String },
    /// Everything concatenated on standard output.
    Stdout,
}

impl OutputTarget {
    /// `--outfile -` means standard output; no `--outfile` means files named
    /// after the job.
    pub fn new(outfile: Option<&str>, handle: &JobHandle) -> Self {
        match outfile {
            Some("-") => OutputTarget::Stdout,
            Some(base) => OutputTarget::Files {
                base: base.to_string(),
            },
            None => OutputTarget::Files {
                base: handle.to_string(),
            },
        }
    }
}

/// Picks the descriptors named in a comma-separated `outformat` list, in the
/// order given. Without a filter every descriptor is selected.
pub fn select_results(
    descriptors: &[ResultDescriptor],
    outformat: Option<&str>,
) -> Result<Vec<ResultDescriptor>> {
    let requested: Vec<&str> = outformat
        .map(|f| f.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    if requested.is_empty() {
        return Ok(descriptors.to_vec());
    }

    requested
        .into_iter()
        .map(|id| {
            descriptors
                .iter()
                .find(|d| d.identifier == id)
                .cloned()
                .ok_or_else(|| JobError::UnknownResultFormat {
                    identifier: id.to_string(),
                    available: descriptors
                        .iter()
                        .map(|d| d.identifier.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                })
        })
        .collect()
}

pub struct AsyncJobClient<S> {
    service: S,
    schema: ToolSchema,
}

impl<S: JobService> AsyncJobClient<S> {
    pub fn new(service: S, schema: ToolSchema) -> Self {
        Self { service, schema }
    }

    pub fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    /// Validates `params` and sends exactly one `run` request.
    pub async fn submit(&self, params: &SubmissionParameters) -> Result<JobHandle> {
        params.validate(&self.schema)?;
        for (name, value) in params.fields() {
            debug!(tool = %self.schema.name, %name, %value, "submission parameter");
        }

        let id = self.service.run(&params.to_form()).await.map_err(|e| match e {
            TransportError::Status { status, message } => {
                JobError::SubmissionRejected(format!("{message} (HTTP {status})"))
            }
            other => JobError::Transport(other),
        })?;

        let handle = JobHandle::new(id).ok_or_else(|| {
            JobError::SubmissionRejected("service returned an empty job identifier".into())
        })?;
        info!(tool = %self.schema.name, job_id = %handle, "job submitted");
        Ok(handle)
    }

    pub async fn status(&self, handle: &JobHandle) -> Result<JobStatus> {
        Ok(self.service.status(handle.as_str()).await?)
    }

    /// Polls until the job leaves `PENDING`/`RUNNING` and returns that status.
    pub async fn poll_until_terminal(
        &self,
        handle: &JobHandle,
        options: &PollOptions,
    ) -> Result<JobStatus> {
        self.poll_with_progress(handle, options, |_| {}).await
    }

    /// [`poll_until_terminal`](Self::poll_until_terminal), calling
    /// `on_status` with every status received.
    pub async fn poll_with_progress(
        &self,
        handle: &JobHandle,
        options: &PollOptions,
        mut on_status: impl FnMut(JobStatus),
    ) -> Result<JobStatus> {
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            if options.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
                return Err(JobError::PollCancelled {
                    job_id: handle.to_string(),
                });
            }

            attempt += 1;
            match self.service.status(handle.as_str()).await {
                Ok(status) => {
                    on_status(status);
                    if status.is_terminal() {
                        debug!(job_id = %handle, %status, attempt, "job reached terminal status");
                        return Ok(status);
                    }
                }
                Err(e) => warn!(job_id = %handle, error = %e, "status check failed, polling again"),
            }

            let mut wait = options.schedule.interval_for_attempt(attempt);
            if let Some(deadline) = options.deadline {
                let elapsed = started.elapsed();
                if elapsed >= deadline {
                    return Err(JobError::PollDeadlineExceeded {
                        job_id: handle.to_string(),
                        elapsed,
                    });
                }
                wait = wait.min(deadline - elapsed);
            }
            debug!(job_id = %handle, wait_ms = wait.as_millis() as u64, "waiting before next status check");

            match &options.cancel {
                Some(token) => {
                    tokio::select! {
                        _ = token.cancelled() => {
                            return Err(JobError::PollCancelled { job_id: handle.to_string() });
                        }
                        _ = sleep(wait) => {}
                    }
                }
                None => sleep(wait).await,
            }
        }
    }

    /// Result types of a finished job. Fails with
    /// [`JobError::JobNotFinished`] for any other status.
    pub async fn list_result_types(&self, handle: &JobHandle) -> Result<Vec<ResultDescriptor>> {
        let status = self.status(handle).await?;
        if status != JobStatus::Finished {
            return Err(JobError::JobNotFinished {
                job_id: handle.to_string(),
                status,
            });
        }
        Ok(self.service.result_types(handle.as_str()).await?)
    }

    pub async fn fetch_result(&self, handle: &JobHandle, identifier: &str) -> Result<Vec<u8>> {
        Ok(self.service.result(handle.as_str(), identifier).await?)
    }

    /// Fetches the selected results of a finished job and writes them to
    /// `target`. `stdout` receives the payloads when the target is
    /// [`OutputTarget::Stdout`]. Returns the paths of the files written.
    ///
    /// The `outformat` filter is checked against the job's result types
    /// before anything is fetched.
    pub async fn materialize(
        &self,
        handle: &JobHandle,
        target: &OutputTarget,
        outformat: Option<&str>,
        stdout: &mut impl Write,
    ) -> Result<Vec<PathBuf>> {
        let descriptors = self.list_result_types(handle).await?;
        let selected = select_results(&descriptors, outformat)?;
        let mut written = Vec::new();

        for descriptor in &selected {
            let payload = self.fetch_result(handle, &descriptor.identifier).await?;
            if payload.is_empty() {
                warn!(job_id = %handle, "no content for type {}", descriptor.identifier);
                continue;
            }
            match target {
                OutputTarget::Stdout => {
                    if !descriptor.is_text() {
                        warn!(
                            job_id = %handle,
                            media_type = %descriptor.media_type,
                            "writing binary result {} to standard output",
                            descriptor.identifier
                        );
                    }
                    stdout.write_all(&payload)?;
                }
                OutputTarget::Files { base } => {
                    let path = PathBuf::from(descriptor.file_name(base));
                    std::fs::write(&path, &payload)?;
                    debug!(path = %path.display(), bytes = payload.len(), "result written");
                    written.push(path);
                }
            }
        }
        stdout.flush()?;
        Ok(written)
    }

    pub async fn parameters(&self) -> Result<Vec<String>> {
        Ok(self.service.parameters().await?)
    }

    pub async fn parameter_details(&self, name: &str) -> Result<ParameterDetails> {
        Ok(self.service.parameter_details(name).await?)
    }
}
