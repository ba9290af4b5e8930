//! Transport to a JDispatcher tool service.
//!
//! [`JobService`] is the seam between the job lifecycle and the network:
//! [`RestTransport`] talks HTTP, tests substitute in-memory services.

pub mod client;
pub mod error;
pub mod types;

pub use client::{RestTransport, http_client, user_agent};
pub use error::TransportError;
pub use types::{ParameterDetails, ParameterProperty, ParameterValue};

use crate::job::{JobStatus, ResultDescriptor};

/// Remote operations exposed by every tool service.
#[allow(async_fn_in_trait)]
pub trait JobService {
    /// Submits a job; returns the raw identifier from the response body.
    async fn run(&self, form: &[(String, String)]) -> Result<String, TransportError>;

    async fn status(&self, job_id: &str) -> Result<JobStatus, TransportError>;

    async fn result_types(&self, job_id: &str) -> Result<Vec<ResultDescriptor>, TransportError>;

    async fn result(&self, job_id: &str, identifier: &str) -> Result<Vec<u8>, TransportError>;

    async fn parameters(&self) -> Result<Vec<String>, TransportError>;

    async fn parameter_details(&self, name: &str) -> Result<ParameterDetails, TransportError>;
}
