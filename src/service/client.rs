use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use super::error::TransportError;
use super::types::{ParameterDetails, ParametersResponse, ResultTypesResponse, error_message};
use super::JobService;
use crate::job::{JobStatus, ResultDescriptor};

/// Builds the User-Agent sent with every request.
pub fn user_agent(tool: &str) -> String {
    format!(
        "ebi-jobs/{} ({tool}; Rust; {}) reqwest",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    )
}

/// Builds the shared HTTP client. Created once per process and handed to
/// every [`RestTransport`].
///
/// `read_timeout` bounds each wait for data, not the whole request, so large
/// result downloads are not cut off while bytes keep arriving.
pub fn http_client(
    user_agent: &str,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<Client, TransportError> {
    let client = Client::builder()
        .user_agent(user_agent)
        .connect_timeout(connect_timeout)
        .read_timeout(read_timeout)
        .build()?;
    Ok(client)
}

/// REST transport for one tool endpoint, e.g.
/// `https://www.ebi.ac.uk/Tools/services/rest/ncbiblast`.
#[derive(Debug, Clone)]
pub struct RestTransport {
    client: Client,
    endpoint: String,
}

impl RestTransport {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Endpoint URL with `segments` appended, each percent-encoded as a
    /// single path segment.
    fn url(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| TransportError::Malformed(format!("endpoint {}: {e}", self.endpoint)))?;
        url.path_segments_mut()
            .map_err(|_| {
                TransportError::Malformed(format!("endpoint {} cannot take a path", self.endpoint))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, TransportError> {
        let url = self.url(segments)?;
        debug!(%url, "GET");
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let body = check(response).await?.text().await?;
        trace!(%url, %body, "response body");
        serde_json::from_str(&body).map_err(|e| TransportError::Malformed(format!("{url}: {e}")))
    }
}

/// Turns a non-success response into [`TransportError::Status`].
async fn check(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::Status {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

impl JobService for RestTransport {
    async fn run(&self, form: &[(String, String)]) -> Result<String, TransportError> {
        let url = self.url(&["run"])?;
        debug!(%url, fields = form.len(), "POST");
        let response = self
            .client
            .post(url)
            .header(ACCEPT, "text/plain")
            .form(form)
            .send()
            .await?;
        let body = check(response).await?.text().await?;
        Ok(body.trim().to_string())
    }

    async fn status(&self, job_id: &str) -> Result<JobStatus, TransportError> {
        let url = self.url(&["status", job_id])?;
        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/plain")
            .send()
            .await?;
        let body = check(response).await?.text().await?;
        body.parse::<JobStatus>()
            .map_err(|e| TransportError::Malformed(e.to_string()))
    }

    async fn result_types(&self, job_id: &str) -> Result<Vec<ResultDescriptor>, TransportError> {
        let resp: ResultTypesResponse = self.get_json(&["resulttypes", job_id]).await?;
        Ok(resp.types)
    }

    async fn result(&self, job_id: &str, identifier: &str) -> Result<Vec<u8>, TransportError> {
        let url = self.url(&["result", job_id, identifier])?;
        debug!(%url, "GET");
        let response = self.client.get(url.clone()).send().await?;
        let bytes = check(response).await?.bytes().await?;
        debug!(%url, len = bytes.len(), "result received");
        Ok(bytes.to_vec())
    }

    async fn parameters(&self) -> Result<Vec<String>, TransportError> {
        let resp: ParametersResponse = self.get_json(&["parameters"]).await?;
        Ok(resp.parameters)
    }

    async fn parameter_details(&self, name: &str) -> Result<ParameterDetails, TransportError> {
        self.get_json(&["parameterdetails", name]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let transport = RestTransport::new(Client::new(), "http://localhost:1234/rest/clustalo/");
        assert_eq!(transport.endpoint(), "http://localhost:1234/rest/clustalo");
        assert_eq!(
            transport.url(&["status", "job-1"]).unwrap().as_str(),
            "http://localhost:1234/rest/clustalo/status/job-1"
        );
    }

    #[test]
    fn path_segments_are_percent_encoded() {
        let transport = RestTransport::new(Client::new(), "http://localhost:1234/rest/iprscan5");
        assert_eq!(
            transport.url(&["parameterdetails", "a?b"]).unwrap().as_str(),
            "http://localhost:1234/rest/iprscan5/parameterdetails/a%3Fb"
        );
        assert_eq!(
            transport.url(&["result", "job 1", "x/y#z"]).unwrap().as_str(),
            "http://localhost:1234/rest/iprscan5/result/job%201/x%2Fy%23z"
        );
    }

    #[test]
    fn unparsable_endpoint_is_malformed() {
        let transport = RestTransport::new(Client::new(), "not a url");
        assert!(matches!(
            transport.url(&["run"]),
            Err(TransportError::Malformed(_))
        ));
    }

    #[test]
    fn user_agent_names_tool_and_version() {
        let agent = user_agent("iprscan5");
        assert!(agent.starts_with(&format!("ebi-jobs/{}", env!("CARGO_PKG_VERSION"))));
        assert!(agent.contains("(iprscan5; Rust;"));
    }

    #[test]
    fn http_client_builds() {
        let client = http_client(
            &user_agent("ncbiblast"),
            Duration::from_secs(10),
            Duration::from_secs(120),
        );
        assert!(client.is_ok());
    }
}
