//! Configuração do cliente carregada a partir de `ebi-jobs.toml`.
//!
//! O arquivo é procurado no caminho de `EBI_JOBS_CONFIG` e, na falta dele,
//! no diretório atual. Chaves ausentes usam defaults. A variável
//! `EBI_JOBS_EMAIL` tem precedência sobre o e-mail do arquivo, e as flags
//! da linha de comando têm precedência sobre ambos.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::job::PollSchedule;

pub const DEFAULT_BASE_URL: &str = "https://www.ebi.ac.uk/Tools/services/rest";

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Root under which every tool service lives.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Default contact address for submissions.
    #[serde(default)]
    pub email: Option<String>,

    /// First delay between status checks, in milliseconds.
    #[serde(default = "default_initial_poll_ms")]
    pub initial_poll_ms: u64,

    /// Upper bound on the delay between status checks, in milliseconds.
    #[serde(default = "default_max_poll_ms")]
    pub max_poll_ms: u64,

    /// Give up polling after this many seconds. Unset means wait forever.
    #[serde(default)]
    pub poll_timeout_secs: Option<u64>,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Longest wait for response data, in seconds. Applies to each read, so
    /// a slow download keeps going while bytes arrive.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Directory of extra tool schemas (`*.toml`).
    #[serde(default)]
    pub schema_dir: Option<PathBuf>,
}

// Valor padrão da URL base: o serviço REST público do EBI.
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

// Primeiro intervalo de polling: 1000ms.
fn default_initial_poll_ms() -> u64 {
    1000
}

// Teto do intervalo de polling: 60s.
fn default_max_poll_ms() -> u64 {
    60_000
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            email: None,
            initial_poll_ms: default_initial_poll_ms(),
            max_poll_ms: default_max_poll_ms(),
            poll_timeout_secs: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            schema_dir: None,
        }
    }
}

impl ClientConfig {
    pub fn load() -> Result<Self> {
        let path = std::env::var_os("EBI_JOBS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("ebi-jobs.toml"));
        let mut config = Self::load_from(&path)?;

        if let Ok(email) = std::env::var("EBI_JOBS_EMAIL")
            && !email.is_empty()
        {
            config.email = Some(email);
        }

        Ok(config)
    }

    /// Reads `path`, or returns the defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid settings in {}", path.display()))?;
        Ok(config)
    }

    /// Rejects poll intervals that would query the service without pausing.
    pub fn validate(&self) -> Result<()> {
        if self.initial_poll_ms == 0 {
            bail!("initial_poll_ms must be greater than zero");
        }
        if self.max_poll_ms < self.initial_poll_ms {
            bail!(
                "max_poll_ms ({}) must not be below initial_poll_ms ({})",
                self.max_poll_ms,
                self.initial_poll_ms
            );
        }
        Ok(())
    }

    pub fn poll_schedule(&self) -> PollSchedule {
        PollSchedule::new(
            Duration::from_millis(self.initial_poll_ms),
            Duration::from_millis(self.max_poll_ms),
        )
    }

    pub fn poll_timeout(&self) -> Option<Duration> {
        self.poll_timeout_secs.map(Duration::from_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.initial_poll_ms, 1000);
        assert_eq!(config.max_poll_ms, 60_000);
        assert!(config.poll_timeout_secs.is_none());
        assert!(config.email.is_none());
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            email = "me@example.org"
            max_poll_ms = 30000
            poll_timeout_secs = 3600
        "#;
        let config: ClientConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.email.as_deref(), Some("me@example.org"));
        assert_eq!(config.poll_schedule().max, Duration::from_secs(30));
        assert_eq!(config.poll_schedule().initial, Duration::from_secs(1));
        assert_eq!(config.poll_timeout(), Some(Duration::from_secs(3600)));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = ClientConfig::load_from(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ebi-jobs.toml");
        std::fs::write(&path, "initial_poll_ms = \"soon\"").unwrap();
        let err = ClientConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("parsing"));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ebi-jobs.toml");
        std::fs::write(&path, "initial_poll_ms = 0").unwrap();
        let err = ClientConfig::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("initial_poll_ms must be greater than zero"));

        std::fs::write(&path, "initial_poll_ms = 5000\nmax_poll_ms = 0").unwrap();
        let err = ClientConfig::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("max_poll_ms (0)"));
    }

    #[test]
    fn defaults_pass_validation() {
        assert!(ClientConfig::default().validate().is_ok());
    }
}
