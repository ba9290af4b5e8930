//! Tool schemas: the per-tool part of a job submission.
//!
//! A [`ToolSchema`] names the service, the parameter carrying the input data
//! and every tool-specific parameter with its type. Schemas are TOML; a few
//! are compiled in and more can be loaded from a directory.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{JobError, Result};

/// Flags owned by the general CLI; schema parameters may not reuse them.
pub const RESERVED_FLAGS: &[&str] = &[
    "email",
    "title",
    "async",
    "jobid",
    "status",
    "resultTypes",
    "polljob",
    "outformat",
    "outfile",
    "params",
    "paramDetail",
    "quiet",
    "verbose",
    "debugLevel",
    "endpoint",
    "multifasta",
    "timeout",
    "help",
    "version",
];

/// Subcommand names taken by the CLI itself.
pub const RESERVED_TOOL_NAMES: &[&str] = &["tools", "help"];

const BUILTIN: &[(&str, &str)] = &[
    ("ncbiblast", include_str!("schemas/ncbiblast.toml")),
    ("clustalo", include_str!("schemas/clustalo.toml")),
    ("iprscan5", include_str!("schemas/iprscan5.toml")),
];

/// Declared type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Boolean,
    List,
    Integer,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParamSpec {
    /// Name sent to the service.
    pub name: String,
    /// Long CLI flag; defaults to `name`.
    #[serde(default)]
    pub flag: Option<String>,
    pub kind: ParamKind,
    #[serde(default)]
    pub required: bool,
    /// Value used when the flag is absent.
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub help: String,
}

impl ParamSpec {
    pub fn flag(&self) -> &str {
        self.flag.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Path of the service under the base URL; defaults to `name`.
    #[serde(default)]
    pub service: Option<String>,
    /// Parameter that carries the input data (sequence, entry id, ...).
    #[serde(default = "default_input")]
    pub input: String,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
}

fn default_input() -> String {
    "sequence".to_string()
}

impl ToolSchema {
    /// Parses and validates a schema document.
    pub fn from_toml(source: &str) -> Result<Self> {
        let schema: ToolSchema =
            toml::from_str(source).map_err(|e| JobError::Schema(e.to_string()))?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        Self::from_toml(&source)
            .map_err(|e| JobError::Schema(format!("{}: {e}", path.display())))
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(JobError::Schema("tool name must not be empty".into()));
        }
        if RESERVED_TOOL_NAMES.contains(&self.name.as_str()) {
            return Err(JobError::Schema(format!(
                "tool name {:?} is reserved for a built-in command",
                self.name
            )));
        }
        if RESERVED_FLAGS.contains(&self.input.as_str()) {
            return Err(JobError::Schema(format!(
                "{}: input parameter --{} clashes with a general option",
                self.name, self.input
            )));
        }
        let mut seen: Vec<&str> = vec![self.input.as_str()];
        let mut names: Vec<&str> = Vec::new();
        for param in &self.params {
            let flag = param.flag();
            if RESERVED_FLAGS.contains(&flag) {
                return Err(JobError::Schema(format!(
                    "{}: parameter flag --{flag} clashes with a general option",
                    self.name
                )));
            }
            if RESERVED_FLAGS.contains(&param.name.as_str()) {
                return Err(JobError::Schema(format!(
                    "{}: parameter name {} clashes with a general field",
                    self.name, param.name
                )));
            }
            if names.contains(&param.name.as_str()) {
                return Err(JobError::Schema(format!(
                    "{}: duplicate parameter name {}",
                    self.name, param.name
                )));
            }
            names.push(&param.name);

            if param.name == self.input {
                return Err(JobError::Schema(format!(
                    "{}: {} is the input parameter and cannot be redeclared",
                    self.name, self.input
                )));
            }
            if seen.contains(&flag) {
                return Err(JobError::Schema(format!(
                    "{}: duplicate parameter flag --{flag}",
                    self.name
                )));
            }
            seen.push(flag);
        }
        Ok(())
    }

    /// Full service endpoint under `base_url`.
    pub fn endpoint(&self, base_url: &str) -> String {
        let service = self.service.as_deref().unwrap_or(&self.name);
        format!("{}/{}", base_url.trim_end_matches('/'), service)
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// All schemas known to this process, in listing order.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: Vec<ToolSchema>,
}

impl SchemaRegistry {
    /// Registry holding the compiled-in schemas.
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::default();
        for (name, source) in BUILTIN {
            let schema = ToolSchema::from_toml(source)
                .map_err(|e| JobError::Schema(format!("built-in schema {name}: {e}")))?;
            registry.insert(schema);
        }
        Ok(registry)
    }

    /// Adds every `*.toml` schema in `dir`. A schema with the same name as an
    /// existing one replaces it.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();

        for path in &paths {
            let schema = ToolSchema::from_file(path)?;
            debug!(tool = %schema.name, path = %path.display(), "loaded schema");
            self.insert(schema);
        }
        Ok(paths.len())
    }

    pub fn insert(&mut self, schema: ToolSchema) {
        match self.schemas.iter_mut().find(|s| s.name == schema.name) {
            Some(existing) => *existing = schema,
            None => self.schemas.push(schema),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ToolSchema> {
        self.schemas.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolSchema> {
        self.schemas.iter()
    }
}
