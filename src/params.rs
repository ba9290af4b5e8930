//! Translation of raw command-line strings into typed submission parameters.
//!
//! Everything here is pure: no I/O, no network state.

use std::fmt;

use crate::error::{JobError, Result};
use crate::schema::{ParamKind, ParamSpec, ToolSchema};

/// A typed parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Bool(bool),
    Integer(i64),
    List(Vec<String>),
}

impl ParamValue {
    /// Form-encoded values; a list becomes one entry per element.
    fn form_values(&self) -> Vec<String> {
        match self {
            ParamValue::Text(s) => vec![s.clone()],
            ParamValue::Bool(b) => vec![b.to_string()],
            ParamValue::Integer(n) => vec![n.to_string()],
            ParamValue::List(items) => items.clone(),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            ParamValue::Text(s) => s.trim().is_empty(),
            ParamValue::List(items) => items.is_empty(),
            ParamValue::Bool(_) | ParamValue::Integer(_) => false,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => write!(f, "{s}"),
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Integer(n) => write!(f, "{n}"),
            ParamValue::List(items) => write!(f, "{}", items.join(",")),
        }
    }
}

/// Case-insensitive `true/yes/y` or `false/no/n`.
pub fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" => Ok(true),
        "false" | "no" | "n" => Ok(false),
        _ => Err(JobError::InvalidBooleanValue {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Splits on commas and whitespace, keeping order and duplicates.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Converts one raw string according to the parameter's declared kind.
pub fn translate(spec: &ParamSpec, raw: &str) -> Result<ParamValue> {
    match spec.kind {
        ParamKind::String => Ok(ParamValue::Text(raw.to_string())),
        ParamKind::Boolean => parse_bool(spec.flag(), raw).map(ParamValue::Bool),
        ParamKind::List => Ok(ParamValue::List(parse_list(raw))),
        ParamKind::Integer => raw.trim().parse::<i64>().map(ParamValue::Integer).map_err(|_| {
            JobError::InvalidParameters(format!("--{} expects an integer, got {raw:?}", spec.flag()))
        }),
    }
}

/// Everything sent in one `run` request. Built once, never mutated after
/// submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionParameters {
    email: String,
    title: Option<String>,
    fields: Vec<(String, ParamValue)>,
}

impl SubmissionParameters {
    /// Builds the parameter set for `schema` from raw `(param name, value)`
    /// pairs. Parameters without a raw value fall back to their schema
    /// default; the rest are left out.
    pub fn from_raw(
        schema: &ToolSchema,
        email: &str,
        title: Option<&str>,
        input: &str,
        raw: &[(String, String)],
    ) -> Result<Self> {
        let mut fields = vec![(schema.input.clone(), ParamValue::Text(input.to_string()))];

        for spec in &schema.params {
            let value = raw
                .iter()
                .find(|(name, _)| *name == spec.name)
                .map(|(_, v)| v.as_str())
                .or(spec.default.as_deref());
            if let Some(value) = value {
                fields.push((spec.name.clone(), translate(spec, value)?));
            }
        }

        Ok(Self {
            email: email.trim().to_string(),
            title: title.map(str::to_string).filter(|t| !t.trim().is_empty()),
            fields,
        })
    }

    /// Same parameters with a different input, for batch submissions.
    pub fn with_input(&self, input_name: &str, input: &str) -> Self {
        let mut next = self.clone();
        match next.fields.iter_mut().find(|(name, _)| name == input_name) {
            Some((_, value)) => *value = ParamValue::Text(input.to_string()),
            None => next
                .fields
                .insert(0, (input_name.to_string(), ParamValue::Text(input.to_string()))),
        }
        next
    }

    /// Checks the email, the input and every required parameter are present
    /// and non-empty.
    pub fn validate(&self, schema: &ToolSchema) -> Result<()> {
        if self.email.is_empty() {
            return Err(JobError::InvalidParameters(
                "an e-mail address is required to submit a job (--email)".into(),
            ));
        }

        let required = std::iter::once(schema.input.as_str()).chain(
            schema
                .params
                .iter()
                .filter(|p| p.required)
                .map(|p| p.name.as_str()),
        );
        let missing: Vec<&str> = required
            .filter(|name| self.get(name).is_none_or(ParamValue::is_empty))
            .collect();
        if !missing.is_empty() {
            return Err(JobError::InvalidParameters(format!(
                "missing required parameter(s): {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Every field as `(name, rendered value)`, email and title included.
    pub fn fields(&self) -> Vec<(&str, String)> {
        let mut out = vec![("email", self.email.clone())];
        if let Some(title) = &self.title {
            out.push(("title", title.clone()));
        }
        out.extend(self.fields.iter().map(|(n, v)| (n.as_str(), v.to_string())));
        out
    }

    /// Form body for the `run` request.
    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut form = vec![("email".to_string(), self.email.clone())];
        if let Some(title) = &self.title {
            form.push(("title".to_string(), title.clone()));
        }
        for (name, value) in &self.fields {
            form.extend(value.form_values().into_iter().map(|v| (name.clone(), v)));
        }
        form
    }
}
