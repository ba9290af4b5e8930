//! Wire types for the JDispatcher REST API.
//!
//! Structured endpoints are requested as JSON. The service wraps most lists
//! in a single-key object (`{"values": [...]}`), so list fields accept
//! either a bare array or that wrapper.

use serde::{Deserialize, Deserializer, Serialize};

use crate::job::ResultDescriptor;

/// Body of `GET {endpoint}/resulttypes/{jobid}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultTypesResponse {
    #[serde(default, deserialize_with = "flatten_list")]
    pub types: Vec<ResultDescriptor>,
}

/// Body of `GET {endpoint}/parameters`.
#[derive(Debug, Clone, Deserialize)]
pub struct ParametersResponse {
    #[serde(default, deserialize_with = "flatten_list")]
    pub parameters: Vec<String>,
}

/// Body of `GET {endpoint}/parameterdetails/{name}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDetails {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Service-side type name, e.g. `STRING` or `BOOLEAN`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "flatten_list")]
    pub values: Vec<ParameterValue>,
}

/// One allowed value of a parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterValue {
    #[serde(default)]
    pub label: Option<String>,
    pub value: String,
    #[serde(default)]
    pub default_value: bool,
    #[serde(default, deserialize_with = "flatten_list")]
    pub properties: Vec<ParameterProperty>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterProperty {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrWrapper<T> {
    List(Vec<T>),
    Wrapper(std::collections::BTreeMap<String, Vec<T>>),
}

fn flatten_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<ListOrWrapper<T>>::deserialize(deserializer)? {
        Some(ListOrWrapper::List(items)) => items,
        Some(ListOrWrapper::Wrapper(map)) => map.into_values().flatten().collect(),
        None => Vec::new(),
    })
}

/// Extracts a human-readable message from an error response body.
///
/// Handles the JSON (`{"error": {"description": ..}}` or
/// `{"description": ..}`) and XML (`<description>..</description>`) error
/// documents, falling back to the trimmed body.
pub fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let description = value
            .pointer("/error/description")
            .or_else(|| value.get("description"))
            .and_then(|d| d.as_str());
        if let Some(description) = description {
            return description.trim().to_string();
        }
    }

    if let Some(start) = body.find("<description>") {
        let rest = &body[start + "<description>".len()..];
        if let Some(end) = rest.find("</description>") {
            return rest[..end].trim().to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no error message from service".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_types_deserialize_from_api_format() {
        let json = r#"{
            "types": [
                {
                    "identifier": "out",
                    "label": "Tool Output",
                    "description": "The output from the tool itself.",
                    "mediaType": "text/plain",
                    "fileSuffix": "txt"
                },
                {
                    "identifier": "visual-png",
                    "label": "Visual Output",
                    "mediaType": "image/png",
                    "fileSuffix": "png"
                }
            ]
        }"#;
        let resp: ResultTypesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.types.len(), 2);
        assert_eq!(resp.types[0].identifier, "out");
        assert_eq!(resp.types[0].media_type, "text/plain");
        assert_eq!(resp.types[1].file_suffix, "png");
        assert_eq!(resp.types[1].description, None);
    }

    #[test]
    fn parameter_details_accept_wrapped_values() {
        let json = r#"{
            "name": "program",
            "description": "The BLAST program to be used.",
            "type": "STRING",
            "values": {
                "values": [
                    {"label": "blastp", "value": "blastp", "defaultValue": true,
                     "properties": {"properties": [{"key": "stype", "value": "protein"}]}},
                    {"label": "blastn", "value": "blastn", "defaultValue": false}
                ]
            }
        }"#;
        let details: ParameterDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.kind.as_deref(), Some("STRING"));
        assert_eq!(details.values.len(), 2);
        assert!(details.values[0].default_value);
        assert_eq!(details.values[0].properties[0].key, "stype");
        assert!(details.values[1].properties.is_empty());
    }

    #[test]
    fn parameters_accept_bare_list_and_null() {
        let bare: ParametersResponse =
            serde_json::from_str(r#"{"parameters": ["program", "stype"]}"#).unwrap();
        assert_eq!(bare.parameters, vec!["program", "stype"]);

        let null: ParametersResponse = serde_json::from_str(r#"{"parameters": null}"#).unwrap();
        assert!(null.parameters.is_empty());
    }

    #[test]
    fn error_message_from_json_xml_and_text() {
        assert_eq!(
            error_message(r#"{"error": {"description": "Invalid email"}}"#),
            "Invalid email"
        );
        assert_eq!(
            error_message("<error>\n  <description>Job not found</description>\n</error>"),
            "Job not found"
        );
        assert_eq!(error_message("  plain failure \n"), "plain failure");
        assert_eq!(error_message(""), "no error message from service");
    }
}
