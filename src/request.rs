//! Inbound request shape and the loosely typed parameter bag.
//!
//! The transport layer hands the dispatcher a decoded [`ConversionRequest`].
//! Parameter values arrive untyped (whatever JSON gave us), so every getter on
//! [`Parameters`] is lenient: a value of the wrong shape reads as absent and
//! the caller falls back to its default.

use crate::error::ConversionError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known parameter keys.
pub mod keys {
    pub const RESOLUTION: &str = "resolution";
    pub const IMAGE_FORMAT: &str = "image_format";
    pub const ANTI_ALIASING: &str = "anti_aliasing";
    pub const PAGES: &str = "pages";
    pub const OUTPUT_DIR: &str = "output_dir";
    pub const TIMEOUT: &str = "timeout";
    pub const CLEANUP_TEMP: &str = "cleanup_temp";
    pub const PROCESSOR_OUTPUT: &str = "processor_output";
    pub const PROCESSOR_OUTPUT_LEGACY: &str = "processorOutput";
    pub const METADATA: &str = "metadata";
}

/// A batch conversion request as decoded from the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Name of the capability to run, e.g. `"ghostscript"`.
    pub agent: String,
    /// Action within the capability, e.g. `"convert"`.
    pub action: String,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default)]
    pub files: Vec<String>,
}

impl ConversionRequest {
    /// Decode a request from JSON, mapping shape errors to `BadRequest`.
    pub fn from_json(raw: &str) -> Result<Self, ConversionError> {
        serde_json::from_str(raw).map_err(|e| ConversionError::BadRequest(e.to_string()))
    }
}

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Number(v as f64)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(v: Vec<String>) -> Self {
        ParamValue::List(v)
    }
}

/// The raw parameter bag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(HashMap<String, ParamValue>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Numeric value; numeric strings such as `"150"` are accepted too.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            ParamValue::Number(n) => Some(*n),
            ParamValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            ParamValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// List of strings; a single string reads as a one-element list.
    pub fn strings(&self, key: &str) -> Option<Vec<String>> {
        match self.get(key)? {
            ParamValue::List(v) => Some(v.clone()),
            ParamValue::Text(s) => Some(vec![s.clone()]),
            _ => None,
        }
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wire_request() {
        let raw = r#"{
            "agent": "renderer",
            "action": "convert",
            "files": ["a.pdf", "b.pdf"],
            "parameters": {"resolution": 150, "image_format": "jpg", "pages": "all",
                           "anti_aliasing": true, "metadata": ["x", "y"]}
        }"#;
        let req = ConversionRequest::from_json(raw).unwrap();
        assert_eq!(req.agent, "renderer");
        assert_eq!(req.files, vec!["a.pdf", "b.pdf"]);
        assert_eq!(req.parameters.number(keys::RESOLUTION), Some(150.0));
        assert_eq!(req.parameters.text(keys::IMAGE_FORMAT), Some("jpg"));
        assert_eq!(req.parameters.flag(keys::ANTI_ALIASING), Some(true));
        assert_eq!(
            req.parameters.strings(keys::METADATA),
            Some(vec!["x".to_string(), "y".to_string()])
        );
    }

    #[test]
    fn missing_parameters_and_files_default_to_empty() {
        let req = ConversionRequest::from_json(r#"{"agent":"a","action":"b"}"#).unwrap();
        assert!(req.parameters.is_empty());
        assert!(req.files.is_empty());
    }

    #[test]
    fn malformed_json_is_bad_request() {
        let err = ConversionRequest::from_json("{not json").unwrap_err();
        assert!(matches!(err, ConversionError::BadRequest(_)));
    }

    #[test]
    fn wrong_shapes_read_as_absent() {
        let p = Parameters::new()
            .with(keys::RESOLUTION, true)
            .with(keys::ANTI_ALIASING, "yes")
            .with(keys::IMAGE_FORMAT, 3.0);
        assert_eq!(p.number(keys::RESOLUTION), None);
        assert_eq!(p.flag(keys::ANTI_ALIASING), None);
        assert_eq!(p.text(keys::IMAGE_FORMAT), None);
    }

    #[test]
    fn numeric_strings_are_numbers() {
        let p = Parameters::new().with(keys::TIMEOUT, " 30 ");
        assert_eq!(p.number(keys::TIMEOUT), Some(30.0));
    }
}
