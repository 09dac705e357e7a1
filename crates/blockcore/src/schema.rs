//! Schema validation for workflow payloads.
//!
//! Every record except [`BlockIOBase`] is closed: unknown keys are rejected
//! and required keys must be present with the right JSON type. Decoding goes
//! through the records' serde derives, so `serde_json::from_str` accepts
//! exactly what this module accepts. A failure names the full path of the
//! offending field, e.g. `nodes[1].ref`.

use crate::block::{Block, BlockIOBase};
use crate::workflow::{Edge, EdgeUpsert, Node, NodeUpsert, Workflow, WorkflowFull, WorkflowUpdate};
use crate::ValidationError;
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use serde_json::Value;
use serde_path_to_error::{Path, Segment};

pub const ROOT: &str = "$";

/// A payload record accepted by [`parse`] and [`from_value`].
pub trait Schema: DeserializeOwned {}

impl Schema for BlockIOBase {}
impl Schema for Block {}
impl Schema for EdgeUpsert {}
impl Schema for NodeUpsert {}
impl Schema for Node {}
impl Schema for Edge {}
impl Schema for Workflow {}
impl Schema for WorkflowUpdate {}
impl Schema for WorkflowFull {}

/// Parse and validate a JSON document.
pub fn parse<T: Schema>(json: &str) -> Result<T, ValidationError> {
    let mut de = serde_json::Deserializer::from_str(json);
    let record = serde_path_to_error::deserialize(&mut de).map_err(validation_error)?;
    de.end().map_err(|e| ValidationError::new(ROOT, e.to_string()))?;
    Ok(record)
}

/// Validate an already-decoded JSON value.
pub fn from_value<T: Schema>(value: &Value) -> Result<T, ValidationError> {
    serde_path_to_error::deserialize(value).map_err(validation_error)
}

fn validation_error(err: serde_path_to_error::Error<serde_json::Error>) -> ValidationError {
    let path = field_path(err.path());
    let inner = err.into_inner();

    if inner.classify() != Category::Data {
        return ValidationError::new(ROOT, inner.to_string());
    }

    let message = data_message(&inner);
    // Missing, unknown and duplicate fields are reported against the
    // enclosing object; point at the field itself.
    if let Some(field) = quoted_field(&message, "missing field `") {
        ValidationError::missing(child(&path, field))
    } else if let Some(field) = quoted_field(&message, "unknown field `") {
        ValidationError::unknown(child(&path, field))
    } else if let Some(field) = quoted_field(&message, "duplicate field `") {
        ValidationError::new(child(&path, field), "duplicate field")
    } else if message.starts_with("invalid type: null") {
        ValidationError::missing(path)
    } else {
        ValidationError::new(path, message)
    }
}

/// The error text without serde_json's trailing position.
fn data_message(err: &serde_json::Error) -> String {
    let full = err.to_string();
    if err.line() == 0 {
        return full;
    }
    let position = format!(" at line {} column {}", err.line(), err.column());
    match full.strip_suffix(&position) {
        Some(message) => message.to_string(),
        None => full,
    }
}

fn quoted_field<'a>(message: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = message.strip_prefix(prefix)?;
    rest.split('`').next()
}

fn field_path(path: &Path) -> String {
    path.iter().fold(ROOT.to_string(), |out, segment| match segment {
        Segment::Seq { index } => element(&out, *index),
        Segment::Map { key } => child(&out, key),
        other => child(&out, &other.to_string()),
    })
}

fn child(path: &str, key: &str) -> String {
    if path == ROOT {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn element(path: &str, index: usize) -> String {
    if path == ROOT {
        format!("[{}]", index)
    } else {
        format!("{}[{}]", path, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn child_paths_from_root() {
        assert_eq!(child(ROOT, "nodes"), "nodes");
        assert_eq!(element("nodes", 2), "nodes[2]");
        assert_eq!(child("nodes[2]", "ref"), "nodes[2].ref");
        assert_eq!(element(ROOT, 0), "[0]");
    }

    #[test]
    fn quoted_field_reads_backticks() {
        assert_eq!(
            quoted_field("unknown field `label`, expected one of `id`", "unknown field `"),
            Some("label")
        );
        assert_eq!(quoted_field("missing field `ref`", "unknown field `"), None);
    }

    #[test]
    fn null_required_field_is_missing() {
        let err = from_value::<Edge>(&json!({"id": null, "source": "a", "target": "b"}))
            .unwrap_err();
        assert_eq!(err, ValidationError::missing("id"));
    }

    #[test]
    fn trailing_characters_are_rejected() {
        let err = parse::<Edge>(r#"{"id": "e", "source": "a", "target": "b"} x"#).unwrap_err();
        assert_eq!(err.path, ROOT);
    }
}
