//! Content unit loading.

use std::path::Path;

use serde_json::Value;
use tokio::fs;

use crate::domain::ContentUnit;
use crate::error::{BuildError, BuildResult};

/// Read and parse one content file
pub async fn load_unit(path: &Path) -> BuildResult<ContentUnit> {
    let text = fs::read_to_string(path)
        .await
        .map_err(|e| BuildError::io(path, e))?;
    parse_unit(path, &text)
}

/// Parse file text into a unit. The top level must be a JSON object.
pub fn parse_unit(path: &Path, text: &str) -> BuildResult<ContentUnit> {
    let value: Value = serde_json::from_str(text).map_err(|e| BuildError::MalformedInput {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    match value {
        Value::Object(object) => Ok(ContentUnit::from_object(path, object)),
        other => Err(BuildError::MalformedInput {
            path: path.to_path_buf(),
            reason: format!("expected a JSON object, found {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
