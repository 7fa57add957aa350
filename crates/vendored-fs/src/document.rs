//! JSON object documents
//!
//! Registry files are JSON objects whose unknown keys belong to consumers, so
//! they are handled as `serde_json::Map` and written back in full.

use serde_json::{Map, Value};

use crate::{Error, NormalizedPath, Result, io};

/// Load a JSON object, or `None` if the file does not exist.
pub fn load_object(path: &NormalizedPath) -> Result<Option<Map<String, Value>>> {
    let Some(text) = io::read_text_opt(path)? else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(&text).map_err(|e| Error::JsonParse {
        path: path.to_native(),
        message: e.to_string(),
    })?;
    match value {
        Value::Object(map) => Ok(Some(map)),
        _ => Err(Error::NotAnObject {
            path: path.to_native(),
        }),
    }
}

/// Write a JSON object pretty-printed with a trailing newline.
pub fn save_object(path: &NormalizedPath, object: &Map<String, Value>) -> Result<()> {
    let mut text = serde_json::to_string_pretty(object).map_err(|e| Error::JsonSerialize {
        path: path.to_native(),
        message: e.to_string(),
    })?;
    text.push('\n');
    io::write_text(path, &text)
}
