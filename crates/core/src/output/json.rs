use super::FormatError;
use serde::Serialize;

/// Pretty-printed JSON of a fold map, a grouped map or a single file
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, FormatError> {
    serde_json::to_string_pretty(value).map_err(FormatError::from)
}

/// Single-line JSON
pub fn to_json_compact<T: Serialize + ?Sized>(value: &T) -> Result<String, FormatError> {
    serde_json::to_string(value).map_err(FormatError::from)
}
