use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Reads the whole file at `file_path` and deserializes it as JSON.
pub fn parse_json_file<T: DeserializeOwned>(file_path: impl AsRef<Path>) -> Result<T> {
    let file_path = file_path.as_ref();
    log::debug!("Loading JSON from path: '{}'...", file_path.display());

    let json_str = fs::read_to_string(file_path)?;
    let value = serde_json::from_str::<T>(&json_str)?;

    Ok(value)
}
