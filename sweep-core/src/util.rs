//! Contains a collection of useful utility functions.

use std::fs::read;
use std::path::Path;

use crate::error::Error;
use crate::Result;

/// Create a static deser object from given path using serde.
///
/// Format is selected based on the file extension.
pub fn deser_struct_from_path<T>(file_path: &Path) -> Result<T>
where
    for<'de> T: serde::Deserialize<'de>,
{
    let ext = file_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string();
    let bytes = read(file_path)?;
    let d: T = match ext.as_str() {
        "toml" => toml::from_slice(&bytes)?,
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => serde_yaml::from_slice(&bytes)?,
        _ => {
            return Err(Error::UnsupportedConfigFormat(
                file_path.to_string_lossy().to_string(),
            ))
        }
    };
    Ok(d)
}
