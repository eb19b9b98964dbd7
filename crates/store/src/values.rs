//! Placeholder value persistence
//!
//! Values live in a flat `{key: value}` JSON file next to the proposal
//! records. A missing file reads as an empty value set.

use std::io::ErrorKind;
use std::path::Path;

use placeholders::PlaceholderValues;

use crate::error::Result;

/// Load placeholder values from a JSON file
pub async fn load_values(path: impl AsRef<Path>) -> Result<PlaceholderValues> {
    match tokio::fs::read(path.as_ref()).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(PlaceholderValues::default()),
        Err(err) => Err(err.into()),
    }
}

/// Persist placeholder values to a JSON file
pub async fn save_values(path: impl AsRef<Path>, values: &PlaceholderValues) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let bytes = serde_json::to_vec_pretty(values)?;
    tokio::fs::write(path.as_ref(), bytes).await?;
    Ok(())
}
