//! Discovered-device persistence using JSON file storage

use crate::device::ZigbeeDevice;
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use tokio::fs;

/// Load a JSON list, falling back to an empty one when the file is missing or unreadable
async fn load_list<T: DeserializeOwned>(path: &Path, what: &str) -> Vec<T> {
    let contents = match fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No {} file found at {:?}, starting fresh", what, path);
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!("Failed to read {} file {:?}: {}", what, path, e);
            return Vec::new();
        }
    };

    serde_json::from_str::<Vec<T>>(&contents).unwrap_or_else(|e| {
        tracing::warn!("Failed to parse {} file {:?}: {}", what, path, e);
        Vec::new()
    })
}

/// Write a JSON list atomically (temp file, then rename)
async fn save_list<T: Serialize>(path: &Path, items: &[T]) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(items)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &json).await?;
    fs::rename(&tmp_path, path).await
}

/// Load discovered devices from a JSON file
pub async fn load_devices(path: &Path) -> Vec<ZigbeeDevice> {
    let devices = load_list(path, "devices").await;
    tracing::info!("Loaded {} devices from {:?}", devices.len(), path);
    devices
}

/// Save discovered devices to a JSON file
#[allow(clippy::missing_errors_doc)]
pub async fn save_devices(path: &Path, devices: &[ZigbeeDevice]) -> Result<(), std::io::Error> {
    save_list(path, devices).await?;
    tracing::debug!("Saved {} devices to {:?}", devices.len(), path);
    Ok(())
}
