use std::path::Path;

use tracing::debug;

use drdocer_shared::{DrDocerError, Result};

/// Write `content` next to `target` under a dot-prefixed temp name, then
/// rename it into place.
pub(crate) fn write_atomic(target: &Path, content: &[u8]) -> Result<()> {
    let file_name = target
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            DrDocerError::Storage(format!("invalid target path {}", target.display()))
        })?;
    let temp = target.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, content).map_err(|e| DrDocerError::io(&temp, e))?;
    std::fs::rename(&temp, target).map_err(|e| DrDocerError::io(target, e))?;
    Ok(())
}

/// Pretty-print `data` as JSON and write it atomically.
pub(crate) fn write_json<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| DrDocerError::Storage(format!("JSON serialization failed: {e}")))?;
    write_atomic(path, json.as_bytes())?;
    debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}
