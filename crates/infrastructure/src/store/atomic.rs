use domain::{AppraisalError, AppraisalResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Replace `path` with `contents` via a sibling temp file and a rename.
///
/// Readers see either the old file or the complete new one. On failure the
/// temp file is removed and the old file is untouched.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> AppraisalResult<()> {
    let persistence = |reason: String| AppraisalError::persistence(path.display().to_string(), reason);

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)
        .await
        .map_err(|e| persistence(format!("cannot create {}: {e}", parent.display())))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| persistence("path has no file name".to_string()))?;
    let temp_path = parent.join(format!(".{file_name}.tmp"));

    if let Err(e) = write_and_sync(&temp_path, contents).await {
        cleanup(&temp_path).await;
        return Err(persistence(format!("writing temp file: {e}")));
    }

    if let Err(e) = fs::rename(&temp_path, path).await {
        cleanup(&temp_path).await;
        return Err(persistence(format!("replacing file: {e}")));
    }

    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

async fn write_and_sync(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(contents).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}

async fn cleanup(temp_path: &Path) {
    if let Ok(meta) = fs::metadata(temp_path).await {
        if meta.is_file() {
            if let Err(e) = fs::remove_file(temp_path).await {
                warn!("Could not remove {}: {}", temp_path.display(), e);
            }
        }
    }
}
