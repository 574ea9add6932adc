use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::fs;
use tracing::warn;

pub async fn ensure_output_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }
    Ok(())
}

/// Sibling of `target` that the artifact is staged in before the rename.
pub fn staging_path(target: &Path, run_id: &str) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(target.file_name().unwrap_or_default());
    name.push(format!(".{run_id}.tmp"));
    target.with_file_name(name)
}

/// Serializes `value` as pretty JSON and replaces `target` in one rename.
///
/// A failed write leaves any previous artifact untouched and removes the
/// staging file. Returns the number of bytes written.
pub async fn write_json_atomic<T: Serialize>(target: &Path, run_id: &str, value: &T) -> Result<u64> {
    ensure_output_dir(target).await?;

    let mut body = serde_json::to_vec_pretty(value).context("Failed to serialize artifact")?;
    body.push(b'\n');

    let staging = staging_path(target, run_id);
    if let Err(err) = stage_and_swap(&staging, target, &body).await {
        if let Err(cleanup) = delete_file_if_exists(&staging).await {
            warn!("Failed to remove staging file: {cleanup:#}");
        }
        return Err(err);
    }
    Ok(body.len() as u64)
}

async fn stage_and_swap(staging: &Path, target: &Path, body: &[u8]) -> Result<()> {
    fs::write(staging, body)
        .await
        .with_context(|| format!("Failed to write {}", staging.display()))?;
    fs::rename(staging, target).await.with_context(|| {
        format!(
            "Failed to move {} into place at {}",
            staging.display(),
            target.display()
        )
    })
}

pub async fn delete_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("Failed to delete {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::json;

    use super::{delete_file_if_exists, staging_path, write_json_atomic};

    #[test]
    fn staging_file_is_hidden_sibling() {
        let staging = staging_path(Path::new("data/stats.json"), "abc");
        assert_eq!(staging, Path::new("data/.stats.json.abc.tmp"));
    }

    #[tokio::test]
    async fn writes_and_replaces_artifact() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("nested").join("stats.json");

        write_json_atomic(&target, "run-1", &json!({ "runId": "run-1" }))
            .await
            .expect("first write");
        let bytes = write_json_atomic(&target, "run-2", &json!({ "runId": "run-2" }))
            .await
            .expect("second write");

        let raw = std::fs::read_to_string(&target).expect("read back");
        assert_eq!(raw.len() as u64, bytes);
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["runId"], "run-2");
        assert!(!staging_path(&target, "run-2").exists());
    }

    #[tokio::test]
    async fn failed_swap_keeps_previous_artifact() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("stats.json");
        write_json_atomic(&target, "run-1", &json!({ "ok": true }))
            .await
            .expect("first write");

        // A directory squatting on the staging path makes the write fail.
        let staging = staging_path(&target, "run-2");
        std::fs::create_dir(&staging).expect("block staging path");
        assert!(write_json_atomic(&target, "run-2", &json!({ "ok": false }))
            .await
            .is_err());

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&target).expect("read")).expect("json");
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn deleting_missing_file_is_ok() {
        let dir = tempfile::tempdir().expect("tempdir");
        delete_file_if_exists(&dir.path().join("absent.json"))
            .await
            .expect("no-op");
    }
}
