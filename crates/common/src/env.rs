//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::warn;

/// Ensure the data and upload directories exist; warn if static assets are missing.
pub async fn ensure_env(public_dir: &str, data_dir: &str, upload_dir: &str) -> anyhow::Result<()> {
    if tokio::fs::metadata(public_dir).await.is_err() {
        warn!(%public_dir, "public assets directory not found; static assets may 404");
    }
    for dir in [data_dir, upload_dir] {
        if dir.is_empty() {
            continue;
        }
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| anyhow::anyhow!("cannot create {dir}: {e}"))?;
    }
    Ok(())
}
