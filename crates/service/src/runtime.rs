//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` to keep binary crates importing
//! `service::runtime::ensure_env` without depending directly on `common`.

/// Ensure the export file's directory exists before the first export.
pub async fn ensure_env(export_path: &str) -> anyhow::Result<()> {
    common::env::ensure_parent_dir(export_path).await
}
