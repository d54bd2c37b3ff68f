// src/core/fs_ops.rs
//! File system helpers shared by config, export workspaces and the CLI

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

use crate::app_log;

pub struct FsOps;

impl FsOps {
    pub async fn ensure_dir_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)
                .await
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
            app_log!(info, "Created directory: {}", path.display());
        }
        Ok(())
    }

    pub async fn read_file_safe(path: &Path) -> Result<String> {
        fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))
    }

    pub async fn read_bytes(path: &Path) -> Result<Vec<u8>> {
        fs::read(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))
    }

    /// Write a file, creating its parent directory first
    pub async fn write_file_safe(path: &Path, content: impl AsRef<[u8]>) -> Result<()> {
        if let Some(parent) = path.parent() {
            Self::ensure_dir_exists(parent).await?;
        }

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write file: {}", path.display()))?;

        app_log!(debug, "Written file: {}", path.display());
        Ok(())
    }

    pub async fn remove_dir_all(path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_dir_all(path)
                .await
                .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
            app_log!(debug, "Removed directory: {}", path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let file = nested.join("note.txt");

        FsOps::write_file_safe(&file, "hello").await.unwrap();
        assert_eq!(FsOps::read_file_safe(&file).await.unwrap(), "hello");
        assert_eq!(FsOps::read_bytes(&file).await.unwrap(), b"hello");

        FsOps::remove_dir_all(&nested).await.unwrap();
        assert!(!nested.exists());
        // removing twice is fine
        FsOps::remove_dir_all(&nested).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_missing_file_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsOps::read_file_safe(&dir.path().join("missing.json"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }
}
