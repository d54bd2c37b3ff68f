// src/workspace.rs
//! Typst rasterizer: one throwaway workspace directory per render

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use uuid::Uuid;

use crate::app_log;
use crate::core::config_manager::ExportConfig;
use crate::core::FsOps;
use crate::export::{Bitmap, Rasterizer, DEVICE_SCALE};
use crate::image_validator::{ImageErrorType, ImageValidationError, ImageValidator};
use crate::preview::{typst, PhotoSlot, PreviewLayout};

const SOURCE_FILE: &str = "main.typ";
const OUTPUT_FILE: &str = "page.png";
const CSS_DPI: u32 = 96;

pub struct TypstRasterizer {
    typst_bin: String,
    workspace_root: PathBuf,
}

impl TypstRasterizer {
    pub fn new(typst_bin: impl Into<String>, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            typst_bin: typst_bin.into(),
            workspace_root: workspace_root.into(),
        }
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(config.typst_bin.clone(), config.workspace_dir.clone())
    }

    fn ppi() -> u32 {
        CSS_DPI * DEVICE_SCALE
    }

    async fn prepare_workspace(&self, dir: &Path, layout: &PreviewLayout) -> Result<()> {
        FsOps::ensure_dir_exists(dir).await?;

        let photo_file = match &layout.photo {
            PhotoSlot::Image(photo) => {
                let bytes = photo.bytes().map_err(|e| ImageValidationError {
                    error_type: ImageErrorType::UnreadableFile,
                    message: format!("Profile photo could not be decoded: {:#}", e),
                    suggestion: "Upload the photo again".to_string(),
                })?;
                ImageValidator::validate_for_raster(&bytes, photo.mime())?;

                let name = format!("photo.{}", photo.extension());
                FsOps::write_file_safe(&dir.join(&name), &bytes).await?;
                Some(name)
            }
            PhotoSlot::Placeholder(_) => None,
        };

        let source = typst::render_source(layout, photo_file.as_deref())?;
        FsOps::write_file_safe(&dir.join(SOURCE_FILE), source).await?;
        Ok(())
    }

    async fn compile(&self, dir: &Path) -> Result<Bitmap> {
        let output = Command::new(&self.typst_bin)
            .arg("compile")
            .arg(SOURCE_FILE)
            .arg(OUTPUT_FILE)
            .arg("--format")
            .arg("png")
            .arg("--ppi")
            .arg(Self::ppi().to_string())
            .current_dir(dir)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", self.typst_bin))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            anyhow::bail!(
                "Typst compilation failed: stderr={}, stdout={}",
                stderr.trim(),
                stdout.trim()
            );
        }

        let png = FsOps::read_bytes(&dir.join(OUTPUT_FILE)).await?;
        Bitmap::from_png(png)
    }
}

#[async_trait]
impl Rasterizer for TypstRasterizer {
    async fn rasterize(&self, layout: &PreviewLayout) -> Result<Bitmap> {
        let dir = self
            .workspace_root
            .join(format!("render-{}", Uuid::new_v4()));
        app_log!(debug, "Rasterizing in {}", dir.display());

        let result = match self.prepare_workspace(&dir, layout).await {
            Ok(()) => self.compile(&dir).await,
            Err(e) => Err(e),
        };

        if let Err(e) = FsOps::remove_dir_all(&dir).await {
            app_log!(warn, "Failed to clean up workspace: {:#}", e);
        }

        result
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::export::tests::png_of_size;
    use crate::types::{CvDocument, Photo, Theme};
    use std::os::unix::fs::PermissionsExt;

    /// Write an executable shell script standing in for the typst binary
    fn fake_typst(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-typst");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn layout_with(photo: Option<&Photo>) -> PreviewLayout {
        let mut doc = CvDocument::default();
        doc.full_name = "Ada".to_string();
        PreviewLayout::build(&doc, photo, Theme::Light)
    }

    #[tokio::test]
    async fn test_rasterize_runs_typst_and_cleans_up() {
        let tools = tempfile::tempdir().unwrap();
        let fixture = tools.path().join("fixture.png");
        std::fs::write(&fixture, png_of_size(1588, 2246)).unwrap();
        let captured = tools.path().join("captured");

        let script = fake_typst(
            tools.path(),
            &format!(
                "echo \"$@\" > '{c}.args'\ncp main.typ '{c}.typ'\nls > '{c}.files'\ncp '{f}' \"$3\"",
                c = captured.display(),
                f = fixture.display()
            ),
        );

        let workspace = tempfile::tempdir().unwrap();
        let rasterizer = TypstRasterizer::new(script.to_string_lossy(), workspace.path());

        let photo = Photo::from_bytes(&png_of_size(4, 4), None);
        let bitmap = rasterizer.rasterize(&layout_with(Some(&photo))).await.unwrap();
        assert_eq!((bitmap.width, bitmap.height), (1588, 2246));

        let args = std::fs::read_to_string(captured.with_extension("args")).unwrap();
        assert_eq!(args.trim(), "compile main.typ page.png --format png --ppi 192");

        let source = std::fs::read_to_string(captured.with_extension("typ")).unwrap();
        assert!(source.contains("width: 595.5pt"));
        assert!(source.contains("image(\"photo.png\""));

        let files = std::fs::read_to_string(captured.with_extension("files")).unwrap();
        assert!(files.lines().any(|f| f == "photo.png"));

        // the per-render directory is gone
        assert_eq!(std::fs::read_dir(workspace.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_compile_failure_reports_stderr() {
        let tools = tempfile::tempdir().unwrap();
        let script = fake_typst(tools.path(), "echo 'error: unknown font' >&2\nexit 1");
        let workspace = tempfile::tempdir().unwrap();

        let rasterizer = TypstRasterizer::new(script.to_string_lossy(), workspace.path());
        let err = rasterizer.rasterize(&layout_with(None)).await.unwrap_err();
        assert!(err.to_string().contains("unknown font"));
        assert_eq!(std::fs::read_dir(workspace.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unusable_photo_fails_before_compiling() {
        let tools = tempfile::tempdir().unwrap();
        let marker = tools.path().join("ran");
        let script = fake_typst(tools.path(), &format!("touch '{}'", marker.display()));
        let workspace = tempfile::tempdir().unwrap();

        let photo = Photo::from_bytes(b"definitely not an image", Some("image/png"));
        let rasterizer = TypstRasterizer::new(script.to_string_lossy(), workspace.path());
        let err = rasterizer.rasterize(&layout_with(Some(&photo))).await.unwrap_err();

        let validation = err.downcast_ref::<ImageValidationError>().unwrap();
        assert_eq!(validation.error_type, ImageErrorType::WrongFormat);
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let workspace = tempfile::tempdir().unwrap();
        let rasterizer =
            TypstRasterizer::new("/nonexistent/typst-binary", workspace.path());
        assert!(rasterizer.rasterize(&layout_with(None)).await.is_err());
    }
}
