// src/export.rs
//! CV export: rasterize the layout, wrap the bitmap in a one-page PDF, name the file.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;

use crate::app_log;
use crate::preview::typst::PT_PER_PX;
use crate::preview::PreviewLayout;
use crate::utils::file_stem_for_name;

/// Device pixels per CSS pixel in the rasterized bitmap
pub const DEVICE_SCALE: u32 = 2;

pub const EXPORT_FAILED_MESSAGE: &str = "Failed to export CV. Please try again.";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("rasterization failed: {0:#}")]
    Rasterize(anyhow::Error),
    #[error("PDF encoding failed: {0:#}")]
    Encode(anyhow::Error),
}

impl ExportError {
    pub fn user_message(&self) -> &'static str {
        EXPORT_FAILED_MESSAGE
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Rasterize(_) => "EXPORT_RASTERIZE_FAILED",
            Self::Encode(_) => "EXPORT_ENCODE_FAILED",
        }
    }
}

/// A PNG-encoded raster of the rendered page, in device pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl Bitmap {
    /// Wrap PNG bytes, reading the dimensions from the header
    pub fn from_png(png: Vec<u8>) -> Result<Self> {
        let (width, height) =
            image::ImageReader::with_format(Cursor::new(&png), image::ImageFormat::Png)
                .into_dimensions()
                .context("Failed to read PNG dimensions")?;
        if width == 0 || height == 0 {
            anyhow::bail!("Rasterized page is empty ({}x{})", width, height);
        }
        Ok(Self { width, height, png })
    }

    /// Page size in points: device pixels divided by the scale, at 0.75pt per CSS pixel
    pub fn page_size_pt(&self) -> (f32, f32) {
        let to_pt = |px: u32| (f64::from(px) / f64::from(DEVICE_SCALE) * PT_PER_PX) as f32;
        (to_pt(self.width), to_pt(self.height))
    }
}

#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Render the layout at the reference width and [`DEVICE_SCALE`]
    async fn rasterize(&self, layout: &PreviewLayout) -> Result<Bitmap>;
}

pub struct PdfEncoder;

impl PdfEncoder {
    /// One page exactly the size of the bitmap, with the bitmap drawn full-page
    pub fn encode(bitmap: &Bitmap) -> Result<Vec<u8>> {
        let rgb = image::load_from_memory_with_format(&bitmap.png, image::ImageFormat::Png)
            .context("Failed to decode rasterized page")?
            .to_rgb8();
        let (page_width, page_height) = bitmap.page_size_pt();

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(rgb.width()),
                "Height" => i64::from(rgb.height()),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8i64,
            },
            rgb.into_raw(),
        ));

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        page_width.into(),
                        0i64.into(),
                        0i64.into(),
                        page_height.into(),
                        0i64.into(),
                        0i64.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .context("Failed to encode page content stream")?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0i64.into(), 0i64.into(), page_width.into(), page_height.into()],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
            "Contents" => content_id,
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1i64,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Producer" => Object::string_literal("cvbuilder"),
            "CreationDate" => Object::string_literal(Utc::now().format("D:%Y%m%d%H%M%SZ").to_string()),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).context("Failed to write PDF")?;
        Ok(bytes)
    }
}

/// Download name for a CV: `Jane Q. Public` -> `Jane_Q._Public.pdf`
pub fn export_filename(full_name: &str) -> String {
    format!("{}.pdf", file_stem_for_name(full_name))
}

#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct Exporter {
    rasterizer: Arc<dyn Rasterizer>,
}

impl Exporter {
    pub fn new(rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self { rasterizer }
    }

    pub async fn export(
        &self,
        layout: &PreviewLayout,
        full_name: &str,
    ) -> Result<ExportedDocument, ExportError> {
        let bitmap = self.rasterizer.rasterize(layout).await.map_err(|e| {
            app_log!(error, "Rasterization failed: {:#}", e);
            ExportError::Rasterize(e)
        })?;
        app_log!(debug, "Rasterized page: {}x{} px", bitmap.width, bitmap.height);

        let bytes = PdfEncoder::encode(&bitmap).map_err(|e| {
            app_log!(error, "PDF encoding failed: {:#}", e);
            ExportError::Encode(e)
        })?;

        let filename = export_filename(full_name);
        app_log!(info, "Exported {} ({} bytes)", filename, bytes.len());
        Ok(ExportedDocument { filename, bytes })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{CvDocument, Theme};

    pub fn png_of_size(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([31, 41, 55]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    /// Rasterizer that returns a fixed bitmap or a fixed error
    pub struct StubRasterizer {
        pub png: Option<Vec<u8>>,
    }

    #[async_trait]
    impl Rasterizer for StubRasterizer {
        async fn rasterize(&self, _layout: &PreviewLayout) -> Result<Bitmap> {
            match &self.png {
                Some(png) => Bitmap::from_png(png.clone()),
                None => anyhow::bail!("typst not found"),
            }
        }
    }

    fn layout() -> PreviewLayout {
        PreviewLayout::build(&CvDocument::default(), None, Theme::Multi)
    }

    fn media_box(pdf: &[u8]) -> Vec<f32> {
        let doc = Document::load_mem(pdf).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();
        doc.get_dictionary(page_id)
            .unwrap()
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_float().unwrap())
            .collect()
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(export_filename("Jane Q. Public"), "Jane_Q._Public.pdf");
        assert_eq!(export_filename(""), "cv.pdf");
    }

    #[test]
    fn test_bitmap_measures_png() {
        let bitmap = Bitmap::from_png(png_of_size(40, 30)).unwrap();
        assert_eq!((bitmap.width, bitmap.height), (40, 30));
        assert!(Bitmap::from_png(b"not a png".to_vec()).is_err());
    }

    #[test]
    fn test_media_box_matches_bitmap() {
        let bitmap = Bitmap::from_png(png_of_size(1588, 2246)).unwrap();
        let pdf = PdfEncoder::encode(&bitmap).unwrap();
        assert!(pdf.starts_with(b"%PDF-1.5"));
        assert_eq!(media_box(&pdf), vec![0.0, 0.0, 595.5, 842.25]);
    }

    #[test]
    fn test_tall_page_is_not_paginated() {
        let bitmap = Bitmap::from_png(png_of_size(16, 5000)).unwrap();
        let pdf = PdfEncoder::encode(&bitmap).unwrap();
        assert_eq!(media_box(&pdf)[3], 1875.0);
    }

    #[tokio::test]
    async fn test_export_success() {
        let exporter = Exporter::new(Arc::new(StubRasterizer {
            png: Some(png_of_size(20, 20)),
        }));
        let exported = exporter.export(&layout(), "Ada Lovelace").await.unwrap();
        assert_eq!(exported.filename, "Ada_Lovelace.pdf");
        assert_eq!(media_box(&exported.bytes), vec![0.0, 0.0, 7.5, 7.5]);
    }

    #[tokio::test]
    async fn test_export_rasterize_failure() {
        let exporter = Exporter::new(Arc::new(StubRasterizer { png: None }));
        let err = exporter.export(&layout(), "x").await.unwrap_err();
        assert!(matches!(err, ExportError::Rasterize(_)));
        assert_eq!(err.user_message(), EXPORT_FAILED_MESSAGE);
    }

    #[test]
    fn test_encode_failure_on_bad_bitmap() {
        let bitmap = Bitmap {
            width: 10,
            height: 10,
            png: vec![0; 16],
        };
        assert!(PdfEncoder::encode(&bitmap).is_err());
    }
}
