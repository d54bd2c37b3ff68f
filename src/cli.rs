// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::ai_fill::AiFillAdapter;
use crate::app_log;
use crate::core::{ConfigManager, FsOps, GeminiClient};
use crate::export::{Exporter, Rasterizer};
use crate::preview::{html, PreviewLayout};
use crate::session::CvSession;
use crate::types::{CvDocument, Photo, Theme};
use crate::web::start_web_server;
use crate::workspace::TypstRasterizer;

#[derive(Parser)]
#[command(name = "cvbuilder")]
#[command(about = "Edit, preview, AI-fill and export a one-page CV")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (defaults to ./cvbuilder.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server with the live preview
    Serve {
        /// Seed the session with a CV JSON file
        #[arg(long)]
        document: Option<PathBuf>,
    },
    /// Render the preview page of a CV JSON file as HTML
    Preview {
        document: PathBuf,
        #[arg(long, default_value = "multi")]
        theme: Theme,
        #[arg(long)]
        photo: Option<PathBuf>,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export a CV JSON file as a one-page PDF
    Export {
        document: PathBuf,
        #[arg(long, default_value = "multi")]
        theme: Theme,
        #[arg(long)]
        photo: Option<PathBuf>,
        /// Output directory (defaults to the configured output dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate a CV from a job description with the AI service
    Generate {
        prompt: String,
        /// Write the JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub async fn handle_command(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigManager::load_from(path)?,
        None => ConfigManager::load()?,
    };

    match cli.command {
        Command::Serve { document } => {
            let session = match document {
                Some(path) => CvSession::with_document(load_document(&path).await?),
                None => CvSession::new(),
            };
            start_web_server(config, session).await
        }

        Command::Preview {
            document,
            theme,
            photo,
            output,
        } => {
            let doc = load_document(&document).await?;
            let layout = load_layout(&doc, photo.as_deref(), theme).await?;
            let page = html::render_page(&layout)?;
            match output {
                Some(path) => {
                    FsOps::write_file_safe(&path, page).await?;
                    app_log!(info, "Preview written to {}", path.display());
                }
                None => println!("{}", page),
            }
            Ok(())
        }

        Command::Export {
            document,
            theme,
            photo,
            output,
        } => {
            config.ensure_directories().await?;
            let rasterizer = Arc::new(TypstRasterizer::from_config(&config.export));
            let out_dir = output.unwrap_or_else(|| config.export.output_dir.clone());
            let path = export_to_dir(
                rasterizer,
                &document,
                photo.as_deref(),
                theme,
                &out_dir,
            )
            .await?;
            app_log!(info, "✅ PDF exported to {}", path.display());
            Ok(())
        }

        Command::Generate { prompt, output } => {
            if prompt.trim().is_empty() {
                anyhow::bail!("Prompt is empty: describe the role to generate a CV for");
            }
            let client = GeminiClient::new(&config.ai)?;
            let adapter = AiFillAdapter::new(Arc::new(client));
            let document = adapter
                .generate(&prompt)
                .await
                .map_err(|e| anyhow::anyhow!("{} ({})", e.user_message(), e))?;
            let json = document.to_json_pretty()?;
            match output {
                Some(path) => {
                    FsOps::write_file_safe(&path, json).await?;
                    app_log!(info, "Generated CV written to {}", path.display());
                }
                None => println!("{}", json),
            }
            Ok(())
        }
    }
}

async fn load_document(path: &Path) -> Result<CvDocument> {
    let text = FsOps::read_file_safe(path).await?;
    CvDocument::from_json(&text).with_context(|| format!("Invalid CV JSON: {}", path.display()))
}

async fn load_layout(doc: &CvDocument, photo: Option<&Path>, theme: Theme) -> Result<PreviewLayout> {
    let photo = match photo {
        Some(path) => Some(Photo::from_bytes(&FsOps::read_bytes(path).await?, None)),
        None => None,
    };
    Ok(PreviewLayout::build(doc, photo.as_ref(), theme))
}

/// Export `document` into `out_dir`, returning the written file
pub async fn export_to_dir(
    rasterizer: Arc<dyn Rasterizer>,
    document: &Path,
    photo: Option<&Path>,
    theme: Theme,
    out_dir: &Path,
) -> Result<PathBuf> {
    let doc = load_document(document).await?;
    let layout = load_layout(&doc, photo, theme).await?;

    let exported = Exporter::new(rasterizer)
        .export(&layout, &doc.full_name)
        .await
        .map_err(|e| anyhow::anyhow!("{} ({})", e.user_message(), e))?;

    FsOps::ensure_dir_exists(out_dir).await?;
    let path = out_dir.join(&exported.filename);
    FsOps::write_file_safe(&path, &exported.bytes).await?;
    Ok(path)
}
