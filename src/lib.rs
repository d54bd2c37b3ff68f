//! One-page CV builder: an editable CV document with a themed live preview,
//! AI fill from a job description, and single-page PDF export.

pub mod ai_fill;
pub mod cli;
pub mod core;
pub mod editor;
pub mod export;
pub mod image_validator;
pub mod preview;
pub mod session;
pub mod types;
pub mod utils;
pub mod web;
pub mod workspace;

/// Structured log line at the given `tracing` level
#[macro_export]
macro_rules! app_log {
    ($level:ident, $($arg:tt)+) => {
        ::tracing::$level!($($arg)+)
    };
}

pub use ai_fill::{AiFillAdapter, AiFillError};
pub use cli::{handle_command, Cli};
pub use editor::Update;
pub use export::{ExportError, Exporter};
pub use session::CvSession;
pub use types::{CvDocument, Theme};
pub use web::{build_rocket, start_web_server};
