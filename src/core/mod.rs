// src/core/mod.rs
//! Shared services: configuration, file system, the generative-service client
//! and the page templates

pub mod config_manager;
pub mod fs_ops;
pub mod service_client;
pub mod template_engine;

pub use config_manager::ConfigManager;
pub use fs_ops::FsOps;
pub use service_client::{ContentGenerator, GeminiClient};
pub use template_engine::TemplateEngine;
