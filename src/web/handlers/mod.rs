pub mod ai_handlers;
pub mod document_handlers;
pub mod export_handlers;
pub mod system_handlers;

pub use ai_handlers::*;
pub use document_handlers::*;
pub use export_handlers::*;
pub use system_handlers::*;
