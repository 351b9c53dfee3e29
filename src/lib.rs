pub mod config;
pub mod extraction;
pub mod handlers;
pub mod models;

pub use config::{Config, ConfigError};
pub use extraction::{ReceiptExtractor, VisionModel};
pub use models::ExtractionRecord;
