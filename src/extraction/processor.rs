use crate::config::Config;
use crate::extraction::llm::{LlmError, OpenRouterClient, VisionModel};
use crate::extraction::normalizer::normalize_response;
use crate::extraction::prompt::build_request;
use crate::models::ExtractionRecord;

use std::sync::Arc;
use tracing::{error, info};

/// Runs one receipt image through the model and normalizes the reply.
///
/// Holds no per-call state, so a single instance is shared across requests.
#[derive(Clone)]
pub struct ReceiptExtractor {
    model: Arc<dyn VisionModel>,
}

impl ReceiptExtractor {
    pub fn new(model: Arc<dyn VisionModel>) -> Self {
        Self { model }
    }

    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let client = OpenRouterClient::new(config)?;
        Ok(Self::new(Arc::new(client)))
    }

    /// Always yields a record. Transport failures are logged and become the
    /// all-null record, the same value a reply with no legible fields gives.
    pub async fn extract(&self, image: &[u8]) -> ExtractionRecord {
        let request = build_request(image);

        let raw = match self.model.complete(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                error!("Error extracting bill data: {}", e);
                return ExtractionRecord::default();
            }
        };

        let record = normalize_response(&raw);
        info!(
            "Extraction finished ({} bytes in, empty record: {})",
            image.len(),
            record.is_empty()
        );
        record
    }
}
