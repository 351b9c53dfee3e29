pub mod llm;
#[cfg(test)]
mod log_capture;
pub mod normalizer;
pub mod processor;
pub mod prompt;

pub use llm::{LlmError, OpenRouterClient, VisionModel};
pub use normalizer::{normalize_response, parse_record, NormalizeError};
pub use processor::ReceiptExtractor;
pub use prompt::{build_request, detect_mime_type, ExtractionRequest, InlineImage, EXTRACTION_PROMPT};
