use base64::{engine::general_purpose, Engine as _};
use tracing::debug;

/// Instruction text sent alongside every receipt image.
///
/// The JSON template lists the full field set of
/// [`ExtractionRecord`](crate::models::ExtractionRecord) with sample values so
/// the model anchors on the shape; the rules carry the normalization the model
/// must apply before answering.
pub const EXTRACTION_PROMPT: &str = r#"You are an AI specialized in extracting structured data from Vietnamese bank transfer receipts and bills (Vietcombank, Techcombank, MB Bank, BIDV, Momo, ZaloPay, VNPay, etc.).

Extract ALL available information from the image. Return the result as a SINGLE JSON OBJECT (not an array):
{
    "status": "Transaction status text (e.g., 'Giao dịch thành công', 'Thành công')",
    "amount": 500000.0,
    "currency": "VND",
    "date": "2025-12-09",
    "time": "12:15:00",
    "sender_name": "NGUYEN HONG THINH",
    "receiver_name": "TRAN THI B",
    "receiver_account": "04249300501",
    "receiver_bank": "TP Bank",
    "transaction_id": "12345678901",
    "content": "Transfer description/note",
    "transfer_type": "Chuyển tiền trong ngân hàng",
    "fee": 0,
    "fee_description": "Miễn phí"
}

Rules:
- IMPORTANT: Return ONLY a single JSON object, NOT an array/list
- amount: Extract as number, remove currency symbols and thousand separators
- currency: 3-letter currency code (e.g., VND, USD)
- date: Convert to YYYY-MM-DD format
- time: Convert to HH:MM:SS format (24-hour)
- fee: Return 0 if "Miễn phí" or free, otherwise return the fee amount as a number
- If sender_name is not explicitly shown, infer from content/description field if possible (e.g., "TRAN GIA BAO chuyen tien" means sender is "TRAN GIA BAO")
- If a field is not visible or illegible, set it to null; never omit a key and never guess
- Do NOT include markdown formatting like ```json"#;

const FALLBACK_MIME_TYPE: &str = "image/jpeg";

/// Image bytes carried inline as base64, tagged with their MIME type.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub mime_type: &'static str,
    pub base64_data: String,
}

impl InlineImage {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            mime_type: detect_mime_type(bytes),
            base64_data: general_purpose::STANDARD.encode(bytes),
        }
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64_data)
    }
}

/// Everything the model provider needs for one extraction call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    pub instructions: &'static str,
    pub image: InlineImage,
}

/// Package raw image bytes with the extraction instructions.
///
/// Pure: no I/O and no resizing, the bytes are embedded as received.
pub fn build_request(image: &[u8]) -> ExtractionRequest {
    let image = InlineImage::from_bytes(image);

    debug!(
        "Built extraction request: {} ({} chars base64)",
        image.mime_type,
        image.base64_data.len()
    );

    ExtractionRequest {
        instructions: EXTRACTION_PROMPT,
        image,
    }
}

/// Guess the MIME type from magic bytes, defaulting to JPEG.
pub fn detect_mime_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        "image/png"
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        "image/gif"
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && bytes[8..12] == *b"WEBP" {
        "image/webp"
    } else if bytes.starts_with(b"BM") {
        "image/bmp"
    } else {
        FALLBACK_MIME_TYPE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: [&str; 14] = [
        "status",
        "amount",
        "currency",
        "date",
        "time",
        "sender_name",
        "receiver_name",
        "receiver_account",
        "receiver_bank",
        "transaction_id",
        "content",
        "transfer_type",
        "fee",
        "fee_description",
    ];

    #[test]
    fn test_prompt_names_every_field() {
        for field in FIELDS {
            assert!(
                EXTRACTION_PROMPT.contains(&format!("\"{field}\"")),
                "prompt is missing {field}"
            );
        }
    }

    #[test]
    fn test_prompt_output_discipline() {
        assert!(EXTRACTION_PROMPT.contains("SINGLE JSON OBJECT"));
        assert!(EXTRACTION_PROMPT.contains("NOT an array"));
        assert!(EXTRACTION_PROMPT.contains("Do NOT include markdown"));
        assert!(EXTRACTION_PROMPT.contains("set it to null"));
        assert!(EXTRACTION_PROMPT.contains("YYYY-MM-DD"));
        assert!(EXTRACTION_PROMPT.contains("HH:MM:SS"));
        assert!(EXTRACTION_PROMPT.contains("Miễn phí"));
        assert!(EXTRACTION_PROMPT.contains("Vietcombank"));
    }

    #[test]
    fn test_detect_mime_type() {
        assert_eq!(
            detect_mime_type(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]),
            "image/jpeg"
        );
        assert_eq!(
            detect_mime_type(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00]),
            "image/png"
        );
        assert_eq!(detect_mime_type(b"GIF89a....."), "image/gif");
        assert_eq!(detect_mime_type(b"RIFF\x00\x00\x00\x00WEBPVP8 "), "image/webp");
        assert_eq!(detect_mime_type(b"BM\x00\x00"), "image/bmp");
    }

    #[test]
    fn test_detect_mime_type_falls_back_to_jpeg() {
        assert_eq!(detect_mime_type(b""), "image/jpeg");
        assert_eq!(detect_mime_type(b"RIFF\x00\x00\x00\x00WAVE"), "image/jpeg");
    }

    #[test]
    fn test_build_request_embeds_bytes_unchanged() {
        let bytes = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x01, 0x02];
        let request = build_request(&bytes);

        assert_eq!(request.instructions, EXTRACTION_PROMPT);
        assert_eq!(request.image.mime_type, "image/png");

        let decoded = general_purpose::STANDARD
            .decode(&request.image.base64_data)
            .unwrap();
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn test_data_url() {
        let image = InlineImage::from_bytes(&[0xFF, 0xD8, 0xFF]);
        assert_eq!(image.to_data_url(), "data:image/jpeg;base64,/9j/");
    }
}
