use bill_extractor::extraction::{
    build_request, normalize_response, parse_record, ExtractionRequest, LlmError,
    NormalizeError, VisionModel, EXTRACTION_PROMPT,
};
use bill_extractor::{ExtractionRecord, ReceiptExtractor};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;

struct EchoModel(String);

#[async_trait]
impl VisionModel for EchoModel {
    async fn complete(&self, _: &ExtractionRequest) -> Result<String, LlmError> {
        Ok(self.0.clone())
    }
}

#[test]
fn test_identity_for_well_typed_object() {
    let raw = r#"{
        "status": "Giao dịch thành công",
        "amount": 1250000,
        "currency": "VND",
        "date": "2024-02-29",
        "time": "23:59:59",
        "sender_name": "TRAN GIA BAO",
        "receiver_name": "NGUYEN VAN A",
        "receiver_account": "0011004455667",
        "receiver_bank": "Vietcombank",
        "transaction_id": "FT24060123456",
        "content": "TRAN GIA BAO chuyen tien",
        "transfer_type": "Chuyển tiền liên ngân hàng",
        "fee": 3300,
        "fee_description": "Phí chuyển tiền"
    }"#;

    let expected = ExtractionRecord {
        status: Some("Giao dịch thành công".to_string()),
        amount: Some(1250000.0),
        currency: Some("VND".to_string()),
        date: NaiveDate::from_ymd_opt(2024, 2, 29),
        time: NaiveTime::from_hms_opt(23, 59, 59),
        sender_name: Some("TRAN GIA BAO".to_string()),
        receiver_name: Some("NGUYEN VAN A".to_string()),
        receiver_account: Some("0011004455667".to_string()),
        receiver_bank: Some("Vietcombank".to_string()),
        transaction_id: Some("FT24060123456".to_string()),
        content: Some("TRAN GIA BAO chuyen tien".to_string()),
        transfer_type: Some("Chuyển tiền liên ngân hàng".to_string()),
        fee: Some(3300.0),
        fee_description: Some("Phí chuyển tiền".to_string()),
    };

    assert_eq!(parse_record(raw).unwrap(), expected);
    assert_eq!(normalize_response(raw), expected);
}

#[test]
fn test_list_equals_first_element_rule() {
    let first = r#"{"currency":"USD","fee":0,"fee_description":"Free"}"#;
    let list = format!("[{first}, {{\"currency\":\"VND\"}}]");

    assert_eq!(normalize_response(&list), normalize_response(first));
}

#[test]
fn test_failure_categories() {
    assert!(matches!(
        parse_record("Here is the JSON: {}"),
        Err(NormalizeError::InvalidJson(_))
    ));
    assert!(matches!(
        parse_record("[]"),
        Err(NormalizeError::UnexpectedList(_))
    ));
    assert!(matches!(
        parse_record("\"receipt\""),
        Err(NormalizeError::UnexpectedType("string"))
    ));
    assert!(matches!(
        parse_record("12.5"),
        Err(NormalizeError::UnexpectedType("number"))
    ));
    assert!(matches!(
        parse_record("null"),
        Err(NormalizeError::UnexpectedType("null"))
    ));
    assert!(matches!(
        parse_record(r#"{"fee":"Miễn phí"}"#),
        Err(NormalizeError::InvalidFields(_))
    ));
}

#[test]
fn test_every_failure_collapses_to_default() {
    for raw in [
        "",
        "not json at all",
        "```json\n{\"amount\":1}\n```",
        "[]",
        "[[{\"amount\":1}]]",
        "true",
        r#"{"amount":true}"#,
        r#"{"date":"2025-13-01"}"#,
    ] {
        assert_eq!(normalize_response(raw), ExtractionRecord::default(), "{raw}");
    }
}

#[test]
fn test_empty_object_is_valid_all_null_record() {
    let record = parse_record("{}").unwrap();
    assert!(record.is_empty());
}

#[test]
fn test_build_request_is_deterministic() {
    let image = b"GIF89a\x01\x00\x01\x00";

    let first = build_request(image);
    let second = build_request(image);

    assert_eq!(first, second);
    assert_eq!(first.instructions, EXTRACTION_PROMPT);
    assert_eq!(first.image.mime_type, "image/gif");
    assert!(first
        .image
        .to_data_url()
        .starts_with("data:image/gif;base64,R0lGODlh"));
}

#[tokio::test]
async fn test_concurrent_extractions_share_one_extractor() {
    let extractor = ReceiptExtractor::new(Arc::new(EchoModel(
        r#"{"amount":42,"currency":"VND"}"#.to_string(),
    )));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let extractor = extractor.clone();
            tokio::spawn(async move { extractor.extract(&[i as u8; 16]).await })
        })
        .collect();

    for handle in handles {
        let record = handle.await.unwrap();
        assert_eq!(record.amount, Some(42.0));
        assert_eq!(record.currency.as_deref(), Some("VND"));
    }
}
