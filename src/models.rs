use chrono::{NaiveDate, NaiveTime};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Normalized fields of a single bank/e-wallet transfer receipt.
///
/// Every field is optional; a record with nothing set is the value returned
/// whenever extraction produced no usable data.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRecord {
    pub status: Option<String>,

    #[serde(deserialize_with = "deserialize_decimal")]
    pub amount: Option<f64>,

    pub currency: Option<String>,

    #[serde(with = "date_format")]
    pub date: Option<NaiveDate>,

    #[serde(with = "time_format")]
    pub time: Option<NaiveTime>,

    pub sender_name: Option<String>,

    pub receiver_name: Option<String>,

    pub receiver_account: Option<String>,

    pub receiver_bank: Option<String>,

    pub transaction_id: Option<String>,

    pub content: Option<String>,

    pub transfer_type: Option<String>,

    #[serde(deserialize_with = "deserialize_decimal")]
    pub fee: Option<f64>,

    pub fee_description: Option<String>,
}

impl ExtractionRecord {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DecimalRepr {
    Number(f64),
    Text(String),
}

// Numbers pass through; numeric strings like "500000" or "0.5" are accepted.
fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<DecimalRepr>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(DecimalRepr::Number(n)) => n,
        Some(DecimalRepr::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid decimal: {text:?}")))?,
    };

    if !value.is_finite() {
        return Err(D::Error::custom(format!("non-finite decimal: {value}")));
    }

    Ok(Some(value))
}

/// `YYYY-MM-DD`, accepted only in exactly that form.
mod date_format {
    use chrono::NaiveDate;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(text) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };

        NaiveDate::parse_from_str(&text, FORMAT)
            .ok()
            .filter(|d| d.format(FORMAT).to_string() == text)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid date: {text:?}")))
    }
}

/// `HH:MM:SS`, 24h, no fractional or leap seconds.
mod time_format {
    use chrono::{NaiveTime, Timelike};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M:%S";

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => serializer.serialize_str(&t.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(text) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };

        // chrono keeps a leap second as nanosecond >= 1e9
        NaiveTime::parse_from_str(&text, FORMAT)
            .ok()
            .filter(|t| t.nanosecond() < 1_000_000_000)
            .filter(|t| t.format(FORMAT).to_string() == text)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid time: {text:?}")))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
