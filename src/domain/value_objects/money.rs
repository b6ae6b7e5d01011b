use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Financial fields travel as ordinary floats, but payloads that crossed a
/// UI or a spreadsheet import sometimes carry them as strings with currency
/// symbols or locale decimals. Aggregation must go through this normalizer.
pub fn parse_amount(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Value::String(s) => parse_amount_str(s),
        _ => 0.0,
    }
}

fn parse_amount_str(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',' || *c == '-')
        .collect();
    // "1.234,56" and "1,234.56" both appear in imported data: when both
    // separators are present the last one is the decimal point.
    let normalized = if cleaned.contains(',') && cleaned.contains('.') {
        if cleaned.rfind(',') > cleaned.rfind('.') {
            cleaned.replace('.', "").replace(',', ".")
        } else {
            cleaned.replace(',', "")
        }
    } else {
        cleaned.replace(',', ".")
    };
    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Deserializer for currency fields: accepts numbers and stray string
/// encodings, never fails the whole record over a malformed amount.
pub fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(parse_amount).unwrap_or(0.0))
}
