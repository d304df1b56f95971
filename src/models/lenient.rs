// Lenient decoding for spreadsheet cells and snapshot JSON.
// Absent, null or malformed values fall back to defaults instead of failing the document.

use serde_json::Value;

/// Integer prefix of a cell ("12 dias" → 12, "-3" → -3, "abc" → None).
/// Leading whitespace and an optional sign are accepted; parsing stops at the first non-digit.
pub fn parse_int_prefix(s: &str) -> Option<i64> {
    let trimmed = s.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Math.round semantics: halves round towards positive infinity.
pub fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// Non-negative count from any JSON value; anything unusable is 0.
pub fn count_from_value(v: &Value) -> u64 {
    match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| round_half_up(f) as u64))
            .unwrap_or(0),
        Value::String(s) => parse_int_prefix(s).filter(|n| *n > 0).unwrap_or(0) as u64,
        _ => 0,
    }
}

/// Integer from any JSON value, rounding fractional numbers (e.g. a precomputed 7.5 average → 8).
pub fn rounded_from_value(v: &Value) -> i64 {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(round_half_up))
            .unwrap_or(0),
        Value::String(s) => parse_int_prefix(s).unwrap_or(0),
        _ => 0,
    }
}

/// Cell text from any JSON scalar (null → "", numbers/bools → their JSON text).
pub fn cell_from_value(v: Value) -> String {
    match v {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Serde-compatible deserializers for use with `#[serde(deserialize_with = "de::...")]`.
pub mod de {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{count_from_value, rounded_from_value};

    /// null → `T::default()`
    pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// 42, 42.0, "42" → 42; null/garbage → 0
    pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(count_from_value(&Value::deserialize(deserializer)?))
    }

    /// { "2024-01": 3, "2024-02": "x" } → { "2024-01": 3, "2024-02": 0 }
    pub fn count_map<'de, D, K>(deserializer: D) -> Result<BTreeMap<K, u64>, D::Error>
    where
        D: Deserializer<'de>,
        K: Deserialize<'de> + Ord,
    {
        let raw = Option::<BTreeMap<K, Value>>::deserialize(deserializer)?.unwrap_or_default();
        Ok(raw
            .into_iter()
            .map(|(k, v)| (k, count_from_value(&v)))
            .collect())
    }

    /// { "2024-01": 7.5 } → { "2024-01": 8 }
    pub fn rounded_map<'de, D, K>(deserializer: D) -> Result<BTreeMap<K, i64>, D::Error>
    where
        D: Deserializer<'de>,
        K: Deserialize<'de> + Ord,
    {
        let raw = Option::<BTreeMap<K, Value>>::deserialize(deserializer)?.unwrap_or_default();
        Ok(raw
            .into_iter()
            .map(|(k, v)| (k, rounded_from_value(&v)))
            .collect())
    }
}
