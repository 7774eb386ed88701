//! Custom serde helpers for backend wire formats.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Str(String),
    Int(i64),
    Uint(u64),
}

/// Deserializes an identifier sent either as a JSON string or a JSON integer.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Str(s) => Ok(s),
        StringOrNumber::Int(n) => Ok(n.to_string()),
        StringOrNumber::Uint(n) => Ok(n.to_string()),
    }
}

/// Deserializes an optional timestamp sent as Unix millis or an RFC 3339 string.
///
/// The live-updates server sends `timestamp` as epoch milliseconds, the REST
/// services send ISO 8601 strings.
pub mod flexible_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Text(String),
    }

    /// Serializes back to RFC 3339, the format the REST services accept.
    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Raw>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(Raw::Millis(ms)) => DateTime::<Utc>::from_timestamp_millis(ms)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("Invalid timestamp: {}", ms))),
            Some(Raw::Text(s)) => DateTime::parse_from_rfc3339(&s)
                .map(|dt| Some(dt.with_timezone(&Utc)))
                .map_err(|e| serde::de::Error::custom(format!("Invalid timestamp {}: {}", s, e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Stamped {
        #[serde(default, with = "super::flexible_timestamp")]
        at: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_timestamp_from_millis() {
        let s: Stamped = serde_json::from_str(r#"{"at": 1740076800000}"#).unwrap();
        assert_eq!(s.at.unwrap().timestamp(), 1_740_076_800);
    }

    #[test]
    fn test_timestamp_from_rfc3339() {
        let s: Stamped = serde_json::from_str(r#"{"at": "2025-02-20T18:40:00Z"}"#).unwrap();
        assert_eq!(s.at.unwrap().timestamp(), 1_740_076_800);
    }

    #[test]
    fn test_timestamp_missing_or_null() {
        let s: Stamped = serde_json::from_str("{}").unwrap();
        assert!(s.at.is_none());
        let s: Stamped = serde_json::from_str(r#"{"at": null}"#).unwrap();
        assert!(s.at.is_none());
    }
}
