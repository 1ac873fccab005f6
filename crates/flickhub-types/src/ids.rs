//! Lenient id parsing for request payloads.
//!
//! Browser forms and older clients send ids as numbers, numeric strings
//! or empty strings. An empty string means the field is absent.

use serde::{Deserialize, Deserializer, de};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

/// Use with `#[serde(default, deserialize_with = "lenient_id")]`.
pub fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Int(n)) => Ok(Some(n)),
        Some(RawId::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid id `{}`", s)))
        }
    }
}
