//! Scalar decoders for fields the server sends inconsistently.
//!
//! Status codes and ids arrive as JSON numbers on some endpoints and as
//! numeric strings on others (`"2"` vs `2`), and text fields are
//! sometimes `null`.

use serde::de::{Deserializer, Error};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

/// Decode an integer from a number, a numeric string or a bool.
pub fn int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Scalar::deserialize(deserializer)? {
        Scalar::Int(v) => Ok(v),
        Scalar::Float(v) => Ok(v as i64),
        Scalar::Bool(v) => Ok(i64::from(v)),
        Scalar::Text(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .or_else(|_| trimmed.parse::<f64>().map(|f| f as i64))
                .map_err(|_| D::Error::custom(format!("expected integer, got {s:?}")))
        }
    }
}

/// Decode text from a string or number; `null` becomes empty.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        None => String::new(),
        Some(Scalar::Text(s)) => s,
        Some(Scalar::Int(v)) => v.to_string(),
        Some(Scalar::Float(v)) => v.to_string(),
        Some(Scalar::Bool(v)) => v.to_string(),
    })
}
