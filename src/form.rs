//! URL-encoded form payload parsing.
//!
//! The whole payload is decoded first (`+` to space, then percent escapes),
//! and only then split on `&` and `=`. A decoded value that contains either
//! separator therefore breaks the split and fails the submission. That is
//! the accepted behavior; nothing here tries to recover structure.

use std::str::Utf8Error;

use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a payload was rejected. Any error rejects the whole submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("payload is not valid UTF-8: {0}")]
    NotUtf8(#[from] Utf8Error),

    #[error("field '{token}' has no '=' separator")]
    MissingSeparator { token: String },

    #[error("field '{token}' has more than one '=' separator")]
    ExtraSeparator { token: String },

    #[error("field '{name}' appears more than once")]
    DuplicateField { name: String },
}

/// Parsed field/value pairs of one submission, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields(Vec<(String, String)>);

impl FormFields {
    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Value of the named field, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl From<FormFields> for Value {
    fn from(fields: FormFields) -> Self {
        let map: Map<String, Value> = fields
            .0
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        Value::Object(map)
    }
}

/// Decode a raw payload the way a form body is unquoted: `+` becomes a
/// space, then `%XX` escapes are resolved. Escapes that do not form valid
/// UTF-8 are replaced rather than rejected.
pub fn decode(payload: &[u8]) -> Result<String, ParseError> {
    let text = std::str::from_utf8(payload)?;
    let spaced = text.replace('+', " ");
    Ok(percent_decode_str(&spaced).decode_utf8_lossy().into_owned())
}

/// Decode and split a payload into fields.
pub fn parse(payload: &[u8]) -> Result<FormFields, ParseError> {
    let decoded = decode(payload)?;
    let mut fields: Vec<(String, String)> = Vec::new();

    for token in decoded.split('&') {
        let mut parts = token.split('=');
        let (name, value) = match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(value), None) => (name, value),
            (_, Some(_), Some(_)) => {
                return Err(ParseError::ExtraSeparator {
                    token: token.to_string(),
                })
            }
            _ => {
                return Err(ParseError::MissingSeparator {
                    token: token.to_string(),
                })
            }
        };

        if fields.iter().any(|(k, _)| k == name) {
            return Err(ParseError::DuplicateField {
                name: name.to_string(),
            });
        }
        fields.push((name.to_string(), value.to_string()));
    }

    Ok(FormFields(fields))
}
