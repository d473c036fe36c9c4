//! Conversions between raw input text, typed values and JSON for each field type.
//!
//! Form population, validation and collection all go through here so each
//! type's coercion rule lives in one place.

use crate::model::FieldType;
use chrono::{DateTime, NaiveDate};
use serde_json::Value;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error("Invalid {expected} value: {raw}")]
    Invalid { expected: FieldType, raw: String },
    #[error("Unsupported JSON value for {expected}: {value}")]
    Json { expected: FieldType, value: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Number(f64),
    Date(NaiveDate),
    Boolean(bool),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Text(_) => FieldType::String,
            Self::Integer(_) => FieldType::Integer,
            Self::Number(_) => FieldType::Number,
            Self::Date(_) => FieldType::Date,
            Self::Boolean(_) => FieldType::Boolean,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Integer(n) => Value::from(*n),
            // Finite by construction, so from_f64 cannot fail
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
            Self::Boolean(b) => Value::Bool(*b),
        }
    }
}

impl FieldType {
    /// Parses form input. Blank input means "no value".
    pub fn decode(&self, raw: &str) -> Result<Option<FieldValue>, CodecError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let invalid = || CodecError::Invalid {
            expected: *self,
            raw: raw.to_string(),
        };

        let value = match self {
            Self::String => FieldValue::Text(trimmed.to_string()),
            Self::Integer => FieldValue::Integer(trimmed.parse().map_err(|_| invalid())?),
            Self::Number => {
                let n: f64 = trimmed.parse().map_err(|_| invalid())?;
                if !n.is_finite() {
                    return Err(invalid());
                }
                FieldValue::Number(n)
            }
            Self::Date => {
                FieldValue::Date(NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| invalid())?)
            }
            Self::Boolean => match trimmed {
                "true" => FieldValue::Boolean(true),
                "false" => FieldValue::Boolean(false),
                _ => return Err(invalid()),
            },
        };
        Ok(Some(value))
    }

    /// Text placed back into an input.
    pub fn encode(&self, value: &FieldValue) -> String {
        match value {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Integer(n) => n.to_string(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Date(d) => d.format(DATE_FORMAT).to_string(),
            FieldValue::Boolean(b) => b.to_string(),
        }
    }

    /// Reads a stored record value. Null means "no value".
    pub fn from_json(&self, value: &Value) -> Result<Option<FieldValue>, CodecError> {
        let unsupported = || CodecError::Json {
            expected: *self,
            value: value.clone(),
        };

        match (self, value) {
            (_, Value::Null) => Ok(None),
            (Self::String, Value::String(s)) => Ok(Some(FieldValue::Text(s.clone()))),
            (Self::String, Value::Number(n)) => Ok(Some(FieldValue::Text(n.to_string()))),
            (Self::String, Value::Bool(b)) => Ok(Some(FieldValue::Text(b.to_string()))),
            (Self::Integer, Value::Number(n)) => n
                .as_i64()
                .map(|n| Some(FieldValue::Integer(n)))
                .ok_or_else(unsupported),
            (Self::Number, Value::Number(n)) => n
                .as_f64()
                .map(|n| Some(FieldValue::Number(n)))
                .ok_or_else(unsupported),
            (Self::Boolean, Value::Bool(b)) => Ok(Some(FieldValue::Boolean(*b))),
            (Self::Date, Value::String(s)) => {
                // Records may carry full timestamps; only the day is edited
                if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                    return Ok(Some(FieldValue::Date(ts.date_naive())));
                }
                self.decode(s).map_err(|_| unsupported())
            }
            (_, Value::String(s)) => self.decode(s).map_err(|_| unsupported()),
            _ => Err(unsupported()),
        }
    }
}
