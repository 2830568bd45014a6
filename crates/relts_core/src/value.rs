use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::{TsError, TsResult};

/// Scalar kind of a series' `val` column, fixed when the series is provisioned.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Integer,
    Float,
    Text,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "integer" => Some(ValueKind::Integer),
            "float" => Some(ValueKind::Float),
            "text" => Some(ValueKind::Text),
            _ => None,
        }
    }

    /// Checks a scalar against this kind. Integers widen to floats; nothing else converts.
    pub fn coerce(self, value: Scalar) -> TsResult<Scalar> {
        match (self, value) {
            (ValueKind::Integer, Scalar::Integer(value)) => Ok(Scalar::Integer(value)),
            (ValueKind::Float, Scalar::Float(value)) if !value.is_finite() => Err(
                TsError::invalid(format!("float value {value} cannot be stored")),
            ),
            (ValueKind::Float, Scalar::Float(value)) => Ok(Scalar::Float(value)),
            (ValueKind::Float, Scalar::Integer(value)) => Ok(Scalar::Float(value as f64)),
            (ValueKind::Text, Scalar::Text(value)) => Ok(Scalar::Text(value)),
            (kind, value) => Err(TsError::invalid(format!(
                "{} value {value} does not fit a {} series",
                value.kind().as_str(),
                kind.as_str()
            ))),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column definition for the value tables of one series.
///
/// `sql_type` is handed to the database verbatim when set, so it must come from a
/// trusted caller.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ValueSchema {
    pub kind: ValueKind,
    pub sql_type: Option<String>,
}

impl ValueSchema {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            sql_type: None,
        }
    }

    pub fn with_sql_type(kind: ValueKind, sql_type: impl Into<String>) -> Self {
        Self {
            kind,
            sql_type: Some(sql_type.into()),
        }
    }
}

impl Default for ValueSchema {
    fn default() -> Self {
        Self::new(ValueKind::Float)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn kind(&self) -> ValueKind {
        match self {
            Scalar::Integer(_) => ValueKind::Integer,
            Scalar::Float(_) => ValueKind::Float,
            Scalar::Text(_) => ValueKind::Text,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(value) => Some(*value as f64),
            Scalar::Float(value) => Some(*value),
            Scalar::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Integer(value) => write!(f, "{value}"),
            Scalar::Float(value) => write!(f, "{value}"),
            Scalar::Text(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Integer(value.into())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

/// Free-form details attached to a dictionary entry. Stored as JSON and never inspected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(pub Map<String, JsonValue>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> TsResult<String> {
        serde_json::to_string(&self.0)
            .map_err(|err| TsError::invalid(format!("metadata encode: {err}")))
    }

    /// Decodes a stored blob. Missing or `null` blobs read back as empty metadata.
    pub fn from_json(raw: Option<&str>) -> TsResult<Self> {
        let Some(raw) = raw else {
            return Ok(Self::default());
        };
        let value: JsonValue = serde_json::from_str(raw)
            .map_err(|err| TsError::storage("decode metadata", err.to_string()))?;
        match value {
            JsonValue::Null => Ok(Self::default()),
            JsonValue::Object(map) => Ok(Self(map)),
            other => Err(TsError::storage(
                "decode metadata",
                format!("expected a JSON object, found {other}"),
            )),
        }
    }
}

impl From<Map<String, JsonValue>> for Metadata {
    fn from(value: Map<String, JsonValue>) -> Self {
        Self(value)
    }
}
