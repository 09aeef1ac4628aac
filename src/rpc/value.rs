//! Coercion of decoded JSON values into primitive destination kinds
//!
//! Only strings and numbers are coercible. Booleans, nulls and nested
//! containers are rejected as invalid params.

use std::{fmt, str::FromStr};

use serde_json::{Number, Value};

use crate::rpc::error::RpcError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    Integer,
    Float,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = RpcError;

    /// Resolves a declared type name. An unrecognized name is a caller bug,
    /// so it maps to an internal error rather than invalid params.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" | "str" => Ok(Self::String),
            "integer" | "int" | "int32" | "int64" | "i32" | "i64" => Ok(Self::Integer),
            "float" | "float32" | "float64" | "f32" | "f64" | "double" => Ok(Self::Float),
            _ => Err(RpcError::internal(format!(
                "unknown destination kind `{name}`"
            ))),
        }
    }
}

/// A value after coercion into one of the destination kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    String(String),
    Integer(i64),
    Float(f64),
}

impl Coerced {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }
}

pub fn coerce(value: &Value, kind: Kind) -> Result<Coerced, RpcError> {
    match kind {
        Kind::String => to_string(value).map(Coerced::String),
        Kind::Integer => to_int(value).map(Coerced::Integer),
        Kind::Float => to_float(value).map(Coerced::Float),
    }
}

pub fn to_string(value: &Value) -> Result<String, RpcError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => match number.as_f64() {
            Some(float) if number.is_f64() => Ok(format!("{float:.6}")),
            _ => Ok(number.to_string()),
        },
        other => Err(uncoercible(other, Kind::String)),
    }
}

pub fn to_int(value: &Value) -> Result<i64, RpcError> {
    match value {
        Value::Number(number) => number_to_int(number),
        Value::String(text) => text.parse::<i64>().map_err(|_| {
            RpcError::invalid_params(format!("`{text}` is not a base-10 integer literal"))
        }),
        other => Err(uncoercible(other, Kind::Integer)),
    }
}

pub fn to_float(value: &Value) -> Result<f64, RpcError> {
    let malformed =
        |text: &str| RpcError::invalid_params(format!("`{text}` is not a decimal literal"));

    match value {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| RpcError::invalid_params("number is not representable as float")),
        Value::String(text) => match text.parse::<f64>() {
            Ok(float) if float.is_finite() => Ok(float),
            _ => Err(malformed(text)),
        },
        other => Err(uncoercible(other, Kind::Float)),
    }
}

fn number_to_int(number: &Number) -> Result<i64, RpcError> {
    if let Some(integer) = number.as_i64() {
        return Ok(integer);
    }

    if number.is_u64() {
        return Err(RpcError::invalid_params(format!(
            "integer {number} is out of range"
        )));
    }

    // i64::MAX as f64 rounds up to 2^63, hence the exclusive upper bound.
    let truncated = number.as_f64().map(f64::trunc).unwrap_or(f64::NAN);
    if !truncated.is_finite() || truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(RpcError::invalid_params(format!(
            "number {number} is out of integer range"
        )));
    }

    Ok(truncated as i64)
}

fn uncoercible(value: &Value, kind: Kind) -> RpcError {
    RpcError::invalid_params(format!(
        "cannot convert {} to {kind}",
        describe(value)
    ))
}

pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A Rust type that can be produced from a single param value.
pub trait FromParam: Sized {
    const KIND: Kind;

    fn from_param(value: &Value) -> Result<Self, RpcError>;
}

impl FromParam for String {
    const KIND: Kind = Kind::String;

    fn from_param(value: &Value) -> Result<Self, RpcError> {
        to_string(value)
    }
}

impl FromParam for i64 {
    const KIND: Kind = Kind::Integer;

    fn from_param(value: &Value) -> Result<Self, RpcError> {
        to_int(value)
    }
}

impl FromParam for i32 {
    const KIND: Kind = Kind::Integer;

    fn from_param(value: &Value) -> Result<Self, RpcError> {
        let wide = to_int(value)?;
        i32::try_from(wide)
            .map_err(|_| RpcError::invalid_params(format!("integer {wide} is out of range")))
    }
}

impl FromParam for f64 {
    const KIND: Kind = Kind::Float;

    fn from_param(value: &Value) -> Result<Self, RpcError> {
        to_float(value)
    }
}

impl FromParam for f32 {
    const KIND: Kind = Kind::Float;

    fn from_param(value: &Value) -> Result<Self, RpcError> {
        let wide = to_float(value)?;
        let narrow = wide as f32;
        if narrow.is_finite() {
            Ok(narrow)
        } else {
            Err(RpcError::invalid_params(format!(
                "float {wide} is out of range"
            )))
        }
    }
}
