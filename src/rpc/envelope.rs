//! Typed JSON-RPC 2.0 envelopes
//!
//! Parses inbound requests with explicit schema validation and builds the two
//! response shapes. Every envelope produced here carries `"jsonrpc": "2.0"`.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

use crate::rpc::error::RpcError;

pub const JSONRPC_VERSION: &str = "2.0";

/// The literal protocol version marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Version;

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(JSONRPC_VERSION)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        if value == JSONRPC_VERSION {
            Ok(Version)
        } else {
            Err(de::Error::custom(format!(
                "unsupported jsonrpc version `{value}`"
            )))
        }
    }
}

/// Request identifier. Absence of an id is modelled as `Option<Id>::None`,
/// which is distinct from an explicit `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Null,
    Number(Number),
    String(String),
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl TryFrom<Value> for Id {
    type Error = RpcError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Number(number) => Ok(Self::Number(number)),
            Value::String(string) => Ok(Self::String(string)),
            Value::Bool(_) | Value::Array(_) | Value::Object(_) => Err(
                RpcError::invalid_request("id must be a string, a number, or null"),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub jsonrpc: Version,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
}

impl Request {
    pub fn parse(bytes: &[u8]) -> Result<Self, RpcError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|err| RpcError::parse(err.to_string()))?;
        Self::from_value(value)
    }

    /// Validates an already decoded value against the request schema.
    pub fn from_value(value: Value) -> Result<Self, RpcError> {
        let Value::Object(mut object) = value else {
            return Err(RpcError::invalid_request("request must be an object"));
        };

        match object.remove("jsonrpc") {
            Some(Value::String(version)) if version == JSONRPC_VERSION => {}
            Some(_) => return Err(RpcError::invalid_request("jsonrpc must be \"2.0\"")),
            None => return Err(RpcError::invalid_request("jsonrpc is required")),
        }

        let method = match object.remove("method") {
            Some(Value::String(method)) => method,
            Some(_) => return Err(RpcError::invalid_request("method must be a string")),
            None => return Err(RpcError::invalid_request("method is required")),
        };

        let id = object.remove("id").map(Id::try_from).transpose()?;
        let params = object.remove("params");

        Ok(Self {
            jsonrpc: Version,
            method,
            params,
            id,
        })
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// The id a response to this request must carry.
    pub fn response_id(&self) -> Id {
        self.id.clone().unwrap_or(Id::Null)
    }
}

/// Pulls a usable id out of a payload that failed request validation.
pub fn recover_id(value: &Value) -> Option<Id> {
    value
        .as_object()
        .and_then(|object| object.get("id"))
        .cloned()
        .and_then(|id| Id::try_from(id).ok())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultResponse {
    pub jsonrpc: Version,
    pub result: Value,
    pub id: Id,
}

impl ResultResponse {
    pub fn new(id: Id, result: Value) -> Self {
        Self {
            jsonrpc: Version,
            result,
            id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub jsonrpc: Version,
    pub error: ErrorObject,
    pub id: Id,
}

impl ErrorResponse {
    pub fn new(id: Id, code: i16, message: &str) -> Self {
        Self {
            jsonrpc: Version,
            error: ErrorObject {
                code,
                message: message.to_string(),
                data: None,
            },
            id,
        }
    }

    /// Used when no request could be recovered, e.g. on a top-level parse failure.
    pub fn without_id(code: i16, message: &str) -> Self {
        Self::new(Id::Null, code, message)
    }

    pub fn from_error(id: Option<Id>, err: &RpcError) -> Self {
        let mut response = Self::new(id.unwrap_or(Id::Null), err.code(), err.wire_message());
        response.error.data = err.data();
        response
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Result(ResultResponse),
    Error(ErrorResponse),
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("jsonrpc response serialization")
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

impl From<ResultResponse> for Response {
    fn from(response: ResultResponse) -> Self {
        Self::Result(response)
    }
}

impl From<ErrorResponse> for Response {
    fn from(response: ErrorResponse) -> Self {
        Self::Error(response)
    }
}
