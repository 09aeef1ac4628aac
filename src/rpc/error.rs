//! Reserved JSON-RPC error codes and the structured error value every core
//! operation returns.

use serde_json::{json, Value};
use thiserror::Error;

use crate::rpc::envelope::{ErrorResponse, Id};

pub const PARSE_ERROR: i16 = -32700;
pub const INVALID_REQUEST: i16 = -32600;
pub const METHOD_NOT_FOUND: i16 = -32601;
pub const INVALID_PARAMS: i16 = -32602;
pub const INTERNAL_ERROR: i16 = -32603;
pub const SERVER_ERROR: i16 = -32000;

/// Lowest code of the implementation-defined server error range.
pub const SERVER_ERROR_RANGE_MIN: i16 = -32099;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RpcError {
    #[error("parse error: {message}")]
    Parse { message: String },
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
    #[error("method not found: {method}")]
    MethodNotFound { method: String },
    #[error("invalid params: {message}")]
    InvalidParams { message: String },
    #[error("internal error: {message}")]
    Internal { message: String },
    #[error("server error {code}: {message}")]
    Server { code: i16, message: String },
}

impl RpcError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            method: method.into(),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Builds an implementation-defined error. Codes outside
    /// `-32099..=-32000` are clamped to [`SERVER_ERROR`].
    pub fn server(code: i16, message: impl Into<String>) -> Self {
        let code = if (SERVER_ERROR_RANGE_MIN..=SERVER_ERROR).contains(&code) {
            code
        } else {
            SERVER_ERROR
        };
        Self::Server {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> i16 {
        match self {
            Self::Parse { .. } => PARSE_ERROR,
            Self::InvalidRequest { .. } => INVALID_REQUEST,
            Self::MethodNotFound { .. } => METHOD_NOT_FOUND,
            Self::InvalidParams { .. } => INVALID_PARAMS,
            Self::Internal { .. } => INTERNAL_ERROR,
            Self::Server { code, .. } => *code,
        }
    }

    /// The fixed message placed in the envelope's `error.message`.
    pub fn wire_message(&self) -> &str {
        match self {
            Self::Parse { .. } => "Parse error",
            Self::InvalidRequest { .. } => "Invalid Request",
            Self::MethodNotFound { .. } => "Method not found",
            Self::InvalidParams { .. } => "Invalid params",
            Self::Internal { .. } => "Internal error",
            Self::Server { message, .. } => message.as_str(),
        }
    }

    /// Detail carried in `error.data`, if any.
    pub fn data(&self) -> Option<Value> {
        match self {
            Self::Parse { message }
            | Self::InvalidRequest { message }
            | Self::InvalidParams { message }
            | Self::Internal { message } => Some(json!({ "detail": message })),
            Self::MethodNotFound { method } => Some(json!({ "method": method })),
            Self::Server { .. } => None,
        }
    }

    pub fn is_invalid_params(&self) -> bool {
        matches!(self, Self::InvalidParams { .. })
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    pub fn into_response(self, id: Option<Id>) -> ErrorResponse {
        ErrorResponse::from_error(id, &self)
    }
}

/// Assembles an error envelope from a bare code/message pair.
pub fn build_error(id: Option<Id>, code: i16, message: &str) -> ErrorResponse {
    ErrorResponse::new(id.unwrap_or(Id::Null), code, message)
}
