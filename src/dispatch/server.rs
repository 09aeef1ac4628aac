//! Message-level JSON-RPC handling
//!
//! Decodes a raw payload, fans batches out item by item, routes each request
//! to its registered handler and applies the notification rules: a
//! notification never produces a response, and a batch made only of
//! notifications produces no output at all.

use serde_json::Value;
use tracing::{error, info};

use crate::dispatch::registry::MethodRegistry;
use crate::rpc::{recover_id, ErrorResponse, Request, Response, ResultResponse, RpcError};

/// Handles a raw request body. Returns `None` when nothing must be sent back.
pub async fn handle_payload(registry: &MethodRegistry, body: &[u8]) -> Option<Value> {
    let payload: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(err) => {
            let response = ErrorResponse::from_error(None, &RpcError::parse(err.to_string()));
            return Some(Response::from(response).to_value());
        }
    };

    let Value::Array(batch) = payload else {
        return handle_value(registry, payload)
            .await
            .map(|response| response.to_value());
    };

    if batch.is_empty() {
        let response = ErrorResponse::from_error(None, &RpcError::invalid_request("empty batch"));
        return Some(Response::from(response).to_value());
    }

    let batch_size = batch.len();
    let mut responses = Vec::with_capacity(batch_size);
    let mut errors = 0usize;
    for item in batch {
        if let Some(response) = handle_value(registry, item).await {
            if response.is_error() {
                errors += 1;
            }
            responses.push(response.to_value());
        }
    }

    info!(
        batch_size,
        responses = responses.len(),
        errors,
        "jsonrpc batch handled"
    );

    if responses.is_empty() {
        return None;
    }

    Some(Value::Array(responses))
}

/// Handles one decoded message, either top-level or a batch item.
pub async fn handle_value(registry: &MethodRegistry, payload: Value) -> Option<Response> {
    let fallback_id = recover_id(&payload);

    match Request::from_value(payload) {
        Ok(request) => handle_request(registry, request).await,
        Err(err) => {
            info!(error = %err, "jsonrpc request rejected");
            Some(err.into_response(fallback_id).into())
        }
    }
}

pub async fn handle_request(registry: &MethodRegistry, request: Request) -> Option<Response> {
    let notification = request.is_notification();

    let result = match registry.get(&request.method) {
        Some(handler) => handler.call(request.params.as_ref()).await,
        None => Err(RpcError::method_not_found(request.method.as_str())),
    };

    match &result {
        Ok(_) => info!(
            method = %request.method,
            notification,
            outcome = "success",
            "jsonrpc call audited"
        ),
        Err(err) if err.is_internal() => error!(
            method = %request.method,
            notification,
            error = %err,
            "jsonrpc call failed with internal error"
        ),
        Err(err) => info!(
            method = %request.method,
            notification,
            outcome = "failure",
            code = err.code(),
            "jsonrpc call audited"
        ),
    }

    if notification {
        return None;
    }

    let id = request.response_id();
    Some(match result {
        Ok(value) => ResultResponse::new(id, value).into(),
        Err(err) => err.into_response(Some(id)).into(),
    })
}
