//! Reference methods served over JSON-RPC
//!
//! Each handler prepares its arguments through the binder, so params shape
//! and coercion failures surface as `Invalid params` responses.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::dispatch::{MethodHandler, MethodRegistry};
use crate::rpc::{
    bind, bind_typed, bind_typed_keyed, Bound, Coerced, Kind, ParamsShape, RpcError, Slot,
};

pub fn build_registry() -> MethodRegistry {
    MethodRegistry::new()
        .register("subtract", Subtract)
        .register("sum", Sum)
        .register("update", Update)
        .register("notify_hello", NotifyHello)
        .register("get_data", GetData)
        .register("echo", Echo)
}

/// `minuend - subtrahend`, positional or named.
pub struct Subtract;

#[async_trait]
impl MethodHandler for Subtract {
    async fn call(&self, params: Option<&Value>) -> Result<Value, RpcError> {
        let (minuend, subtrahend): (i64, i64) =
            bind_typed_keyed(params, &["minuend", "subtrahend"])?;

        minuend
            .checked_sub(subtrahend)
            .map(Value::from)
            .ok_or_else(|| RpcError::server(-32001, "integer overflow"))
    }
}

/// Adds any number of positional integers.
pub struct Sum;

#[async_trait]
impl MethodHandler for Sum {
    async fn call(&self, params: Option<&Value>) -> Result<Value, RpcError> {
        let operands = bind_all(params, Kind::Integer)?;

        operands
            .into_values()
            .iter()
            .filter_map(Coerced::as_i64)
            .try_fold(0i64, |total, operand| total.checked_add(operand))
            .map(Value::from)
            .ok_or_else(|| RpcError::server(-32001, "integer overflow"))
    }
}

/// Accepts a list of integers and discards it.
pub struct Update;

#[async_trait]
impl MethodHandler for Update {
    async fn call(&self, params: Option<&Value>) -> Result<Value, RpcError> {
        bind_all(params, Kind::Integer)?;
        Ok(Value::Null)
    }
}

pub struct NotifyHello;

#[async_trait]
impl MethodHandler for NotifyHello {
    async fn call(&self, params: Option<&Value>) -> Result<Value, RpcError> {
        let (value,): (i64,) = bind_typed(params)?;
        Ok(json!(format!("hello {value}")))
    }
}

pub struct GetData;

#[async_trait]
impl MethodHandler for GetData {
    async fn call(&self, params: Option<&Value>) -> Result<Value, RpcError> {
        if params.is_some() {
            bind(params, &[])?;
        }
        Ok(json!(["hello", 5]))
    }
}

/// Returns its single argument as a string.
pub struct Echo;

#[async_trait]
impl MethodHandler for Echo {
    async fn call(&self, params: Option<&Value>) -> Result<Value, RpcError> {
        let (text,): (String,) = bind_typed_keyed(params, &["text"])?;
        Ok(Value::String(text))
    }
}

/// Binds every param, whatever the count, to the same kind.
fn bind_all(params: Option<&Value>, kind: Kind) -> Result<Bound, RpcError> {
    let count = ParamsShape::classify(params)?.len();
    bind(params, &vec![Slot::new(kind); count])
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    async fn invoke(method: &str, params: Value) -> Result<Value, RpcError> {
        build_registry()
            .get(method)
            .expect("registered method")
            .call(Some(&params))
            .await
    }

    #[tokio::test]
    async fn subtract_accepts_string_numbers() {
        assert_eq!(
            invoke("subtract", json!(["42", 23.7])).await.expect("call"),
            json!(19)
        );
    }

    #[tokio::test]
    async fn subtract_named_requires_both_keys() {
        let err = invoke("subtract", json!({"minuend": 42, "x": 1}))
            .await
            .expect_err("missing key");
        assert!(err.is_invalid_params());
    }

    #[tokio::test]
    async fn subtract_overflow_is_server_error() {
        let err = invoke("subtract", json!([i64::MIN, 1]))
            .await
            .expect_err("overflow");
        assert_eq!(err.code(), -32001);
    }

    #[tokio::test]
    async fn sum_adds_any_count() {
        assert_eq!(invoke("sum", json!([1, 2, 4])).await.expect("call"), json!(7));
        assert_eq!(invoke("sum", json!([])).await.expect("call"), json!(0));
    }

    #[tokio::test]
    async fn sum_rejects_booleans() {
        let err = invoke("sum", json!([1, true])).await.expect_err("bool operand");
        assert!(err.is_invalid_params());
    }

    #[tokio::test]
    async fn get_data_rejects_unexpected_params() {
        let err = invoke("get_data", json!([1])).await.expect_err("extra param");
        assert!(err.is_invalid_params());
        assert_eq!(invoke("get_data", json!([])).await.expect("call"), json!(["hello", 5]));
    }

    #[tokio::test]
    async fn echo_formats_numbers() {
        assert_eq!(invoke("echo", json!([3.5])).await.expect("call"), json!("3.500000"));
        assert_eq!(
            invoke("echo", json!({"text": "hi"})).await.expect("call"),
            json!("hi")
        );
    }
}
