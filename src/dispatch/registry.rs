//! Method registry mapping names to handlers

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;

use crate::rpc::RpcError;

#[async_trait]
pub trait MethodHandler: Send + Sync {
    /// Binds `params` and runs the method. The value returned becomes the
    /// `result` member of the response.
    async fn call(&self, params: Option<&Value>) -> Result<Value, RpcError>;
}

/// Adapts a synchronous closure into a [`MethodHandler`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F> MethodHandler for FnHandler<F>
where
    F: Fn(Option<&Value>) -> Result<Value, RpcError> + Send + Sync,
{
    async fn call(&self, params: Option<&Value>) -> Result<Value, RpcError> {
        (self.0)(params)
    }
}

#[derive(Clone, Default)]
pub struct MethodRegistry {
    methods: BTreeMap<String, Arc<dyn MethodHandler>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        name: impl Into<String>,
        handler: impl MethodHandler + 'static,
    ) -> Self {
        self.methods.insert(name.into(), Arc::new(handler));
        self
    }

    pub fn register_fn<F>(self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Option<&Value>) -> Result<Value, RpcError> + Send + Sync + 'static,
    {
        self.register(name, FnHandler(handler))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn MethodHandler>> {
        self.methods.get(name).cloned()
    }

    pub fn method_names(&self) -> Vec<&str> {
        self.methods.keys().map(String::as_str).collect()
    }
}
