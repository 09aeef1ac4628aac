//! HTTP transport for the JSON-RPC dispatcher

pub mod handlers;
