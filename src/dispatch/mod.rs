//! Request dispatching on top of the `rpc` primitives
//!
//! Owns method lookup, batch fan-out and audit logging.

pub mod registry;
pub mod server;

pub use registry::{MethodHandler, MethodRegistry};
pub use server::{handle_payload, handle_request, handle_value};
