//! JSON-RPC 2.0 envelopes and parameter binding
//!
//! Everything under this module is synchronous and free of logging and shared
//! state. Dispatching a parsed request to a handler is left to the caller.

pub mod bind;
pub mod envelope;
pub mod error;
pub mod value;

pub use bind::{bind, bind_typed, bind_typed_keyed, Bound, FromParams, ParamsShape, Slot};
pub use envelope::{
    recover_id, ErrorObject, ErrorResponse, Id, Request, Response, ResultResponse, Version,
};
pub use error::{build_error, RpcError};
pub use value::{coerce, to_float, to_int, to_string, Coerced, FromParam, Kind};
