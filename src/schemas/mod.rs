//! Wire schemas for the inbound endpoint and the two upstream APIs
//!
//! The upstream schemas only model the fields this service sends or reads. Everything else in
//! an upstream response is ignored during deserialization.

pub mod chat_completions;
pub mod completions;
pub mod extract;
