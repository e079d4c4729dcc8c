//! # Insights Shared
//!
//! Wire types exchanged over the HTTP API: request/response DTOs and the
//! error envelope.

pub mod dto;
pub mod response;

pub use response::{ErrorBody, ErrorCode, ErrorEnvelope};
