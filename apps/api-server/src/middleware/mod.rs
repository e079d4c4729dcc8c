//! Request extractors and error presentation.

pub mod auth;
pub mod error;
