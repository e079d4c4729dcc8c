//! # Insights Core
//!
//! The domain layer of the Insights API: entities, payload rules, the
//! ownership policy, and the application services that drive the ports.
//! This crate has no infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod policy;
pub mod ports;
pub mod rules;
pub mod services;

pub use error::{DomainError, RepoError, ValidationErrors};
