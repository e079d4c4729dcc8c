//! Application services - use cases composed over the ports.
//!
//! Services hold their collaborators as injected trait objects; build one per
//! application state and share it behind an `Arc`.

mod accounts;
mod insights;

pub use accounts::AccountService;
pub use insights::InsightService;
