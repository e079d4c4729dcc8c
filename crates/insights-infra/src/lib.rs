//! # Insights Infrastructure
//!
//! Concrete implementations of the ports defined in `insights-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - In-memory repositories only
//! - `postgres` - PostgreSQL repositories via SeaORM
//! - `auth` - JWT + Argon2 authentication

pub mod database;

#[cfg(feature = "auth")]
pub mod auth;

pub use database::{
    DatabaseConfig, InMemoryDatabase, InMemoryInsightRepository, InMemoryUserRepository,
};

#[cfg(feature = "postgres")]
pub use database::{PostgresInsightRepository, PostgresUserRepository};

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
