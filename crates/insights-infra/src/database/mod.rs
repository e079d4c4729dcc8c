//! Persistence: PostgreSQL via SeaORM, plus in-memory fallbacks.

mod connections;
pub mod memory;

#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
pub mod postgres_repo;

#[cfg(feature = "postgres")]
pub mod entity;

pub use connections::DatabaseConfig;
pub use memory::{InMemoryDatabase, InMemoryInsightRepository, InMemoryUserRepository};

#[cfg(feature = "postgres")]
pub use connections::{bootstrap_schema, connect};
#[cfg(feature = "postgres")]
pub use postgres_repo::{PostgresInsightRepository, PostgresUserRepository};
