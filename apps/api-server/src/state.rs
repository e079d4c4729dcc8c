//! Application state - shared across all handlers.

use std::sync::Arc;

use insights_core::ports::{InsightRepository, PasswordService, TokenService, UserRepository};
use insights_core::services::{AccountService, InsightService};
use insights_infra::auth::{Argon2PasswordService, JwtTokenService};
use insights_infra::database::{InMemoryDatabase, InMemoryInsightRepository, InMemoryUserRepository};

#[cfg(feature = "postgres")]
use insights_infra::database::{
    PostgresInsightRepository, PostgresUserRepository, bootstrap_schema, connect,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub insights: Arc<InsightService>,
    pub accounts: Arc<AccountService>,
    pub tokens: Arc<dyn TokenService>,
    /// Storage backend name reported by the health check.
    pub storage: &'static str,
}

type Repositories = (Arc<dyn UserRepository>, Arc<dyn InsightRepository>);

impl AppState {
    /// Build the application state, falling back to in-memory storage when
    /// no database is configured or reachable.
    pub async fn new(config: &AppConfig) -> Self {
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::from_env());
        let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

        let (storage, (users, insights)) = Self::repositories(config).await;

        tracing::info!(storage, "Application state initialized");

        Self::assemble(users, insights, passwords, tokens, storage)
    }

    /// In-memory state with caller-supplied auth services.
    pub fn in_memory(tokens: Arc<dyn TokenService>, passwords: Arc<dyn PasswordService>) -> Self {
        let (users, insights) = in_memory_repositories();
        Self::assemble(users, insights, passwords, tokens, "memory")
    }

    fn assemble(
        users: Arc<dyn UserRepository>,
        insights: Arc<dyn InsightRepository>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
        storage: &'static str,
    ) -> Self {
        Self {
            insights: Arc::new(InsightService::new(insights)),
            accounts: Arc::new(AccountService::new(users, passwords)),
            tokens,
            storage,
        }
    }

    #[cfg(feature = "postgres")]
    async fn repositories(config: &AppConfig) -> (&'static str, Repositories) {
        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return ("memory", in_memory_repositories());
        };

        let conn = match connect(db_config).await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                return ("memory", in_memory_repositories());
            }
        };

        if let Err(e) = bootstrap_schema(&conn).await {
            tracing::error!("Failed to prepare schema: {}. Using in-memory fallback.", e);
            return ("memory", in_memory_repositories());
        }

        (
            "postgres",
            (
                Arc::new(PostgresUserRepository::new(conn.clone())),
                Arc::new(PostgresInsightRepository::new(conn)),
            ),
        )
    }

    #[cfg(not(feature = "postgres"))]
    async fn repositories(_config: &AppConfig) -> (&'static str, Repositories) {
        tracing::info!("Running without postgres feature - using in-memory repositories");
        ("memory", in_memory_repositories())
    }
}

fn in_memory_repositories() -> Repositories {
    let db = Arc::new(InMemoryDatabase::new());
    (
        Arc::new(InMemoryUserRepository::new(db.clone())),
        Arc::new(InMemoryInsightRepository::new(db)),
    )
}
