use std::time::Duration;

#[cfg(feature = "postgres")]
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DbConn, DbErr, EntityName, EntityTrait, Schema,
};

/// Configuration for the main database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 20,
            min_connections: 2,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Open the connection pool.
#[cfg(feature = "postgres")]
pub async fn connect(config: &DatabaseConfig) -> Result<DbConn, DbErr> {
    tracing::info!("Initializing database connection...");

    let opts = ConnectOptions::new(&config.url)
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true)
        .to_owned();

    let conn = Database::connect(opts).await?;
    tracing::info!("Database connected (pool: {})", config.max_connections);

    Ok(conn)
}

/// Create any missing tables from the entity definitions.
///
/// Tables are created in dependency order so foreign keys resolve. Existing
/// tables are left untouched; this is not a migration system.
#[cfg(feature = "postgres")]
pub async fn bootstrap_schema(db: &DbConn) -> Result<(), DbErr> {
    use super::entity::{insight, insight_tag, tag, user};

    create_table(db, user::Entity).await?;
    create_table(db, insight::Entity).await?;
    create_table(db, tag::Entity).await?;
    create_table(db, insight_tag::Entity).await?;

    tracing::info!("Database schema ready");
    Ok(())
}

#[cfg(feature = "postgres")]
async fn create_table<E: EntityTrait>(db: &DbConn, entity: E) -> Result<(), DbErr> {
    let table = entity.table_name().to_string();
    let backend = db.get_database_backend();
    let mut stmt = Schema::new(backend).create_table_from_entity(entity);
    stmt.if_not_exists();

    db.execute(backend.build(&stmt)).await?;
    tracing::debug!(table = %table, "Table ensured");
    Ok(())
}
