use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Category, Insight, InsightFilter, TagCount, User};
use crate::error::RepoError;

/// Generic lookup-and-insert repository.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. Uniqueness violations surface as [`RepoError::Duplicate`].
    async fn insert(&self, entity: T) -> Result<T, RepoError>;
}

/// User store with the lookups signup and login need.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    async fn exists_by_username(&self, username: &str) -> Result<bool, RepoError>;

    /// Always `false` for an empty address.
    async fn exists_by_email(&self, email: &str) -> Result<bool, RepoError>;
}

/// Scalar columns of an insight row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightFields {
    pub title: String,
    pub category: Category,
    pub body: String,
}

/// Insight store.
///
/// `create` and `update` write the insight row, find-or-create every tag by
/// name, and replace the tag associations as one atomic unit. Tag names
/// arrive trimmed and unique. A concurrent insert of the same new tag name
/// must be resolved by re-reading the existing tag, not by failing.
#[async_trait]
pub trait InsightRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Insight>, RepoError>;

    async fn create(
        &self,
        fields: InsightFields,
        created_by: Uuid,
        tags: &[String],
    ) -> Result<Insight, RepoError>;

    /// Overwrite the fields and replace the whole tag set.
    async fn update(
        &self,
        id: Uuid,
        fields: InsightFields,
        tags: &[String],
    ) -> Result<Insight, RepoError>;

    /// Remove the insight and its tag associations. Tags themselves stay.
    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    /// Insights matching `filter`, newest first.
    async fn list(&self, filter: &InsightFilter) -> Result<Vec<Insight>, RepoError>;

    /// Tag usage counts, most used first, at most `limit` entries.
    async fn top_tags(&self, limit: u64) -> Result<Vec<TagCount>, RepoError>;
}
