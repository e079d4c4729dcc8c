//! In-memory repositories - used when no database is configured, and in tests.
//!
//! One lock guards all tables, so every write is atomic and readers never
//! see an insight with a half-replaced tag set. Data is lost on restart.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use insights_core::domain::{Category, Creator, Insight, InsightFilter, Tag, TagCount, User};
use insights_core::error::RepoError;
use insights_core::ports::{BaseRepository, InsightFields, InsightRepository, UserRepository};

struct InsightRow {
    id: Uuid,
    title: String,
    category: Category,
    body: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Insertion order, breaks ties between equal timestamps.
    seq: u64,
    tag_ids: BTreeSet<Uuid>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    insights: HashMap<Uuid, InsightRow>,
    tags: HashMap<Uuid, Tag>,
    tag_ids_by_name: HashMap<String, Uuid>,
    next_seq: u64,
}

impl Tables {
    fn find_or_create_tag(&mut self, name: &str) -> Uuid {
        if let Some(id) = self.tag_ids_by_name.get(name) {
            return *id;
        }
        let tag = Tag::new(name);
        let id = tag.id;
        self.tag_ids_by_name.insert(tag.name.clone(), id);
        self.tags.insert(id, tag);
        id
    }

    fn resolve_tags(&mut self, names: &[String]) -> BTreeSet<Uuid> {
        names.iter().map(|n| self.find_or_create_tag(n)).collect()
    }

    fn to_domain(&self, row: &InsightRow) -> Result<Insight, RepoError> {
        let creator = self
            .users
            .get(&row.created_by)
            .ok_or_else(|| RepoError::Query(format!("insight {} has no creator", row.id)))?;

        let mut tags: Vec<String> = row
            .tag_ids
            .iter()
            .filter_map(|id| self.tags.get(id))
            .map(|t| t.name.clone())
            .collect();
        tags.sort();

        Ok(Insight {
            id: row.id,
            title: row.title.clone(),
            category: row.category,
            body: row.body.clone(),
            tags,
            creator: Creator {
                id: creator.id,
                username: creator.username.clone(),
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Shared backing store for the in-memory repositories.
pub struct InMemoryDatabase {
    tables: RwLock<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Number of stored tags, orphans included.
    pub async fn tag_count(&self) -> usize {
        self.tables.read().await.tags.len()
    }
}

impl Default for InMemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory user repository.
pub struct InMemoryUserRepository {
    db: Arc<InMemoryDatabase>,
}

impl InMemoryUserRepository {
    pub fn new(db: Arc<InMemoryDatabase>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.db.tables.read().await.users.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.db.tables.write().await;

        let clash = tables.users.values().any(|existing| {
            existing.id == user.id
                || existing.username == user.username
                || (user.email.is_some() && existing.email == user.email)
        });
        if clash {
            return Err(RepoError::Duplicate(format!(
                "user '{}' already exists",
                user.username
            )));
        }

        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.db.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, RepoError> {
        Ok(self.find_by_username(username).await?.is_some())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, RepoError> {
        if email.is_empty() {
            return Ok(false);
        }
        let tables = self.db.tables.read().await;
        Ok(tables
            .users
            .values()
            .any(|u| u.email.as_deref() == Some(email)))
    }
}

/// In-memory insight repository.
pub struct InMemoryInsightRepository {
    db: Arc<InMemoryDatabase>,
}

impl InMemoryInsightRepository {
    pub fn new(db: Arc<InMemoryDatabase>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl InsightRepository for InMemoryInsightRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Insight>, RepoError> {
        let tables = self.db.tables.read().await;
        tables
            .insights
            .get(&id)
            .map(|row| tables.to_domain(row))
            .transpose()
    }

    async fn create(
        &self,
        fields: InsightFields,
        created_by: Uuid,
        tags: &[String],
    ) -> Result<Insight, RepoError> {
        let mut tables = self.db.tables.write().await;

        if !tables.users.contains_key(&created_by) {
            return Err(RepoError::Query(format!(
                "foreign key violation: user {created_by} does not exist"
            )));
        }

        let now = Utc::now();
        let seq = tables.next_seq;
        tables.next_seq += 1;

        let row = InsightRow {
            id: Uuid::new_v4(),
            title: fields.title,
            category: fields.category,
            body: fields.body,
            created_by,
            created_at: now,
            updated_at: now,
            seq,
            tag_ids: tables.resolve_tags(tags),
        };
        let insight = tables.to_domain(&row)?;
        tables.insights.insert(row.id, row);

        Ok(insight)
    }

    async fn update(
        &self,
        id: Uuid,
        fields: InsightFields,
        tags: &[String],
    ) -> Result<Insight, RepoError> {
        let mut tables = self.db.tables.write().await;
        if !tables.insights.contains_key(&id) {
            return Err(RepoError::NotFound);
        }

        let tag_ids = tables.resolve_tags(tags);
        let row = tables.insights.get_mut(&id).ok_or(RepoError::NotFound)?;
        row.title = fields.title;
        row.category = fields.category;
        row.body = fields.body;
        row.updated_at = Utc::now();
        row.tag_ids = tag_ids;

        let tables = &*tables;
        let row = tables.insights.get(&id).ok_or(RepoError::NotFound)?;
        tables.to_domain(row)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.db.tables.write().await;
        tables.insights.remove(&id).ok_or(RepoError::NotFound)?;
        Ok(())
    }

    async fn list(&self, filter: &InsightFilter) -> Result<Vec<Insight>, RepoError> {
        let tables = self.db.tables.read().await;

        let mut rows: Vec<&InsightRow> = tables.insights.values().collect();
        rows.sort_by(|a, b| (b.created_at, b.seq).cmp(&(a.created_at, a.seq)));

        let mut matched = Vec::new();
        for row in rows {
            let insight = tables.to_domain(row)?;
            if filter.matches(&insight) {
                matched.push(insight);
            }
        }
        Ok(matched)
    }

    async fn top_tags(&self, limit: u64) -> Result<Vec<TagCount>, RepoError> {
        let tables = self.db.tables.read().await;

        let mut usage: HashMap<Uuid, u64> = HashMap::new();
        for row in tables.insights.values() {
            for tag_id in &row.tag_ids {
                *usage.entry(*tag_id).or_default() += 1;
            }
        }

        let mut counts: Vec<TagCount> = usage
            .into_iter()
            .filter_map(|(id, count)| {
                tables.tags.get(&id).map(|t| TagCount {
                    name: t.name.clone(),
                    count,
                })
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        counts.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

        Ok(counts)
    }
}
