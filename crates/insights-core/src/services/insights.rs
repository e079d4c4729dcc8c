use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Insight, InsightFilter, InsightInput, InsightPatch, TagCount};
use crate::error::{DomainError, RepoError};
use crate::policy::{OwnerAction, ensure_owner};
use crate::ports::{InsightFields, InsightRepository};
use crate::rules;

/// Insight read and write use cases.
pub struct InsightService {
    repo: Arc<dyn InsightRepository>,
}

impl InsightService {
    pub fn new(repo: Arc<dyn InsightRepository>) -> Self {
        Self { repo }
    }

    /// Validate and persist a new insight owned by `creator`.
    pub async fn create(&self, input: InsightInput, creator: Uuid) -> Result<Insight, DomainError> {
        rules::validate_insight_write(&input)?;

        let (fields, tags) = into_storage(input);
        Ok(self.repo.create(fields, creator, &tags).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Insight, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity_type: "Insight",
                id,
            })
    }

    /// Replace every field of `insight`. Ownership is checked before the
    /// payload; a non-owner never learns whether the payload was valid.
    pub async fn update(
        &self,
        insight: &Insight,
        input: InsightInput,
        actor: Uuid,
    ) -> Result<Insight, DomainError> {
        ensure_owner(insight, actor, OwnerAction::Update)?;
        rules::validate_insight_write(&input)?;

        let (fields, tags) = into_storage(input);
        self.repo
            .update(insight.id, fields, &tags)
            .await
            .map_err(|e| not_found_as_domain(e, insight.id))
    }

    /// Load `id` for modification by `actor`.
    ///
    /// Lets callers refuse a non-owner before looking at the payload.
    pub async fn get_for_update(&self, id: Uuid, actor: Uuid) -> Result<Insight, DomainError> {
        let current = self.get(id).await?;
        ensure_owner(&current, actor, OwnerAction::Update)?;
        Ok(current)
    }

    pub async fn update_by_id(
        &self,
        id: Uuid,
        input: InsightInput,
        actor: Uuid,
    ) -> Result<Insight, DomainError> {
        let current = self.get(id).await?;
        self.update(&current, input, actor).await
    }

    /// Merge `patch` over `insight`, then update as a whole.
    pub async fn patch(
        &self,
        insight: &Insight,
        patch: InsightPatch,
        actor: Uuid,
    ) -> Result<Insight, DomainError> {
        ensure_owner(insight, actor, OwnerAction::Update)?;

        let input = patch.merge_over(insight);
        self.update(insight, input, actor).await
    }

    pub async fn delete(&self, insight: &Insight, actor: Uuid) -> Result<(), DomainError> {
        ensure_owner(insight, actor, OwnerAction::Delete)?;

        self.repo
            .delete(insight.id)
            .await
            .map_err(|e| not_found_as_domain(e, insight.id))
    }

    pub async fn delete_by_id(&self, id: Uuid, actor: Uuid) -> Result<(), DomainError> {
        let current = self.get(id).await?;
        self.delete(&current, actor).await
    }

    /// Insights matching every supplied filter, newest first.
    pub async fn list(&self, filter: &InsightFilter) -> Result<Vec<Insight>, DomainError> {
        Ok(self.repo.list(filter).await?)
    }

    pub async fn top_tags(&self, limit: u64) -> Result<Vec<TagCount>, DomainError> {
        Ok(self.repo.top_tags(limit).await?)
    }
}

/// Trimmed scalar fields and the trimmed, non-blank tag names.
fn into_storage(input: InsightInput) -> (InsightFields, Vec<String>) {
    let tags = rules::normalize_tags(&input.tags);
    let fields = InsightFields {
        title: input.title.trim().to_string(),
        category: input.category,
        body: input.body.trim().to_string(),
    };
    (fields, tags)
}

fn not_found_as_domain(err: RepoError, id: Uuid) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::NotFound {
            entity_type: "Insight",
            id,
        },
        other => other.into(),
    }
}
