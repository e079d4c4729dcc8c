//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, OnConflict, Query, SelectStatement, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use insights_core::domain::{Category, Creator, Insight, InsightFilter, TagCount, User};
use insights_core::error::RepoError;
use insights_core::ports::{InsightFields, InsightRepository, UserRepository};

use super::entity::insight::{self, Entity as InsightEntity};
use super::entity::insight_tag::{self, Entity as InsightTagEntity};
use super::entity::tag::{self, Entity as TagEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL insight repository.
pub type PostgresInsightRepository = PostgresBaseRepository<InsightEntity>;

/// Mask an e-mail address for logging to avoid PII in logs.
fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            match local.chars().next() {
                Some(first) if local.chars().count() > 1 => format!("{first}***{domain}"),
                _ => format!("***{domain}"),
            }
        }
        None => "***".to_string(),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, RepoError> {
        Ok(self.find_by_username(username).await?.is_some())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, RepoError> {
        if email.is_empty() {
            return Ok(false);
        }
        tracing::debug!(user_email = %mask_email(email), "Checking email registration");

        let found = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(found.is_some())
    }
}

/// Row shape of the top-tags aggregate.
#[derive(Debug, FromQueryResult)]
struct TagCountRow {
    name: String,
    count: i64,
}

/// Escape LIKE metacharacters and wrap the lower-cased term in `%`.
fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// `LOWER(column) LIKE '%term%'`.
fn ilike_contains(column: Expr, term: &str) -> SimpleExpr {
    Expr::expr(Func::lower(column)).like(contains_pattern(term))
}

/// Ids of insights carrying a tag whose name contains `term`.
fn tagged_insight_ids(term: &str) -> SelectStatement {
    Query::select()
        .column((InsightTagEntity, insight_tag::Column::InsightId))
        .from(InsightTagEntity)
        .inner_join(
            TagEntity,
            Expr::col((TagEntity, tag::Column::Id))
                .equals((InsightTagEntity, insight_tag::Column::TagId)),
        )
        .and_where(ilike_contains(
            Expr::col((TagEntity, tag::Column::Name)),
            term,
        ))
        .to_owned()
}

async fn find_tag<C: ConnectionTrait>(conn: &C, name: &str) -> Result<Option<tag::Model>, RepoError> {
    TagEntity::find()
        .filter(tag::Column::Name.eq(name))
        .one(conn)
        .await
        .map_err(map_db_err)
}

/// Look a tag up by name, inserting it when missing.
///
/// The insert is `ON CONFLICT (name) DO NOTHING`: when a concurrent writer
/// created the same name first, the follow-up read returns its row.
pub(crate) async fn find_or_create_tag<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<tag::Model, RepoError> {
    if let Some(existing) = find_tag(conn, name).await? {
        return Ok(existing);
    }

    let inserted = TagEntity::insert(tag::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
    })
    .on_conflict(OnConflict::column(tag::Column::Name).do_nothing().to_owned())
    .exec_without_returning(conn)
    .await
    .map_err(map_db_err)?;

    if inserted == 0 {
        tracing::debug!(tag = name, "Tag created concurrently, re-reading");
    }

    find_tag(conn, name)
        .await?
        .ok_or_else(|| RepoError::Query(format!("tag '{name}' missing after insert")))
}

/// Replace every association of `insight_id` with the given tag names.
/// Returns the attached names, sorted.
async fn replace_tags<C: ConnectionTrait>(
    conn: &C,
    insight_id: Uuid,
    names: &[String],
) -> Result<Vec<String>, RepoError> {
    let mut names = names.to_vec();
    names.sort();
    names.dedup();

    InsightTagEntity::delete_many()
        .filter(insight_tag::Column::InsightId.eq(insight_id))
        .exec(conn)
        .await
        .map_err(map_db_err)?;

    let mut links = Vec::with_capacity(names.len());
    for name in &names {
        let tag = find_or_create_tag(conn, name).await?;
        links.push(insight_tag::ActiveModel {
            insight_id: Set(insight_id),
            tag_id: Set(tag.id),
        });
    }

    if !links.is_empty() {
        InsightTagEntity::insert_many(links)
            .exec_without_returning(conn)
            .await
            .map_err(map_db_err)?;
    }

    Ok(names)
}

/// Tag names per insight, sorted.
async fn load_tags<C: ConnectionTrait>(
    conn: &C,
    insight_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<String>>, RepoError> {
    if insight_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = InsightTagEntity::find()
        .filter(insight_tag::Column::InsightId.is_in(insight_ids.iter().copied()))
        .find_also_related(TagEntity)
        .all(conn)
        .await
        .map_err(map_db_err)?;

    let mut by_insight: HashMap<Uuid, Vec<String>> = HashMap::new();
    for (link, tag) in rows {
        if let Some(tag) = tag {
            by_insight.entry(link.insight_id).or_default().push(tag.name);
        }
    }
    for names in by_insight.values_mut() {
        names.sort();
    }

    Ok(by_insight)
}

async fn load_creator<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> Result<Option<user::Model>, RepoError> {
    UserEntity::find_by_id(user_id)
        .one(conn)
        .await
        .map_err(map_db_err)
}

/// Build the domain insight from its row, author row, and tag names.
fn assemble(
    model: insight::Model,
    creator: Option<user::Model>,
    tags: Vec<String>,
) -> Result<Insight, RepoError> {
    let category: Category = model
        .category
        .parse()
        .map_err(|e| RepoError::Query(format!("insight {}: {e}", model.id)))?;
    let creator = creator
        .ok_or_else(|| RepoError::Query(format!("insight {} has no creator", model.id)))?;

    Ok(Insight {
        id: model.id,
        title: model.title,
        category,
        body: model.body,
        tags,
        creator: Creator {
            id: creator.id,
            username: creator.username,
        },
        created_at: model.created_at.into(),
        updated_at: model.updated_at.into(),
    })
}

#[async_trait]
impl InsightRepository for PostgresInsightRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Insight>, RepoError> {
        let row = InsightEntity::find_by_id(id)
            .find_also_related(UserEntity)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        let Some((model, creator)) = row else {
            return Ok(None);
        };

        let tags = load_tags(&self.db, &[model.id])
            .await?
            .remove(&model.id)
            .unwrap_or_default();

        assemble(model, creator, tags).map(Some)
    }

    async fn create(
        &self,
        fields: InsightFields,
        created_by: Uuid,
        tags: &[String],
    ) -> Result<Insight, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;
        let now = Utc::now();

        let model = insight::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(fields.title),
            category: Set(fields.category.as_str().to_string()),
            body: Set(fields.body),
            created_by: Set(created_by),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(map_db_err)?;

        let names = replace_tags(&txn, model.id, tags).await?;
        let creator = load_creator(&txn, created_by).await?;

        txn.commit().await.map_err(map_db_err)?;
        tracing::debug!(insight_id = %model.id, tags = names.len(), "Insight row and tags committed");

        assemble(model, creator, names)
    }

    async fn update(
        &self,
        id: Uuid,
        fields: InsightFields,
        tags: &[String],
    ) -> Result<Insight, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let existing = InsightEntity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;

        let mut active: insight::ActiveModel = existing.into();
        active.title = Set(fields.title);
        active.category = Set(fields.category.as_str().to_string());
        active.body = Set(fields.body);
        active.updated_at = Set(Utc::now().into());
        let model = active.update(&txn).await.map_err(map_db_err)?;

        let names = replace_tags(&txn, id, tags).await?;
        let creator = load_creator(&txn, model.created_by).await?;

        txn.commit().await.map_err(map_db_err)?;
        tracing::debug!(insight_id = %id, tags = names.len(), "Insight update committed");

        assemble(model, creator, names)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        InsightTagEntity::delete_many()
            .filter(insight_tag::Column::InsightId.eq(id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        let result = InsightEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        txn.commit().await.map_err(map_db_err)?;
        Ok(())
    }

    async fn list(&self, filter: &InsightFilter) -> Result<Vec<Insight>, RepoError> {
        let mut query = InsightEntity::find();

        if let Some(search) = &filter.search {
            query = query.filter(ilike_contains(
                Expr::col((InsightEntity, insight::Column::Title)),
                search,
            ));
        }
        if let Some(category) = &filter.category {
            query = query.filter(insight::Column::Category.eq(category.as_str()));
        }
        if let Some(tag) = &filter.tag {
            query = query.filter(insight::Column::Id.in_subquery(tagged_insight_ids(tag)));
        }

        let rows = query
            .order_by_desc(insight::Column::CreatedAt)
            .find_also_related(UserEntity)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        let ids: Vec<Uuid> = rows.iter().map(|(model, _)| model.id).collect();
        let mut tags = load_tags(&self.db, &ids).await?;
        tracing::debug!(count = rows.len(), ?filter, "Listed insights");

        rows.into_iter()
            .map(|(model, creator)| {
                let names = tags.remove(&model.id).unwrap_or_default();
                assemble(model, creator, names)
            })
            .collect()
    }

    async fn top_tags(&self, limit: u64) -> Result<Vec<TagCount>, RepoError> {
        let usage = Expr::col((InsightTagEntity, insight_tag::Column::InsightId)).count();

        let rows = TagEntity::find()
            .select_only()
            .column(tag::Column::Name)
            .column_as(usage.clone(), "count")
            .join(JoinType::InnerJoin, tag::Relation::InsightTag.def())
            .group_by(tag::Column::Name)
            .order_by_desc(usage)
            .order_by_asc(tag::Column::Name)
            .limit(limit)
            .into_model::<TagCountRow>()
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .map(|row| TagCount {
                name: row.name,
                count: row.count.max(0) as u64,
            })
            .collect())
    }
}
