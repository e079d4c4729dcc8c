//! Insight CRUD handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use insights_core::domain::{Category, Insight, InsightFilter, InsightInput, InsightPatch};
use insights_core::error::ValidationErrors;
use insights_shared::dto::{
    CreatorResponse, InsightListQuery, InsightListResponse, InsightPatchRequest, InsightRequest,
    InsightResponse,
};

use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

const REQUIRED: &str = "This field is required.";

/// GET /api/insights
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<InsightListQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let filter = InsightFilter::new(query.search, query.category, query.tag);

    let insights = state.insights.list(&filter).await?;
    let results: Vec<InsightResponse> = insights.into_iter().map(to_response).collect();

    Ok(HttpResponse::Ok().json(InsightListResponse {
        count: results.len(),
        results,
    }))
}

/// POST /api/insights
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<InsightRequest>,
) -> AppResult<HttpResponse> {
    let input = into_input(body.into_inner())?;

    let insight = state.insights.create(input, identity.user_id).await?;
    tracing::info!(insight_id = %insight.id, user_id = %identity.user_id, "Insight created");

    Ok(HttpResponse::Created().json(to_response(insight)))
}

/// GET /api/insights/{id}
pub async fn get(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let insight = state.insights.get(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(to_response(insight)))
}

/// PUT /api/insights/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<InsightRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    // A non-owner is refused before the payload is looked at.
    let current = state.insights.get_for_update(id, identity.user_id).await?;

    let input = into_input(body.into_inner())?;
    let insight = state.insights.update(&current, input, identity.user_id).await?;

    Ok(HttpResponse::Ok().json(to_response(insight)))
}

/// PATCH /api/insights/{id}
pub async fn patch(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<InsightPatchRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let current = state.insights.get_for_update(id, identity.user_id).await?;

    let patch = into_patch(body.into_inner())?;
    let insight = state.insights.patch(&current, patch, identity.user_id).await?;

    Ok(HttpResponse::Ok().json(to_response(insight)))
}

/// DELETE /api/insights/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    state.insights.delete_by_id(id, identity.user_id).await?;
    tracing::info!(insight_id = %id, user_id = %identity.user_id, "Insight deleted");

    Ok(HttpResponse::NoContent().finish())
}

/// Check request shape: required fields present, category a known choice.
fn into_input(req: InsightRequest) -> Result<InsightInput, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if req.title.is_none() {
        errors.add("title", REQUIRED);
    }
    let category = match req.category.as_deref() {
        None => {
            errors.add("category", REQUIRED);
            None
        }
        Some(raw) => parse_category(raw, &mut errors),
    };
    if req.body.is_none() {
        errors.add("body", REQUIRED);
    }
    if req.tags.is_none() {
        errors.add("tags", REQUIRED);
    }

    match (req.title, category, req.body, req.tags) {
        (Some(title), Some(category), Some(body), Some(tags)) if errors.is_empty() => {
            Ok(InsightInput {
                title,
                category,
                body,
                tags,
            })
        }
        _ => Err(errors),
    }
}

fn into_patch(req: InsightPatchRequest) -> Result<InsightPatch, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let category = req
        .category
        .as_deref()
        .and_then(|raw| parse_category(raw, &mut errors));

    errors.into_result()?;

    Ok(InsightPatch {
        title: req.title,
        category,
        body: req.body,
        tags: req.tags,
    })
}

fn parse_category(raw: &str, errors: &mut ValidationErrors) -> Option<Category> {
    match raw.parse::<Category>() {
        Ok(category) => Some(category),
        Err(e) => {
            errors.add("category", e.to_string());
            None
        }
    }
}

fn to_response(insight: Insight) -> InsightResponse {
    let mut tags = insight.tags;
    tags.sort();

    InsightResponse {
        id: insight.id,
        title: insight.title,
        category: insight.category.as_str().to_string(),
        body: insight.body,
        tags,
        created_by: CreatorResponse {
            id: insight.creator.id,
            username: insight.creator.username,
        },
        created_at: insight.created_at,
        updated_at: insight.updated_at,
    }
}
