//! Analytics endpoints.

use actix_web::{HttpResponse, web};

use insights_shared::dto::{TagCountResponse, TopTagsQuery, TopTagsResponse};

use crate::middleware::error::AppResult;
use crate::state::AppState;

const DEFAULT_LIMIT: u64 = 10;
const MAX_LIMIT: u64 = 100;

/// GET /api/analytics/top-tags
pub async fn top_tags(
    state: web::Data<AppState>,
    query: web::Query<TopTagsQuery>,
) -> AppResult<HttpResponse> {
    let limit = clamp_limit(query.limit);

    let tags = state
        .insights
        .top_tags(limit)
        .await?
        .into_iter()
        .map(|t| TagCountResponse {
            name: t.name,
            count: t.count,
        })
        .collect();

    Ok(HttpResponse::Ok().json(TopTagsResponse { tags }))
}

fn clamp_limit(limit: Option<u64>) -> u64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 10);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(3)), 3);
        assert_eq!(clamp_limit(Some(1000)), 100);
    }
}
