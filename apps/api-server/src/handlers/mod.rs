//! HTTP handlers and route configuration.

mod analytics;
mod auth;
mod health;
mod insights;

#[cfg(test)]
mod tests;

use actix_web::{HttpResponse, web};

use crate::middleware::error::AppError;

/// Configure all application routes and extractor error handling.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    // Malformed ids address no resource.
    .app_data(web::PathConfig::default().error_handler(|_err, _req| AppError::NotFound.into()))
    .service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/signup", web::post().to(auth::signup))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            .service(
                web::scope("/insights")
                    .route("", web::get().to(insights::list))
                    .route("", web::post().to(insights::create))
                    .route("/{id}", web::get().to(insights::get))
                    .route("/{id}", web::put().to(insights::update))
                    .route("/{id}", web::patch().to(insights::patch))
                    .route("/{id}", web::delete().to(insights::delete)),
            )
            .route("/analytics/top-tags", web::get().to(analytics::top_tags)),
    )
    .default_service(web::to(not_found));
}

async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound)
}
