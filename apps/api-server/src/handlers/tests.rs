use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::{Value, json};

use insights_infra::auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

use super::configure_routes;
use crate::state::AppState;

fn test_state() -> AppState {
    let tokens = JwtTokenService::new(JwtConfig {
        secret: "handler-test-secret".to_string(),
        ..JwtConfig::default()
    });
    AppState::in_memory(Arc::new(tokens), Arc::new(Argon2PasswordService::insecure_fast()))
}

macro_rules! test_app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(configure_routes),
        )
        .await
    };
}

/// Sign up and log in; evaluates to the bearer header value.
macro_rules! login_as {
    ($app:expr, $username:expr) => {{
        let resp = test::call_service(
            &$app,
            test::TestRequest::post()
                .uri("/api/auth/signup")
                .set_json(json!({
                    "username": $username,
                    "email": format!("{}@example.com", $username),
                    "password": "password123"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = test::call_service(
            &$app,
            test::TestRequest::post()
                .uri("/api/auth/login")
                .set_json(json!({"username": $username, "password": "password123"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        format!("Bearer {}", body["access_token"].as_str().unwrap())
    }};
}

macro_rules! create_insight {
    ($app:expr, $auth:expr, $payload:expr) => {{
        let resp = test::call_service(
            &$app,
            test::TestRequest::post()
                .uri("/api/insights")
                .insert_header((header::AUTHORIZATION, $auth.clone()))
                .set_json($payload)
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        body
    }};
}

fn alpha_payload() -> Value {
    json!({
        "title": "Alpha insight",
        "category": "Macro",
        "body": "This is a long enough body for validation.",
        "tags": ["Rates", "CPI"]
    })
}

fn payload(title: &str, category: &str, tags: &[&str]) -> Value {
    json!({
        "title": title,
        "category": category,
        "body": "A body comfortably over twenty characters.",
        "tags": tags
    })
}

#[actix_web::test]
async fn test_health_reports_storage() {
    let app = test_app!();

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}

#[actix_web::test]
async fn test_owner_lifecycle_and_foreign_user_refused() {
    let app = test_app!();
    let alice = login_as!(app, "alice");
    let bob = login_as!(app, "bob");

    let created = create_insight!(app, alice, alpha_payload());
    assert_eq!(created["tags"], json!(["CPI", "Rates"]));
    assert_eq!(created["created_by"]["username"], "alice");
    let uri = format!("/api/insights/{}", created["id"].as_str().unwrap());

    // Bob may not update, even with a valid payload.
    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&uri)
            .insert_header((header::AUTHORIZATION, bob.clone()))
            .set_json(payload("Bob's rewrite", "Equities", &["Hijack"]))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({
            "error": {
                "code": "FORBIDDEN",
                "details": {"detail": ["Only the owner can update this insight."]}
            }
        })
    );

    // Nor delete.
    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&uri)
            .insert_header((header::AUTHORIZATION, bob.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Alpha insight");
    assert_eq!(body["tags"], json!(["CPI", "Rates"]));

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&uri)
            .insert_header((header::AUTHORIZATION, alice.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[actix_web::test]
async fn test_foreign_user_refused_before_payload_checks() {
    let app = test_app!();
    let alice = login_as!(app, "alice");
    let bob = login_as!(app, "bob");

    let created = create_insight!(app, alice, alpha_payload());
    let uri = format!("/api/insights/{}", created["id"].as_str().unwrap());

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&uri)
            .insert_header((header::AUTHORIZATION, bob))
            .set_json(json!({"title": "x"}))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_owner_updates_and_patches() {
    let app = test_app!();
    let alice = login_as!(app, "alice");

    let created = create_insight!(app, alice, alpha_payload());
    let uri = format!("/api/insights/{}", created["id"].as_str().unwrap());

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&uri)
            .insert_header((header::AUTHORIZATION, alice.clone()))
            .set_json(payload("Alpha revisited", "FixedIncome", &["Duration"]))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["category"], "FixedIncome");
    assert_eq!(body["tags"], json!(["Duration"]));

    let resp = test::call_service(
        &app,
        test::TestRequest::patch()
            .uri(&uri)
            .insert_header((header::AUTHORIZATION, alice.clone()))
            .set_json(json!({"title": "Alpha, third take"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Alpha, third take");
    assert_eq!(body["category"], "FixedIncome");
    assert_eq!(body["tags"], json!(["Duration"]));
}

#[actix_web::test]
async fn test_invalid_payload_reports_all_fields() {
    let app = test_app!();
    let alice = login_as!(app, "alice");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/insights")
            .insert_header((header::AUTHORIZATION, alice))
            .set_json(json!({
                "title": "abc",
                "category": "Macro",
                "body": "too short",
                "tags": ["Inflation", "Inflation"]
            }))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({
            "error": {
                "code": "VALIDATION_ERROR",
                "details": {
                    "body": ["Must be at least 20 characters."],
                    "tags": ["Tags must not contain duplicates."],
                    "title": ["Must be between 5 and 200 characters."]
                }
            }
        })
    );
}

#[actix_web::test]
async fn test_missing_fields_and_unknown_category() {
    let app = test_app!();
    let alice = login_as!(app, "alice");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/insights")
            .insert_header((header::AUTHORIZATION, alice))
            .set_json(json!({"title": "Alpha insight", "category": "Crypto"}))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    let details = &body["error"]["details"];
    assert_eq!(details["category"], json!(["\"Crypto\" is not a valid choice."]));
    assert_eq!(details["body"], json!(["This field is required."]));
    assert_eq!(details["tags"], json!(["This field is required."]));
    assert!(details.get("title").is_none());
}

#[actix_web::test]
async fn test_mutations_require_authentication() {
    let app = test_app!();

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/insights")
            .set_json(alpha_payload())
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({
            "error": {
                "code": "UNAUTHORIZED",
                "details": {"detail": ["Authentication credentials were not provided."]}
            }
        })
    );

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header((header::AUTHORIZATION, "Bearer not-a-token"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_list_filters_and_order() {
    let app = test_app!();
    let alice = login_as!(app, "alice");

    create_insight!(app, alice, alpha_payload());
    create_insight!(app, alice, payload("Beta outlook", "Equities", &["Earnings"]));
    create_insight!(app, alice, payload("ALPINE credit view", "FixedIncome", &["Credit"]));

    let list = |uri: &'static str| test::TestRequest::get().uri(uri).to_request();

    let resp = test::call_service(&app, list("/api/insights")).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["count"], 3);
    let titles: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["ALPINE credit view", "Beta outlook", "Alpha insight"]);

    let resp = test::call_service(&app, list("/api/insights?search=alp")).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["count"], 2);

    let resp = test::call_service(&app, list("/api/insights?category=Equities")).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["title"], "Beta outlook");

    let resp = test::call_service(&app, list("/api/insights?tag=cp&search=alpha")).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["title"], "Alpha insight");

    let resp = test::call_service(&app, list("/api/insights?category=Crypto")).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["count"], 0);
}

#[actix_web::test]
async fn test_top_tags() {
    let app = test_app!();
    let alice = login_as!(app, "alice");

    create_insight!(app, alice, payload("First insight", "Macro", &["Rates", "CPI"]));
    create_insight!(app, alice, payload("Second insight", "Macro", &["Rates"]));
    create_insight!(app, alice, payload("Third insight", "Macro", &["Rates", "Oil"]));

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/analytics/top-tags?limit=2").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({"tags": [{"name": "Rates", "count": 3}, {"name": "CPI", "count": 1}]})
    );
}

#[actix_web::test]
async fn test_signup_rules() {
    let app = test_app!();

    let signup = |username: &str| {
        test::TestRequest::post()
            .uri("/api/auth/signup")
            .set_json(json!({"username": username, "password": "password"}))
            .to_request()
    };

    let resp = test::call_service(&app, signup("ab")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"]["details"],
        json!({"username": ["Username must be at least 3 characters."]})
    );

    let resp = test::call_service(&app, signup("abc")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], "abc");
    assert_eq!(body["email"], "");

    let resp = test::call_service(&app, signup("abc")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"]["details"],
        json!({"username": ["Username is already taken."]})
    );
}

#[actix_web::test]
async fn test_signup_missing_fields_fall_through_to_account_rules() {
    let app = test_app!();

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/signup")
            .set_json(json!({"username": "alice"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"]["details"],
        json!({"password": ["Password must be at least 8 characters."]})
    );

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/signup")
            .set_json(json!({}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"]["details"],
        json!({"username": ["Username must be at least 3 characters."]})
    );
}

#[actix_web::test]
async fn test_login_and_me() {
    let app = test_app!();
    let alice = login_as!(app, "alice");

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header((header::AUTHORIZATION, alice))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"username": "alice", "password": "wrong-password"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"]["details"],
        json!({"detail": ["No active account found with the given credentials."]})
    );
}

#[actix_web::test]
async fn test_malformed_requests() {
    let app = test_app!();
    let alice = login_as!(app, "alice");

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/insights/not-a-uuid").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/nowhere").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/insights")
            .insert_header((header::AUTHORIZATION, alice))
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["details"]["detail"].is_array());
}
