//! HTTP surface tests
//!
//! The router runs over a lazily connected pool, so only requests that never
//! touch the database are exercised here.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use microlend_server::{config::Config, db, middleware::RateLimiter, routes, state::AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let config = Config::for_database("postgres://localhost/microlend_test");
    let pool = db::create_lazy_pool(&config).unwrap();
    let rate_limiter = RateLimiter::new(config.rate_limit_rps);
    routes::create_router(AppState::new(pool, &config), &config, rate_limiter)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_root_banner() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("MicroLend"));
}

#[tokio::test]
async fn test_security_headers_applied() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert!(headers.contains_key("x-request-id"));
    // HSTS is production-only
    assert!(!headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
}

#[tokio::test]
async fn test_calculator_with_explicit_rates() {
    let response = app()
        .oneshot(post_json(
            "/api/public/calculate",
            json!({
                "amount": "100000",
                "term_months": 6,
                "interest_rate": "6",
                "processing_fee_percent": "2.5"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert!(data["total_repayment"].as_str().unwrap().starts_with("136000"));
    assert!(data["monthly_installment"].as_str().unwrap().starts_with("22666.67"));
    assert!(data["processing_fee"].as_str().unwrap().starts_with("2500"));
}

#[tokio::test]
async fn test_calculator_rejects_zero_term() {
    let response = app()
        .oneshot(post_json(
            "/api/public/calculate",
            json!({
                "amount": "1000",
                "term_months": 0,
                "interest_rate": "5",
                "processing_fee_percent": "1"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_malformed_body_uses_error_envelope() {
    let response = app()
        .oneshot(post_json(
            "/api/public/calculate",
            json!({
                "amount": "abc",
                "term_months": 6,
                "interest_rate": "6",
                "processing_fee_percent": "2.5"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_missing_content_type_uses_error_envelope() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/public/calculate")
                .body(Body::from(r#"{"amount":"1000","term_months":3}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_calculator_overflow_is_bad_request() {
    let response = app()
        .oneshot(post_json(
            "/api/public/calculate",
            json!({
                "amount": "79228162514264337593543950",
                "term_months": 1000,
                "interest_rate": "999",
                "processing_fee_percent": "1"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Loan figures are too large to calculate");
}

#[tokio::test]
async fn test_calculator_bounds() {
    for (term, rate) in [(1201, "5"), (12, "1000.5")] {
        let response = app()
            .oneshot(post_json(
                "/api/public/calculate",
                json!({
                    "amount": "1000",
                    "term_months": term,
                    "interest_rate": rate,
                    "processing_fee_percent": "1"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{term} {rate}");
    }
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    for uri in ["/api/auth/me", "/api/users/dashboard", "/api/loans/active"] {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn test_garbage_token_rejected() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/admin/analytics")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/nothing-here")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
