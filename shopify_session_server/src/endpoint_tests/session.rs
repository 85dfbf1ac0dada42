use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig, HttpRequest, HttpResponse};
use serde_json::{json, Value};
use shopify_session_engine::SessionApi;

use super::{
    helpers::{mint_session_token, send_request, stored_session, test_validator, with_bearer, SHOP},
    mocks::MockSessionManager,
};
use crate::{
    auth::{X_SESSION_TOKEN, X_SHOP_DOMAIN, X_SHOP_SESSION_ID, X_SHOP_USER_ID},
    middleware::SessionTokenMiddlewareFactory,
    routes::{LogoutRoute, SessionInfoRoute},
};

// Echoes the trusted identity headers so tests can observe what the middleware injected.
async fn probe(req: HttpRequest) -> HttpResponse {
    let header = |name: &str| req.headers().get(name).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
    HttpResponse::Ok().json(json!({
        "shop": header(X_SHOP_DOMAIN),
        "user_id": header(X_SHOP_USER_ID),
        "session_id": header(X_SHOP_SESSION_ID),
        "token": header(X_SESSION_TOKEN),
    }))
}

fn configure(db: MockSessionManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api_scope = web::scope("/api")
            .wrap(SessionTokenMiddlewareFactory::new(test_validator()))
            .service(SessionInfoRoute::<MockSessionManager>::new())
            .service(LogoutRoute::<MockSessionManager>::new())
            .route("/probe", web::get().to(probe));
        cfg.app_data(web::Data::new(SessionApi::new(db))).service(api_scope);
    }
}

#[actix_web::test]
async fn api_routes_require_a_session_token() {
    let _ = env_logger::try_init();
    let req = TestRequest::get().uri("/api/session");
    let (status, body) = send_request(req, configure(MockSessionManager::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("error"), "was: {body}");
}

#[actix_web::test]
async fn session_info_omits_token_material() {
    let _ = env_logger::try_init();
    let mut db = MockSessionManager::new();
    db.expect_fetch_active_session().times(1).returning(|shop| Ok(Some(stored_session(shop.as_str(), "tok1"))));

    // Token via the id_token query parameter, for callers that cannot set headers.
    let token = mint_session_token(SHOP);
    let req = TestRequest::get().uri(&format!("/api/session?id_token={token}"));
    let (status, body) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["shop"], SHOP);
    assert_eq!(response["user_id"], "1001");
    assert_eq!(response["is_active"], true);
    assert!(!body.contains("tok1"), "access token leaked: {body}");
}

#[actix_web::test]
async fn shops_without_an_active_session_get_not_found() {
    let _ = env_logger::try_init();
    let mut db = MockSessionManager::new();
    db.expect_fetch_active_session().times(1).returning(|_| Ok(None));

    let token = mint_session_token(SHOP);
    let req = with_bearer(TestRequest::get().uri("/api/session"), &token);
    let (status, _) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn middleware_injects_trusted_headers() {
    let _ = env_logger::try_init();
    let token = mint_session_token(SHOP);
    let req = with_bearer(TestRequest::get().uri("/api/probe"), &token);
    let (status, body) = send_request(req, configure(MockSessionManager::new())).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["shop"], SHOP);
    assert_eq!(response["user_id"], "1001");
    assert_eq!(response["session_id"], "sid-1");
    assert_eq!(response["token"], token.as_str());
}

#[actix_web::test]
async fn logout_reports_the_invalidated_count() {
    let _ = env_logger::try_init();
    let mut db = MockSessionManager::new();
    db.expect_invalidate_sessions().times(1).returning(|_| Ok(1));

    let token = mint_session_token(SHOP);
    let req = with_bearer(TestRequest::post().uri("/api/logout"), &token);
    let (status, body) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({ "invalidated": 1 }));
}

#[actix_web::test]
async fn logging_out_twice_is_not_an_error() {
    let _ = env_logger::try_init();
    let mut db = MockSessionManager::new();
    db.expect_invalidate_sessions().times(1).returning(|_| Ok(0));

    let token = mint_session_token(SHOP);
    let req = with_bearer(TestRequest::post().uri("/api/logout"), &token);
    let (status, body) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({ "invalidated": 0 }));
}
