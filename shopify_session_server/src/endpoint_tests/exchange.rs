use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use serde_json::{json, Value};
use shopify_session_engine::{AccessTokenResponse, ExchangeError, TokenExchangeApi};

use super::{
    helpers::{
        mint_session_token,
        send_request,
        stored_session,
        test_shopify_config,
        test_validator,
        with_bearer,
        UnreachableKeySets,
        CLIENT_SECRET,
        SHOP,
    },
    mocks::{MockSessionManager, MockTransport},
};
use crate::routes::TokenExchangeRoute;

fn configure(db: MockSessionManager, transport: MockTransport) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let config = test_shopify_config();
        let api = TokenExchangeApi::new(&config, db, test_validator(), transport);
        cfg.app_data(web::Data::new(api))
            .service(TokenExchangeRoute::<MockSessionManager, UnreachableKeySets, MockTransport>::new());
    }
}

#[actix_web::test]
async fn missing_token_is_unauthorized() {
    let _ = env_logger::try_init();
    let req = TestRequest::post().uri("/auth/token");
    let (status, body) = send_request(req, configure(MockSessionManager::new(), MockTransport::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("error"), "was: {body}");
}

#[actix_web::test]
async fn garbage_tokens_are_unauthorized_and_leak_nothing() {
    let _ = env_logger::try_init();
    let req = with_bearer(TestRequest::post().uri("/auth/token"), "not-a-session-token");
    let (status, body) = send_request(req, configure(MockSessionManager::new(), MockTransport::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(!body.contains(CLIENT_SECRET), "client secret leaked: {body}");
}

#[actix_web::test]
async fn offline_exchange_round_trip() {
    let _ = env_logger::try_init();
    let mut transport = MockTransport::new();
    transport.expect_request_access_token().times(1).returning(|shop, request| {
        assert_eq!(shop.as_str(), SHOP);
        assert_eq!(request.requested_token_type, "urn:shopify:params:oauth:token-type:offline-access-token");
        Ok(AccessTokenResponse {
            access_token: "tok1".to_string(),
            scope: "read_products".to_string(),
            expires_in: None,
            associated_user_scope: None,
            associated_user: None,
        })
    });
    let mut db = MockSessionManager::new();
    db.expect_rotate_session().times(1).returning(|session| Ok(stored_session(SHOP, &session.access_token)));

    let token = mint_session_token(SHOP);
    let req = with_bearer(TestRequest::post().uri("/auth/token"), &token);
    let (status, body) = send_request(req, configure(db, transport)).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["shop"], SHOP);
    assert_eq!(response["token_type"], "offline");
    assert_eq!(response["access_token"], "tok1");
    assert_eq!(response["scopes"], json!(["read_products"]));
    assert!(response["expires_at"].is_null());
}

#[actix_web::test]
async fn online_requests_carry_the_online_token_type() {
    let _ = env_logger::try_init();
    let mut transport = MockTransport::new();
    transport.expect_request_access_token().times(1).returning(|_, request| {
        assert_eq!(request.requested_token_type, "urn:shopify:params:oauth:token-type:online-access-token");
        Ok(AccessTokenResponse {
            access_token: "tok-online".to_string(),
            scope: "read_products".to_string(),
            expires_in: Some(86_400),
            associated_user_scope: None,
            associated_user: None,
        })
    });
    let mut db = MockSessionManager::new();
    db.expect_rotate_session().times(1).returning(|session| {
        let mut stored = stored_session(SHOP, "");
        stored.offline_access_token = None;
        stored.online_access_token = Some(session.access_token.clone());
        stored.expires_at = session.expires_at;
        Ok(stored)
    });

    let token = mint_session_token(SHOP);
    let req = with_bearer(TestRequest::post().uri("/auth/token"), &token)
        .set_json(json!({ "token_type": "online" }));
    let (status, body) = send_request(req, configure(db, transport)).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["token_type"], "online");
    assert_eq!(response["access_token"], "tok-online");
    assert!(!response["expires_at"].is_null());
}

#[actix_web::test]
async fn rejected_exchanges_are_a_bad_gateway() {
    let _ = env_logger::try_init();
    let mut transport = MockTransport::new();
    transport.expect_request_access_token().times(1).returning(|_, _| {
        Err(ExchangeError::ExchangeRejected { status: 401, body: "upstream detail".to_string() })
    });
    // No expectation on the store: a write would panic the test.
    let db = MockSessionManager::new();

    let token = mint_session_token(SHOP);
    let req = with_bearer(TestRequest::post().uri("/auth/token"), &token);
    let (status, body) = send_request(req, configure(db, transport)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(!body.contains("upstream detail"), "upstream body echoed to caller: {body}");
}

#[actix_web::test]
async fn unknown_token_types_are_a_bad_request() {
    let _ = env_logger::try_init();
    let token = mint_session_token(SHOP);
    let req = with_bearer(TestRequest::post().uri("/auth/token"), &token)
        .set_json(json!({ "token_type": "sideways" }));
    let (status, _) = send_request(req, configure(MockSessionManager::new(), MockTransport::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
