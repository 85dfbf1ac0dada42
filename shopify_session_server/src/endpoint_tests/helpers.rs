use actix_web::{body, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App, HttpResponse};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use shopify_session_engine::{
    config::ShopifyAppConfig,
    db_types::{ShopDomain, ShopSession},
    validator::{JsonWebKeySet, ValidationError},
    KeySetFetcher,
    SessionTokenValidator,
};
use ssg_common::Secret;

pub const CLIENT_ID: &str = "test-client-id";
pub const CLIENT_SECRET: &str = "shpss_test_secret";
pub const SHOP: &str = "alice.myshopify.com";

pub fn test_shopify_config() -> ShopifyAppConfig {
    ShopifyAppConfig {
        client_id: CLIENT_ID.to_string(),
        client_secret: Secret::new(CLIENT_SECRET.to_string()),
        ..Default::default()
    }
}

/// A fetcher whose key sets are never reachable, so every token verifies via the shared-secret
/// fallback. Endpoint tests mint HS256 tokens with [`CLIENT_SECRET`].
#[derive(Clone, Default)]
pub struct UnreachableKeySets;

impl KeySetFetcher for UnreachableKeySets {
    async fn fetch(&self, _shop: &ShopDomain) -> Result<JsonWebKeySet, ValidationError> {
        Err(ValidationError::KeySetFetchError("no network in tests".to_string()))
    }
}

pub fn test_validator() -> SessionTokenValidator<UnreachableKeySets> {
    SessionTokenValidator::new(&test_shopify_config(), UnreachableKeySets)
}

pub fn mint_session_token(shop: &str) -> String {
    let now = Utc::now().timestamp();
    let claims: Value = json!({
        "iss": format!("https://{shop}/admin"),
        "dest": format!("https://{shop}"),
        "aud": CLIENT_ID,
        "sub": "1001",
        "exp": now + 60,
        "nbf": now - 5,
        "iat": now,
        "jti": "jti-1",
        "sid": "sid-1",
    });
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(CLIENT_SECRET.as_bytes()))
        .expect("Failed to sign token")
}

pub fn stored_session(shop: &str, token: &str) -> ShopSession {
    ShopSession {
        id: 1,
        session_id: "sid-1".to_string(),
        shop: ShopDomain::parse(shop, false).expect("invalid test shop domain"),
        user_id: "1001".to_string(),
        offline_access_token: Some(token.to_string()),
        online_access_token: None,
        scopes: "read_products".to_string(),
        expires_at: None,
        associated_user: None,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Drives a request through the app and returns the response as the caller would see it. Middleware
/// rejections surface as a service-level `Err`, so those are rendered through `ResponseError` here,
/// exactly as the dispatcher renders them in production.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
            (status, body)
        },
        Err(e) => {
            let res = HttpResponse::from_error(e);
            let status = res.status();
            let bytes = body::to_bytes(res.into_body()).await.expect("Failed to read error response body");
            (status, String::from_utf8_lossy(&bytes).into_owned())
        },
    }
}

pub fn with_bearer(req: TestRequest, token: &str) -> TestRequest {
    req.insert_header(("Authorization", format!("Bearer {token}")))
}
