//! Session-token extraction and the verified-session request context.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::HeaderMap, FromRequest, HttpMessage, HttpRequest};
use shopify_session_engine::SessionTokenClaims;

use crate::errors::ServerError;

/// Trusted identity headers injected by the session-token middleware. Downstream services may rely
/// on these only on a private gateway-to-service network.
pub const X_SHOP_DOMAIN: &str = "x-shop-domain";
pub const X_SHOP_USER_ID: &str = "x-shop-user-id";
pub const X_SHOP_SESSION_ID: &str = "x-shop-session-id";
pub const X_SESSION_TOKEN: &str = "x-session-token";

/// Pulls the session token out of a request: `Authorization: Bearer` first, then the `id_token`
/// query parameter as a fallback for contexts that cannot set headers.
pub fn bearer_token(headers: &HeaderMap, query: &str) -> Option<String> {
    let from_header = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    from_header.or_else(|| {
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix("id_token="))
            .map(|v| v.to_string())
            .filter(|v| !v.is_empty())
    })
}

/// The validated session attached to a request by the session-token middleware.
#[derive(Debug, Clone)]
pub struct VerifiedSession {
    pub claims: SessionTokenClaims,
    /// The raw bearer string, kept for forwarding. Never logged.
    pub token: String,
}

impl FromRequest for VerifiedSession {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(req.extensions().get::<VerifiedSession>().cloned().ok_or(ServerError::MissingSessionToken))
    }
}
