//! Token exchange: converting a freshly validated session token into a durable access token.
//!
//! [`TokenExchangeApi::exchange`] is the only writer of session rows. It revalidates the session token
//! (session tokens live for about a minute, so a validation done even moments earlier is not trusted),
//! performs the RFC 8693 token-exchange POST against the shop's OAuth endpoint, and rotates the session
//! row in one atomic transaction. Nothing in this module retries; callers own retry policy.

use std::fmt::{self, Debug};

use chrono::{Duration, Utc};
use log::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::ShopifyAppConfig,
    db_types::{AccessTokenKind, AssociatedUser, NewShopSession, ShopDomain, ShopSession},
    traits::{SessionManagement, SessionStoreError},
    validator::{KeySetFetcher, SessionTokenValidator, ValidationError},
};

const TOKEN_EXCHANGE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
const ID_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:id_token";

#[derive(Debug, Clone, Error)]
pub enum ExchangeError {
    #[error("Session token failed validation. {0}")]
    InvalidSessionToken(#[from] ValidationError),
    #[error("The identity provider rejected the token exchange with status {status}")]
    ExchangeRejected { status: u16, body: String },
    #[error("Could not reach the identity provider. {0}")]
    ExchangeTransportError(String),
    #[error("Could not persist the exchanged session. {0}")]
    PersistenceError(#[from] SessionStoreError),
}

/// The JSON body of the token-exchange POST.
#[derive(Clone, Serialize)]
pub struct TokenExchangeRequest {
    pub client_id: String,
    pub client_secret: String,
    pub grant_type: &'static str,
    pub subject_token: String,
    pub subject_token_type: &'static str,
    pub requested_token_type: &'static str,
}

// The request body carries the client secret and the subject token; keep both out of Debug output.
impl Debug for TokenExchangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenExchangeRequest")
            .field("client_id", &self.client_id)
            .field("grant_type", &self.grant_type)
            .field("subject_token_type", &self.subject_token_type)
            .field("requested_token_type", &self.requested_token_type)
            .finish()
    }
}

/// The identity provider's response to a successful exchange.
#[derive(Clone, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub scope: String,
    pub expires_in: Option<i64>,
    pub associated_user_scope: Option<String>,
    pub associated_user: Option<AssociatedUser>,
}

impl Debug for AccessTokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenResponse")
            .field("scope", &self.scope)
            .field("expires_in", &self.expires_in)
            .field("associated_user_scope", &self.associated_user_scope)
            .finish()
    }
}

/// Performs the actual token-exchange POST. The production implementation is
/// [`HttpExchangeTransport`]; tests substitute their own.
#[allow(async_fn_in_trait)]
pub trait ExchangeTransport {
    async fn request_access_token(
        &self,
        shop: &ShopDomain,
        request: TokenExchangeRequest,
    ) -> Result<AccessTokenResponse, ExchangeError>;
}

/// POSTs the exchange request to `https://{shop}/admin/oauth/access_token` with a bounded timeout.
#[derive(Clone)]
pub struct HttpExchangeTransport {
    client: reqwest::Client,
}

impl HttpExchangeTransport {
    pub fn new(timeout: std::time::Duration) -> Result<Self, ExchangeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExchangeError::ExchangeTransportError(e.to_string()))?;
        Ok(Self { client })
    }
}

impl ExchangeTransport for HttpExchangeTransport {
    async fn request_access_token(
        &self,
        shop: &ShopDomain,
        request: TokenExchangeRequest,
    ) -> Result<AccessTokenResponse, ExchangeError> {
        let url = format!("https://{shop}/admin/oauth/access_token");
        trace!("🌍️ Posting token-exchange request to {url}");
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExchangeError::ExchangeTransportError(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            response
                .json::<AccessTokenResponse>()
                .await
                .map_err(|e| ExchangeError::ExchangeTransportError(format!("malformed exchange response: {e}")))
        } else {
            let body = response.text().await.unwrap_or_default();
            debug!("🌍️ Token exchange for {shop} was rejected. Status {status}. Body: {body}");
            Err(ExchangeError::ExchangeRejected { status: status.as_u16(), body })
        }
    }
}

/// Coordinates session-token validation, the exchange call, and the session rotation.
pub struct TokenExchangeApi<B, F, T>
where F: KeySetFetcher
{
    db: B,
    validator: SessionTokenValidator<F>,
    transport: T,
    client_id: String,
    client_secret: ssg_common::Secret<String>,
}

impl<B, F, T> TokenExchangeApi<B, F, T>
where
    B: SessionManagement,
    F: KeySetFetcher,
    T: ExchangeTransport,
{
    pub fn new(config: &ShopifyAppConfig, db: B, validator: SessionTokenValidator<F>, transport: T) -> Self {
        Self {
            db,
            validator,
            transport,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    /// Exchanges the session token for an access token of the requested kind and persists the new
    /// session, deactivating any prior active session for the shop in the same transaction.
    pub async fn exchange(
        &self,
        session_token: &str,
        kind: AccessTokenKind,
    ) -> Result<ShopSession, ExchangeError> {
        let claims = self.validator.validate(session_token).await?;
        let shop = claims.shop.clone();
        debug!("🌍️ Requesting {kind} access token for {shop}");
        let request = TokenExchangeRequest {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.reveal().clone(),
            grant_type: TOKEN_EXCHANGE_GRANT_TYPE,
            subject_token: session_token.to_string(),
            subject_token_type: ID_TOKEN_TYPE,
            requested_token_type: kind.requested_token_type(),
        };
        let response = self.transport.request_access_token(&shop, request).await?;
        let expires_at = match kind {
            AccessTokenKind::Offline => None,
            AccessTokenKind::Online => {
                if response.expires_in.is_none() {
                    warn!("🌍️ Online exchange for {shop} returned no expires_in. Storing the token without expiry.");
                }
                response.expires_in.map(|secs| Utc::now() + Duration::seconds(secs))
            },
        };
        let associated_user = match kind {
            AccessTokenKind::Online => response.associated_user,
            AccessTokenKind::Offline => None,
        };
        let session = NewShopSession {
            session_id: claims.session_id,
            shop: shop.clone(),
            user_id: claims.subject,
            kind,
            access_token: response.access_token,
            scopes: response.scope,
            expires_at,
            associated_user,
        };
        let session = self.db.rotate_session(session).await.map_err(|e| {
            // The access token was already minted upstream; losing the row here means the token is
            // gone. Shout about it even though the caller only sees a persistence failure.
            error!("🗃️ An access token was minted for {shop} but the session could not be persisted. {e}");
            ExchangeError::from(e)
        })?;
        info!("🔐️ Rotated {kind} session for {shop} (session id {})", session.session_id);
        Ok(session)
    }
}
