use std::fmt::{self, Debug, Display};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::helpers::{extract_hostname, is_accepted_shop_domain};

//--------------------------------------     ShopDomain       ---------------------------------------------------------

/// A validated, normalized shop hostname, e.g. `alice.myshopify.com`.
///
/// A `ShopDomain` can only be constructed through [`ShopDomain::parse`], so holding one is proof that the
/// value matched the accepted shop-domain suffix patterns at construction time.
#[derive(Clone, Debug, Type, PartialEq, Eq, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ShopDomain(String);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("'{0}' is not an accepted shop domain")]
pub struct ShopDomainError(pub String);

impl ShopDomain {
    /// Normalizes (lowercase, scheme and path stripped) and validates the given value as a shop domain.
    ///
    /// Development suffixes (tunnels, localhost) are accepted only when `allow_dev_domains` is set.
    pub fn parse(value: &str, allow_dev_domains: bool) -> Result<Self, ShopDomainError> {
        let hostname = extract_hostname(value).ok_or_else(|| ShopDomainError(value.to_string()))?;
        if is_accepted_shop_domain(&hostname, allow_dev_domains) {
            Ok(Self(hostname))
        } else {
            Err(ShopDomainError(hostname))
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   AccessTokenKind    ---------------------------------------------------------

/// The two access-token kinds the identity provider can mint in a token exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessTokenKind {
    /// An expiring, user-scoped token. Carries an associated-user snapshot.
    Online,
    /// A non-expiring, app-level token.
    Offline,
}

impl AccessTokenKind {
    /// The `requested_token_type` URN sent in the token-exchange request body.
    pub fn requested_token_type(&self) -> &'static str {
        match self {
            AccessTokenKind::Online => "urn:shopify:params:oauth:token-type:online-access-token",
            AccessTokenKind::Offline => "urn:shopify:params:oauth:token-type:offline-access-token",
        }
    }
}

impl Display for AccessTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessTokenKind::Online => write!(f, "online"),
            AccessTokenKind::Offline => write!(f, "offline"),
        }
    }
}

//--------------------------------------   AssociatedUser     ---------------------------------------------------------

/// Identity snapshot of the embedded-app viewer, as returned by an online token exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociatedUser {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub account_owner: bool,
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub collaborator: bool,
}

//--------------------------------------     ShopSession      ---------------------------------------------------------

/// A durable session row. Created by a successful token exchange, deactivated (never deleted) by a
/// fresh exchange or an explicit invalidation.
#[derive(Clone, FromRow)]
pub struct ShopSession {
    pub id: i64,
    pub session_id: String,
    pub shop: ShopDomain,
    pub user_id: String,
    pub offline_access_token: Option<String>,
    pub online_access_token: Option<String>,
    /// The granted scopes, in the provider's comma-separated wire format. Use [`ShopSession::scopes`]
    /// for the parsed list.
    pub scopes: String,
    /// `None` for offline tokens. Online tokens expire.
    pub expires_at: Option<DateTime<Utc>>,
    /// JSON-encoded [`AssociatedUser`], populated by online exchanges only.
    pub associated_user: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShopSession {
    /// Which kind of access token this session holds.
    pub fn kind(&self) -> AccessTokenKind {
        if self.online_access_token.is_some() {
            AccessTokenKind::Online
        } else {
            AccessTokenKind::Offline
        }
    }

    /// The access token itself, whichever kind is populated.
    pub fn access_token(&self) -> Option<&str> {
        self.offline_access_token.as_deref().or(self.online_access_token.as_deref())
    }

    /// The granted scopes as an ordered list.
    pub fn scopes(&self) -> Vec<String> {
        self.scopes.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
    }

    /// The associated-user snapshot, if this session came from an online exchange.
    pub fn associated_user(&self) -> Option<AssociatedUser> {
        self.associated_user.as_deref().and_then(|json| {
            serde_json::from_str(json)
                .map_err(|e| error!("🗃️ Session {} has a malformed associated_user column. {e}", self.session_id))
                .ok()
        })
    }
}

// Access tokens must never end up in logs, so Debug is implemented by hand with the token columns masked.
impl Debug for ShopSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShopSession")
            .field("id", &self.id)
            .field("session_id", &self.session_id)
            .field("shop", &self.shop)
            .field("user_id", &self.user_id)
            .field("kind", &self.kind())
            .field("scopes", &self.scopes)
            .field("expires_at", &self.expires_at)
            .field("is_active", &self.is_active)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

//--------------------------------------   NewShopSession     ---------------------------------------------------------

/// The payload for a session rotation: everything a successful token exchange produced.
#[derive(Clone)]
pub struct NewShopSession {
    pub session_id: String,
    pub shop: ShopDomain,
    pub user_id: String,
    pub kind: AccessTokenKind,
    pub access_token: String,
    pub scopes: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub associated_user: Option<AssociatedUser>,
}

impl Debug for NewShopSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewShopSession")
            .field("session_id", &self.session_id)
            .field("shop", &self.shop)
            .field("user_id", &self.user_id)
            .field("kind", &self.kind)
            .field("scopes", &self.scopes)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
