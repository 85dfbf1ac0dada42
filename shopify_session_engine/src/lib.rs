//! Shopify Session Engine
//!
//! The session engine implements the security-sensitive core of the Shopify session gateway. It is
//! provider-facing but server-agnostic: nothing in this crate knows about HTTP routing or the gateway's
//! public surface.
//!
//! The crate is divided into three main sections:
//! 1. Session token validation ([`mod@validator`]). An inbound bearer string is verified against the shop's
//!    published key set (with a shared-secret fallback) and its claims are checked as a single ordered
//!    sequence. The result is either a typed [`SessionTokenClaims`] or a typed [`ValidationError`].
//! 2. Token exchange ([`TokenExchangeApi`]). A freshly validated session token is exchanged for a durable
//!    access token at the shop's OAuth endpoint, and the resulting session record is rotated into the
//!    database in a single atomic transaction.
//! 3. Session persistence ([`mod@traits`] and the SQLite backend). Backends implement the
//!    [`SessionManagement`] trait. At most one session row is active per shop at any time; rotation and
//!    invalidation only ever deactivate rows, never delete them.
pub mod config;
pub mod db_types;
pub mod helpers;
pub mod traits;
pub mod validator;

mod exchange;
mod session_api;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use exchange::{
    AccessTokenResponse,
    ExchangeError,
    ExchangeTransport,
    HttpExchangeTransport,
    TokenExchangeApi,
    TokenExchangeRequest,
};
pub use session_api::SessionApi;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{SessionManagement, SessionStoreError};
pub use validator::{
    HttpKeySetFetcher,
    KeySetFetcher,
    SessionTokenClaims,
    SessionTokenValidator,
    ValidationError,
};
