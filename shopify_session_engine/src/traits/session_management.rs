use thiserror::Error;

use crate::db_types::{NewShopSession, ShopDomain, ShopSession};

#[derive(Debug, Clone, Error)]
pub enum SessionStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Could not serialize session data. {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for SessionStoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

/// Defines the behaviour session-store backends need to expose.
#[allow(async_fn_in_trait)]
pub trait SessionManagement {
    /// In a single atomic transaction, marks every active session for the shop inactive and upserts the
    /// new session row (keyed on `(shop, user_id)`), returning the stored record.
    async fn rotate_session(&self, session: NewShopSession) -> Result<ShopSession, SessionStoreError>;

    /// The single active session for the shop, most recently updated first, if any.
    async fn fetch_active_session(&self, shop: &ShopDomain) -> Result<Option<ShopSession>, SessionStoreError>;

    /// Looks a session up by its session id, active or not.
    async fn fetch_session_by_id(&self, session_id: &str) -> Result<Option<ShopSession>, SessionStoreError>;

    /// Deactivates every active session for the shop. Idempotent; returns the number of rows affected,
    /// and zero is not an error.
    async fn invalidate_sessions(&self, shop: &ShopDomain) -> Result<u64, SessionStoreError>;
}
