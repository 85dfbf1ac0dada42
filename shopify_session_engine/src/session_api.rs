use log::*;

use crate::{
    db_types::{ShopDomain, ShopSession},
    traits::{SessionManagement, SessionStoreError},
};

/// Read-and-invalidate access to stored sessions. All writes of new sessions go through
/// [`crate::TokenExchangeApi`]; this API never creates rows.
pub struct SessionApi<B> {
    db: B,
}

impl<B> SessionApi<B>
where B: SessionManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The shop's single active session, if one exists.
    pub async fn active_session_for_shop(&self, shop: &ShopDomain) -> Result<Option<ShopSession>, SessionStoreError> {
        self.db.fetch_active_session(shop).await
    }

    /// Looks a session up by its session id, whether or not it is still active.
    pub async fn session_by_id(&self, session_id: &str) -> Result<Option<ShopSession>, SessionStoreError> {
        self.db.fetch_session_by_id(session_id).await
    }

    /// Deactivates every active session for the shop, returning the number of sessions affected.
    /// Calling this for a shop with no active sessions is not an error.
    pub async fn invalidate_sessions_for_shop(&self, shop: &ShopDomain) -> Result<u64, SessionStoreError> {
        let n = self.db.invalidate_sessions(shop).await?;
        info!("🗃️ Invalidated {n} session(s) for {shop}");
        Ok(n)
    }
}
