//! `SqliteDatabase` is a concrete implementation of a session-store backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements the [`crate::traits::SessionManagement`]
//! trait. Rotation runs deactivate-then-upsert inside a single transaction, so a shop is never left
//! without an active session because the replacement failed to write.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{db_url, new_pool, sessions};
use crate::{
    db_types::{NewShopSession, ShopDomain, ShopSession},
    traits::{SessionManagement, SessionStoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database instance, using `SSG_DATABASE_URL` or the default URL.
    pub async fn new(max_connections: u32) -> Result<Self, SessionStoreError> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SessionStoreError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), SessionStoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| SessionStoreError::DatabaseError(e.to_string()))?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }
}

impl SessionManagement for SqliteDatabase {
    async fn rotate_session(&self, session: NewShopSession) -> Result<ShopSession, SessionStoreError> {
        let mut tx = self.pool.begin().await?;
        let deactivated = sessions::deactivate_sessions_for_shop(&session.shop, &mut tx).await?;
        if deactivated > 0 {
            debug!("🗃️ Deactivated {deactivated} prior session(s) for {}", session.shop);
        }
        let stored = sessions::upsert_session(session, &mut tx).await?;
        tx.commit().await?;
        Ok(stored)
    }

    async fn fetch_active_session(&self, shop: &ShopDomain) -> Result<Option<ShopSession>, SessionStoreError> {
        let mut conn = self.pool.acquire().await?;
        sessions::fetch_active_session(shop, &mut conn).await
    }

    async fn fetch_session_by_id(&self, session_id: &str) -> Result<Option<ShopSession>, SessionStoreError> {
        let mut conn = self.pool.acquire().await?;
        sessions::fetch_session_by_id(session_id, &mut conn).await
    }

    async fn invalidate_sessions(&self, shop: &ShopDomain) -> Result<u64, SessionStoreError> {
        let mut conn = self.pool.acquire().await?;
        sessions::deactivate_sessions_for_shop(shop, &mut conn).await
    }
}
