use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{AccessTokenKind, NewShopSession, ShopDomain, ShopSession},
    traits::SessionStoreError,
};

/// Marks every active session for the shop inactive. Returns the number of rows affected.
pub async fn deactivate_sessions_for_shop(
    shop: &ShopDomain,
    conn: &mut SqliteConnection,
) -> Result<u64, SessionStoreError> {
    let result = sqlx::query(
        "UPDATE shop_sessions SET is_active = 0, updated_at = CURRENT_TIMESTAMP WHERE shop = ? AND is_active = 1;",
    )
    .bind(shop.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Inserts the new session, or refreshes the existing row for the same `(shop, user_id)` pair. The
/// stored row is always active and holds exactly one token kind: on conflict every exchange-derived
/// column is replaced wholesale, so a stale token of the other kind never survives a rotation.
pub async fn upsert_session(
    session: NewShopSession,
    conn: &mut SqliteConnection,
) -> Result<ShopSession, SessionStoreError> {
    let (offline_token, online_token) = match session.kind {
        AccessTokenKind::Offline => (Some(session.access_token.as_str()), None),
        AccessTokenKind::Online => (None, Some(session.access_token.as_str())),
    };
    let associated_user = session
        .associated_user
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| SessionStoreError::SerializationError(e.to_string()))?;
    let result: ShopSession = sqlx::query_as(
        r#"INSERT INTO shop_sessions
        (session_id, shop, user_id, offline_access_token, online_access_token, scopes, expires_at, associated_user)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (shop, user_id) DO UPDATE SET
            session_id = excluded.session_id,
            offline_access_token = excluded.offline_access_token,
            online_access_token = excluded.online_access_token,
            scopes = excluded.scopes,
            expires_at = excluded.expires_at,
            associated_user = excluded.associated_user,
            is_active = 1,
            updated_at = CURRENT_TIMESTAMP
        RETURNING *;
        "#,
    )
    .bind(session.session_id.as_str())
    .bind(session.shop.as_str())
    .bind(session.user_id.as_str())
    .bind(offline_token)
    .bind(online_token)
    .bind(session.scopes.as_str())
    .bind(session.expires_at)
    .bind(associated_user)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Session {} for {} stored with row id {}", result.session_id, result.shop, result.id);
    Ok(result)
}

pub async fn fetch_active_session(
    shop: &ShopDomain,
    conn: &mut SqliteConnection,
) -> Result<Option<ShopSession>, SessionStoreError> {
    let result =
        sqlx::query_as("SELECT * FROM shop_sessions WHERE shop = ? AND is_active = 1 ORDER BY updated_at DESC LIMIT 1;")
            .bind(shop.as_str())
            .fetch_optional(conn)
            .await?;
    Ok(result)
}

pub async fn fetch_session_by_id(
    session_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<ShopSession>, SessionStoreError> {
    let result = sqlx::query_as("SELECT * FROM shop_sessions WHERE session_id = ? ORDER BY updated_at DESC LIMIT 1;")
        .bind(session_id)
        .fetch_optional(conn)
        .await?;
    Ok(result)
}
