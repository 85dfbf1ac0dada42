use mockall::mock;
use shopify_session_engine::{
    db_types::{NewShopSession, ShopDomain, ShopSession},
    AccessTokenResponse,
    ExchangeError,
    ExchangeTransport,
    SessionManagement,
    SessionStoreError,
    TokenExchangeRequest,
};

mock! {
    pub SessionManager {}
    impl SessionManagement for SessionManager {
        async fn rotate_session(&self, session: NewShopSession) -> Result<ShopSession, SessionStoreError>;
        async fn fetch_active_session(&self, shop: &ShopDomain) -> Result<Option<ShopSession>, SessionStoreError>;
        async fn fetch_session_by_id(&self, session_id: &str) -> Result<Option<ShopSession>, SessionStoreError>;
        async fn invalidate_sessions(&self, shop: &ShopDomain) -> Result<u64, SessionStoreError>;
    }
}

mock! {
    pub Transport {}
    impl ExchangeTransport for Transport {
        async fn request_access_token(
            &self,
            shop: &ShopDomain,
            request: TokenExchangeRequest,
        ) -> Result<AccessTokenResponse, ExchangeError>;
    }
}
