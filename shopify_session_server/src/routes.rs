//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use serde::Deserialize;
use serde_json::json;
use shopify_session_engine::{
    db_types::AccessTokenKind,
    ExchangeTransport,
    KeySetFetcher,
    SessionApi,
    SessionManagement,
    TokenExchangeApi,
};

use crate::{auth::{bearer_token, VerifiedSession}, errors::ServerError};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Token exchange  ----------------------------------------------
route!(token_exchange => Post "/auth/token" impl SessionManagement, KeySetFetcher, ExchangeTransport);

#[derive(Debug, Default, Deserialize)]
struct TokenExchangeParams {
    token_type: Option<AccessTokenKind>,
}

/// Route handler for the token-exchange endpoint.
///
/// The session token comes from the `Authorization: Bearer` header or the `id_token` query
/// parameter. The optional JSON body selects the access-token kind, `{"token_type": "online"}` or
/// `{"token_type": "offline"}`; an empty body means offline. On success the newly persisted session
/// is returned, including the minted access token.
pub async fn token_exchange<B, F, T>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<TokenExchangeApi<B, F, T>>,
) -> Result<HttpResponse, ServerError>
where
    B: SessionManagement,
    F: KeySetFetcher,
    T: ExchangeTransport,
{
    trace!("💻️ Received token exchange request");
    let token = bearer_token(req.headers(), req.query_string()).ok_or(ServerError::MissingSessionToken)?;
    let params: TokenExchangeParams = if body.is_empty() {
        TokenExchangeParams::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?
    };
    let kind = params.token_type.unwrap_or(AccessTokenKind::Offline);
    let session = api.exchange(&token, kind).await?;
    debug!("💻️ Token exchange succeeded for {}", session.shop);
    let access_token = match kind {
        AccessTokenKind::Offline => session.offline_access_token.as_deref(),
        AccessTokenKind::Online => session.online_access_token.as_deref(),
    };
    Ok(HttpResponse::Ok().json(json!({
        "shop": session.shop,
        "token_type": kind,
        "access_token": access_token,
        "scopes": session.scopes(),
        "expires_at": session.expires_at,
        "associated_user": session.associated_user(),
    })))
}

//----------------------------------------------   Session info  ----------------------------------------------
route!(session_info => Get "/session" impl SessionManagement);

/// Returns metadata about the caller's active session. The access token itself is never included;
/// callers that need a token go through the exchange endpoint.
pub async fn session_info<TSessionManagement: SessionManagement>(
    session: VerifiedSession,
    api: web::Data<SessionApi<TSessionManagement>>,
) -> Result<HttpResponse, ServerError> {
    let shop = &session.claims.shop;
    trace!("💻️ Received session info request for {shop}");
    let active = api
        .active_session_for_shop(shop)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No active session for {shop}")))?;
    Ok(HttpResponse::Ok().json(json!({
        "shop": active.shop,
        "user_id": active.user_id,
        "session_id": active.session_id,
        "token_type": active.kind(),
        "scopes": active.scopes(),
        "expires_at": active.expires_at,
        "is_active": active.is_active,
        "updated_at": active.updated_at,
    })))
}

//----------------------------------------------   Logout  ----------------------------------------------------
route!(logout => Post "/logout" impl SessionManagement);

/// Deactivates every active session for the caller's shop. Logging out twice is fine; the second
/// call reports zero invalidated sessions.
pub async fn logout<TSessionManagement: SessionManagement>(
    session: VerifiedSession,
    api: web::Data<SessionApi<TSessionManagement>>,
) -> Result<HttpResponse, ServerError> {
    let shop = &session.claims.shop;
    debug!("💻️ Received logout request for {shop}");
    let invalidated = api.invalidate_sessions_for_shop(shop).await?;
    Ok(HttpResponse::Ok().json(json!({ "invalidated": invalidated })))
}
