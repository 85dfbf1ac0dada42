use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use shopify_session_engine::{
    HttpExchangeTransport,
    HttpKeySetFetcher,
    SessionApi,
    SessionTokenValidator,
    SqliteDatabase,
    TokenExchangeApi,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    middleware::SessionTokenMiddlewareFactory,
    routes::{health, LogoutRoute, SessionInfoRoute, TokenExchangeRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    // The validator and the APIs are built once, outside the worker factory, so every worker shares
    // the same key-set cache and connection pool.
    let fetcher =
        HttpKeySetFetcher::new(config.shopify.jwks_timeout).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let validator = SessionTokenValidator::new(&config.shopify, fetcher);
    let transport = HttpExchangeTransport::new(config.shopify.exchange_timeout)
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let exchange_api =
        web::Data::new(TokenExchangeApi::new(&config.shopify, db.clone(), validator.clone(), transport));
    let session_api = web::Data::new(SessionApi::new(db));
    config.app_url.on_change(|url| info!("🪛️ App URL is now {url}"));
    info!("🪛️ Serving app URL {}", config.app_url.current());
    let srv = HttpServer::new(move || {
        // Routes that require a valid session token
        let api_scope = web::scope("/api")
            .wrap(SessionTokenMiddlewareFactory::new(validator.clone()))
            .service(SessionInfoRoute::<SqliteDatabase>::new())
            .service(LogoutRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("ssg::access_log"))
            .app_data(exchange_api.clone())
            .app_data(session_api.clone())
            .service(health)
            .service(TokenExchangeRoute::<SqliteDatabase, HttpKeySetFetcher, HttpExchangeTransport>::new())
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
