//! Session-token middleware for Actix Web.
//!
//! Wrap a scope with this middleware to require a valid session token on every request in it. The
//! token is taken from the `Authorization: Bearer` header, or from the `id_token` query parameter
//! for embedded contexts that cannot set headers.
//!
//! On success the middleware stores a [`VerifiedSession`] in the request extensions (handlers pull
//! it out with the [`VerifiedSession`] extractor) and injects the trusted identity headers
//! (`X-Shop-Domain`, `X-Shop-User-Id`, `X-Shop-Session-Id`, `X-Session-Token`) so the request can
//! be forwarded to downstream services as-is.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::{debug, trace};
use shopify_session_engine::{KeySetFetcher, SessionTokenValidator};

use crate::{
    auth::{bearer_token, VerifiedSession, X_SESSION_TOKEN, X_SHOP_DOMAIN, X_SHOP_SESSION_ID, X_SHOP_USER_ID},
    errors::ServerError,
};

pub struct SessionTokenMiddlewareFactory<F: KeySetFetcher> {
    validator: SessionTokenValidator<F>,
}

impl<F: KeySetFetcher> SessionTokenMiddlewareFactory<F> {
    pub fn new(validator: SessionTokenValidator<F>) -> Self {
        SessionTokenMiddlewareFactory { validator }
    }
}

impl<S, B, F> Transform<S, ServiceRequest> for SessionTokenMiddlewareFactory<F>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    F: KeySetFetcher + Clone + 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = SessionTokenMiddlewareService<S, F>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionTokenMiddlewareService { validator: self.validator.clone(), service: Rc::new(service) }))
    }
}

pub struct SessionTokenMiddlewareService<S, F: KeySetFetcher> {
    validator: SessionTokenValidator<F>,
    service: Rc<S>,
}

impl<S, B, F> Service<ServiceRequest> for SessionTokenMiddlewareService<S, F>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    F: KeySetFetcher + Clone + 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let validator = self.validator.clone();
        Box::pin(async move {
            trace!("🔐️ Checking session token for request");
            let token = bearer_token(req.headers(), req.query_string()).ok_or_else(|| {
                debug!("🔐️ No session token found in request. Denying access.");
                Error::from(ServerError::MissingSessionToken)
            })?;
            let claims = validator.validate(&token).await.map_err(|e| {
                debug!("🔐️ Session token was rejected. {e}");
                Error::from(ServerError::from(e))
            })?;
            trace!("🔐️ Session token check for request ✅️");
            set_header(&mut req, X_SHOP_DOMAIN, claims.shop.as_str())?;
            set_header(&mut req, X_SHOP_USER_ID, &claims.subject)?;
            set_header(&mut req, X_SHOP_SESSION_ID, &claims.session_id)?;
            set_header(&mut req, X_SESSION_TOKEN, &token)?;
            req.extensions_mut().insert(VerifiedSession { claims, token });
            service.call(req).await
        })
    }
}

fn set_header(req: &mut ServiceRequest, name: &'static str, value: &str) -> Result<(), Error> {
    let value = HeaderValue::from_str(value)
        .map_err(|e| ServerError::Unspecified(format!("claim value cannot be forwarded as a header: {e}")))?;
    req.headers_mut().insert(HeaderName::from_static(name), value);
    Ok(())
}
