//! Bearer token middleware.
//!
//! Reads the access token from the `Authorization: Bearer <token>` header, validates it, and stores the
//! [`JwtClaims`] in the request extensions, where handlers and the ACL middleware pick them up. Requests without a
//! valid token are refused with 401.
use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use jsonwebtoken::DecodingKey;
use log::*;

use crate::{
    auth::validate_token,
    errors::{AuthError, ServerError},
};

pub struct JwtMiddlewareFactory {
    key: DecodingKey,
}

impl JwtMiddlewareFactory {
    pub fn new(key: DecodingKey) -> Self {
        Self { key }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtMiddlewareService { key: Rc::new(self.key.clone()), service: Rc::new(service) })
    }
}

pub struct JwtMiddlewareService<S> {
    key: Rc<DecodingKey>,
    service: Rc<S>,
}

fn bearer_token(req: &ServiceRequest) -> Result<String, AuthError> {
    let header = req.headers().get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = header.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected a Bearer token".into()))
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let key = Rc::clone(&self.key);
        Box::pin(async move {
            let claims = bearer_token(&req).and_then(|token| validate_token(&token, &key)).map_err(|e| {
                debug!("🛡️ Refusing {} {}. {e}", req.method(), req.path());
                ServerError::from(e)
            })?;
            trace!("🛡️ Authenticated {} for {}", claims.sub, req.path());
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
