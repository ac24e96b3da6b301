//! Access control list middleware.
//! This middleware can be placed on any route or service that sits behind [`super::JwtMiddlewareFactory`].
//!
//! It checks the roles in the request's access token against the roles the route accepts. If the token carries at
//! least one of them, the request continues. Otherwise, a 403 Forbidden response is returned. An empty role list
//! admits any authenticated user.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use food_order_engine::db_types::Role;
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;

use crate::{
    auth::JwtClaims,
    errors::{AuthError, ServerError},
};

pub struct AclMiddlewareFactory {
    accepted_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(accepted_roles: &[Role]) -> Self {
        AclMiddlewareFactory { accepted_roles: accepted_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AclMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { accepted_roles: self.accepted_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    accepted_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
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
        let accepted_roles = self.accepted_roles.clone();
        Box::pin(async move {
            let claims = req.extensions().get::<JwtClaims>().cloned().ok_or_else(|| {
                warn!("🛡️ No access token claims found for {}. Is the route behind the JWT middleware?", req.path());
                ServerError::from(AuthError::MissingToken)
            })?;
            let admitted = accepted_roles.is_empty() || accepted_roles.iter().any(|role| claims.has_role(*role));
            if admitted {
                service.call(req).await
            } else {
                debug!("🛡️ {} is not permitted on {}. Roles: {:?}", claims.sub, req.path(), claims.roles);
                let roles = accepted_roles.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(" or ");
                Err(ServerError::InsufficientPermissions(format!("This action requires the {roles} role")).into())
            }
        })
    }
}
