use std::rc::Rc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::Principal;
use crate::state::AppState;

/// Attaches a [`Principal`] to requests that carry a valid bearer token.
///
/// The filter never rejects a request. Missing, malformed or expired tokens, and tokens
/// whose user is gone or deactivated, leave the request anonymous; routes that need a
/// caller ask for one through the `Principal` extractors.
pub struct AccessFilter;

impl<S, B> Transform<S, ServiceRequest> for AccessFilter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AccessFilterService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AccessFilterService {
            service: Rc::new(service),
        }))
    }
}

pub struct AccessFilterService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AccessFilterService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if let Some(principal) = resolve_principal(&req).await {
                req.extensions_mut().insert(principal);
            }
            service.call(req).await
        })
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

async fn resolve_principal(req: &ServiceRequest) -> Option<Principal> {
    let token = bearer_token(req)?;
    let state = match req.app_data::<web::Data<AppState>>() {
        Some(state) => state.clone(),
        None => {
            log::warn!("no application state registered; bearer token ignored");
            return None;
        }
    };

    let username = match state.tokens.subject(&token) {
        Ok(username) => username,
        Err(e) => {
            log::debug!("rejected bearer token on {}: {}", req.path(), e);
            return None;
        }
    };

    match state.credentials.find_principal(&username).await {
        Ok(Some(principal)) => Some(principal),
        Ok(None) => {
            log::debug!("token subject {} is unknown or inactive", username);
            None
        }
        Err(e) => {
            log::debug!("principal lookup for {} failed: {}", username, e);
            None
        }
    }
}
