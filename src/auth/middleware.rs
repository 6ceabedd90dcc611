//! Actix Web middleware applying the route guard to every request.
//!
//! Wrap the app with [`RouteGuard`] and every request is evaluated by
//! [`GuardPolicy::evaluate`] before any handler runs. Allowed requests go on
//! to the inner service with the verified [`AccessClaims`](crate::AccessClaims)
//! in the request extensions. Redirected requests get an empty
//! `307 Temporary Redirect` and never reach the inner service.
//!
//! # Usage
//! ```rust,no_run
//! use actix_web::App;
//! use canteen_gate::{GuardPolicy, RouteGuard, RouteTable, TokenVerifier};
//!
//! let policy = GuardPolicy::new(
//!     RouteTable::default(),
//!     TokenVerifier::new("secret"),
//!     "access_token",
//! );
//! let app = App::new().wrap(RouteGuard::new(policy));
//! ```

use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
};
use futures::future::{LocalBoxFuture, Ready, ok};
use std::{
    sync::Arc,
    task::{Context, Poll},
};
use uuid::Uuid;

use crate::auth::guard::{GuardDecision, GuardPolicy};

/// Middleware factory. Cheap to clone; the policy is shared.
#[derive(Clone)]
pub struct RouteGuard {
    policy: Arc<GuardPolicy>,
}

impl RouteGuard {
    pub fn new(policy: GuardPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }

    pub fn from_shared(policy: Arc<GuardPolicy>) -> Self {
        Self { policy }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RouteGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RouteGuardService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RouteGuardService {
            service,
            policy: self.policy.clone(),
        })
    }
}

/// Per-worker guard service produced by [`RouteGuard`].
pub struct RouteGuardService<S> {
    service: S,
    policy: Arc<GuardPolicy>,
}

impl<S, B> Service<ServiceRequest> for RouteGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let request_id = Uuid::new_v4();
        let path = req.path().to_string();
        let route_class = self.policy.classify(&path);

        // An unparseable Cookie header yields None, which is handled as no token.
        let token = req
            .cookie(self.policy.cookie_name())
            .map(|c| c.value().to_string());

        let decision = self.policy.evaluate(&path, token.as_deref());

        tracing::debug!(
            request_id = %request_id,
            method = %req.method(),
            path = %path,
            route_class = route_class.map_or("non_canonical", |c| c.as_str()),
            decision = decision.as_str(),
            "Route guard decision"
        );

        match decision {
            GuardDecision::Allow(claims) => {
                if let Some(claims) = claims {
                    req.extensions_mut().insert(claims);
                }
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            redirect => {
                let location = self
                    .policy
                    .redirect_location(&redirect)
                    .unwrap_or(self.policy.routes().login_path.as_str())
                    .to_string();

                let response = HttpResponse::TemporaryRedirect()
                    .insert_header((header::LOCATION, location))
                    .finish()
                    .map_into_right_body();

                Box::pin(async move { Ok(req.into_response(response)) })
            }
        }
    }
}
