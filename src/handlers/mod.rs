//! HTTP handlers served behind the route guard.

pub mod health;
pub mod proxy;

use actix_web::web;

/// Registers the gate's own endpoints. Page traffic is handled by
/// [`proxy::forward`], installed as the app's default service.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/healthz", web::get().to(health::health_check));
}
