//! Main entry point for the canteen edge gate.
//!
//! Loads configuration from the environment (and `.env`), installs structured
//! logging, and serves every request through the route guard. Allowed page
//! requests are forwarded to the upstream renderer.

use actix_web::{App, HttpServer, web};
use canteen_gate::{
    GateConfig, RouteGuard, get_subscriber,
    handlers::{self, health, proxy::Upstream},
    init_subscriber,
};
use dotenv::dotenv;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let subscriber = get_subscriber("canteen_gate".to_string(), "info".to_string(), std::io::stdout);
    init_subscriber(subscriber);
    health::mark_started();

    let config = GateConfig::from_env()?;
    let policy = Arc::new(config.guard_policy());
    let upstream = web::Data::new(Upstream::new(config.upstream_url.clone()));

    tracing::info!(
        host = %config.host,
        port = config.port,
        upstream = %config.upstream_url,
        cookie = %config.cookie_name,
        "Starting canteen gate"
    );

    let server = HttpServer::new(move || {
        App::new()
            .app_data(upstream.clone())
            // Inside TracingLogger, so redirects get a request span as well.
            .wrap(RouteGuard::from_shared(policy.clone()))
            .wrap(TracingLogger::default())
            .configure(handlers::configure_routes)
            .default_service(web::to(handlers::proxy::forward))
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    let srv_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Shutdown signal received");
            srv_handle.stop(true).await;
        }
        res = server_task => {
            match res {
                Ok(Err(e)) => tracing::error!("Server failed: {}", e),
                Err(e) => tracing::error!("Server task failed: {}", e),
                Ok(Ok(())) => {}
            }
        }
    }

    Ok(())
}
