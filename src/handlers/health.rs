//! Liveness endpoint.
//!
//! Exempt from the guard as an exact static path, so health checks never need a token.

use actix_web::{HttpResponse, Responder};
use chrono::Utc;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::time::{Duration, Instant};

static START_TIME: Lazy<Instant> = Lazy::new(Instant::now);

#[derive(Serialize)]
struct Health {
    status: &'static str,
    /// Human-readable uptime, whole seconds.
    uptime: String,
    timestamp: chrono::DateTime<Utc>,
}

/// Marks the start of the uptime clock. Called once from `main`.
pub fn mark_started() {
    Lazy::force(&START_TIME);
}

/// Returns a JSON response indicating the gate is healthy.
///
/// # Example
/// ```json
/// { "status": "ok", "uptime": "2h 3m 4s", "timestamp": "2026-10-14T08:00:00Z" }
/// ```
#[tracing::instrument]
pub async fn health_check() -> impl Responder {
    tracing::debug!("Health check endpoint called");
    let uptime = Duration::from_secs(START_TIME.elapsed().as_secs());
    HttpResponse::Ok().json(Health {
        status: "ok",
        uptime: humantime::format_duration(uptime).to_string(),
        timestamp: Utc::now(),
    })
}
