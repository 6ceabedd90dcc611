//! Structured logging setup.
//!
//! Logs are emitted as Bunyan-formatted JSON, one object per line, with span
//! fields carried into every event through [`JsonStorageLayer`]. Records from
//! crates that still use the `log` facade are bridged into tracing.
//!
//! The filter comes from `RUST_LOG`, falling back to the level passed to
//! [`get_subscriber`].

use tracing::{Subscriber, subscriber::set_global_default};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, Registry, fmt::MakeWriter, layer::SubscriberExt};

/// Builds the subscriber without installing it.
///
/// # Parameters
/// - `name`: service name written into every record
/// - `env_filter`: default directive when `RUST_LOG` is not set (e.g. `"info"`)
/// - `sink`: where records go; `std::io::stdout` in production, `std::io::sink`
///   in tests
///
/// # Example
/// ```rust,no_run
/// use canteen_gate::{get_subscriber, init_subscriber};
///
/// let subscriber = get_subscriber("canteen_gate".into(), "info".into(), std::io::stdout);
/// init_subscriber(subscriber);
/// ```
pub fn get_subscriber<Sink>(
    name: String,
    env_filter: String,
    sink: Sink,
) -> impl Subscriber + Send + Sync
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{env_filter},actix_web=info,actix_server=info,mio=warn"))
    });
    let formatting_layer = BunyanFormattingLayer::new(name, sink);

    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
}

/// Installs `subscriber` as the global default and routes `log` records into
/// it. Call once, at start-up.
///
/// # Panics
/// Panics if a global subscriber or logger is already set.
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) {
    LogTracer::init().expect("failed to set logger");
    set_global_default(subscriber).expect("failed to set subscriber");
}
