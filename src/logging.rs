//! Log subscriber setup
//!
//! Library code only emits `tracing` events. The binary builds the subscriber
//! here and installs it once; tests install their own scoped subscribers.

use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

/// Default filter directives
pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        "hugs_rs=debug,tower_http=debug,info"
    } else {
        "hugs_rs=info"
    }
}

/// Build the console subscriber. `RUST_LOG` overrides the defaults.
pub fn subscriber(debug: bool) -> impl tracing::Subscriber + Send + Sync + 'static {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
}
