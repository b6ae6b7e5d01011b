//! Offline-first synchronization core for a multi-tenant delivery CRM.
//!
//! The crate mirrors the remote backend into a local SQLite database,
//! queues writes that cannot be confirmed remotely, watches backend
//! reachability, and gives the UI an optimistic in-memory state layer
//! that stays responsive while connectivity is intermittent.

mod app;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use app::AppContext;

pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleetdesk=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
