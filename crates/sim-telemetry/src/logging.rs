//! Structured logging setup, mirroring the teacher's `node-runtime::main`
//! (`FmtSubscriber` + `tracing`), generalized to honor `RUST_LOG` via
//! `EnvFilter` instead of a single fixed level.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Installs the process-wide subscriber. Call once, at the start of `main`.
/// Falls back to `info` when `RUST_LOG` is unset or unparsable.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("global tracing subscriber already set");
    }
}
