//! cors-relay
//!
//! Serves a directory over HTTP and relays authenticated GETs under
//! `/api/proxy` to one upstream API, adding permissive CORS headers so a
//! page loaded from this server can call it.
//!
//! ```text
//!   browser ──▶ listener ──▶ connection task ──▶ CORS ──┬─▶ static files
//!                  ▲                                    │
//!                  │ shutdown flag                      └─▶ rate limit → auth → upstream
//!               signals
//! ```

use std::process::ExitCode;

use clap::Parser;

use cors_relay::config::Cli;
use cors_relay::lifecycle::startup;
use cors_relay::observability::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Cli::parse().into_config();
    logging::init_logging(&config.observability);

    match startup::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start server");
            ExitCode::FAILURE
        }
    }
}
