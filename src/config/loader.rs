//! Configuration loading from the command line.
//!
//! There is no config file: defaults from [`RelayConfig`] are overridden by
//! whichever flags are present.

use std::path::PathBuf;

use clap::Parser;

use crate::config::schema::RelayConfig;

#[derive(Debug, Parser)]
#[command(name = "cors-relay", version)]
#[command(about = "Static file server with an authenticated CORS relay to one upstream API", long_about = None)]
pub struct Cli {
    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Interface address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Directory served for non-proxied paths
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Upstream URL proxied requests are forwarded to
    #[arg(long)]
    pub upstream_url: Option<String>,

    /// Requests admitted per client inside one window
    #[arg(long)]
    pub rate_limit: Option<u32>,

    /// Rate limit window in seconds
    #[arg(long)]
    pub rate_window: Option<u64>,

    /// Skip the post-start listener probe
    #[arg(long)]
    pub no_self_check: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Defaults with this command line applied on top.
    pub fn into_config(self) -> RelayConfig {
        self.apply(RelayConfig::default())
    }

    /// Apply the flags that were given to `config`.
    pub fn apply(self, mut config: RelayConfig) -> RelayConfig {
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(host) = self.host {
            config.listener.host = host;
        }
        if let Some(root) = self.root {
            config.static_files.root = root;
        }
        if let Some(url) = self.upstream_url {
            config.upstream.url = url;
        }
        if let Some(limit) = self.rate_limit {
            config.rate_limit.max_requests = limit;
        }
        if let Some(window) = self.rate_window {
            config.rate_limit.window_secs = window;
        }
        if self.no_self_check {
            config.lifecycle.self_check = false;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        config
    }
}
