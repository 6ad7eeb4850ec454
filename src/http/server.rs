//! HTTP server setup and the connection dispatcher.
//!
//! # Responsibilities
//! - Build the Axum router: proxy prefix, static fallback, middleware
//! - Run the accept loop, one detached task per connection
//! - Stop accepting once the shutdown flag is set, then drain

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::Method,
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto::Builder as ConnBuilder,
};
use tokio::net::TcpStream;
use tower::ServiceExt;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::middleware::cors_middleware;
use crate::http::proxy::proxy_handler;
use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::http::response::panic_response;
use crate::http::upstream::{UpstreamClient, UpstreamError};
use crate::lifecycle::Shutdown;
use crate::net::{ConnectionGuard, ConnectionTracker, Listener};
use crate::security::RateLimiter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
    pub upstream: UpstreamClient,
    pub path_prefix: Arc<str>,
    pub static_files: ServeDir,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
    limiter: Arc<RateLimiter>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, UpstreamError> {
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        let upstream = UpstreamClient::new(&config.upstream)?;

        let state = AppState {
            limiter: Arc::clone(&limiter),
            upstream,
            path_prefix: Arc::from(config.proxy.path_prefix.as_str()),
            static_files: ServeDir::new(&config.static_files.root),
        };

        let router = Self::build_router(state);
        Ok(Self {
            router,
            config,
            limiter,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Outermost first: request ID, tracing, request ID echo, CORS, panic
    /// recovery, dispatch.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(middleware::from_fn(cors_middleware))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// The fully layered router. Requests must carry `ConnectInfo<SocketAddr>`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The limiter shared by every connection.
    pub fn limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.limiter)
    }

    /// Accept connections until `shutdown` is triggered, then drain.
    ///
    /// The flag is checked at least once per poll interval. Once the loop
    /// exits the listener is dropped, open connections are asked to close
    /// after their current request, and this waits up to the drain timeout
    /// for them, or until shutdown is forced.
    pub async fn run(self, listener: Listener, shutdown: Shutdown) {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "HTTP server starting");
        }

        tokio::spawn(Arc::clone(&self.limiter).run_sweeper(shutdown.clone()));

        let tracker = ConnectionTracker::new();

        while !shutdown.is_triggered() {
            let (stream, peer) = match listener.poll_accept().await {
                Ok(Some(accepted)) => accepted,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!(error = %e, "Accept failed");
                    // Back off so a persistent error (e.g. fd exhaustion) does not spin.
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    continue;
                }
            };

            let guard = tracker.track();
            tokio::spawn(serve_connection(
                stream,
                peer,
                self.router.clone(),
                shutdown.clone(),
                guard,
            ));
        }

        drop(listener);
        tracing::info!(in_flight = tracker.active_count(), "Listener closed, draining connections");

        let drain_timeout = self.config.listener.drain_timeout();
        tokio::select! {
            drained = tokio::time::timeout(drain_timeout, tracker.wait_idle()) => {
                if drained.is_err() {
                    tracing::warn!(
                        remaining = tracker.active_count(),
                        timeout = ?drain_timeout,
                        "Drain timeout elapsed with connections still open"
                    );
                }
            }
            () = shutdown.wait_forced() => {
                tracing::warn!(remaining = tracker.active_count(), "Drain skipped on forced shutdown");
            }
        }

        tracing::info!("HTTP server stopped");
    }
}

/// Serve every request on one connection.
async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    app: Router,
    shutdown: Shutdown,
    guard: ConnectionGuard,
) {
    let service = service_fn(move |mut request: hyper::Request<Incoming>| {
        request.extensions_mut().insert(ConnectInfo(peer));
        app.clone().oneshot(request)
    });

    let builder = ConnBuilder::new(TokioExecutor::new());
    let connection = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(connection);

    let mut draining = false;
    loop {
        tokio::select! {
            result = connection.as_mut() => {
                if let Err(e) = result {
                    tracing::debug!(connection_id = %guard.id(), peer = %peer, error = %e, "Connection ended with error");
                }
                break;
            }
            () = shutdown.wait(), if !draining => {
                // Finish the in-flight request, then close.
                connection.as_mut().graceful_shutdown();
                draining = true;
            }
        }
    }
}

/// Route one request: proxy prefix or static files.
async fn dispatch(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
) -> Response {
    if request.method() == Method::GET && request.uri().path().starts_with(&*state.path_prefix) {
        let (parts, _body) = request.into_parts();
        return proxy_handler(&state, peer, &parts.headers).await;
    }

    serve_static(state.static_files, request).await
}

async fn serve_static(files: ServeDir, request: Request<Body>) -> Response {
    match files.oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
