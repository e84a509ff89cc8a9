use crate::cli::ServeOpts;
use crate::config::Config;
use crate::gateway::routes;
use crate::models::ModelRegistry;
use crate::providers::ProviderRegistry;

use anyhow::{Context, Result};
use axum::Router;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

/// Shared state for the gateway server. Read-only after startup.
#[derive(Clone)]
pub struct GatewayState {
    pub models: Arc<ModelRegistry>,
    pub providers: Arc<ProviderRegistry>,
    pub version: String,
}

impl GatewayState {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            models: Arc::new(ModelRegistry::from_config(config)),
            providers: Arc::new(ProviderRegistry::from_config(config)?),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }
}

/// The gateway server.
pub struct GatewayServer {
    state: GatewayState,
    addr: SocketAddr,
    cors_origins: Vec<String>,
}

impl GatewayServer {
    /// Prepare the gateway server with the given configuration.
    pub fn start(mut config: Config, opts: &ServeOpts) -> Result<Self> {
        if let Some(host) = &opts.host {
            config.server.host = host.clone();
        }
        if let Some(port) = opts.port {
            config.server.port = port;
        }
        if !opts.cors_origin.is_empty() {
            config.server.cors_origins = opts.cors_origin.clone();
        }
        config.validate()?;

        let addr = resolve_bind_address(&config.server.host, config.server.port)?;
        let state = GatewayState::from_config(&config)?;

        if config.openai_compat.is_none() {
            warn!("OPENAI_COMPAT_BASE_URL / OPENAI_COMPAT_API_KEY not set, only the mock model is available");
        }

        info!("Gateway server binding to {}", addr);

        Ok(Self {
            state,
            addr,
            cors_origins: config.server.cors_origins,
        })
    }

    /// Run the server until shutdown signal is received.
    pub async fn run_until_shutdown(self) -> Result<()> {
        let app = build_router(self.state.clone(), &self.cors_origins);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("failed to bind {}", self.addr))?;
        info!(
            "chatrelay v{} listening on {}",
            self.state.version, self.addr
        );

        print_startup_banner(&self.state, &self.addr, &self.cors_origins);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Gateway server shut down gracefully");
        Ok(())
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn state(&self) -> &GatewayState {
        &self.state
    }
}

/// Build the Axum router with all routes.
fn build_router(state: GatewayState, cors_origins: &[String]) -> Router {
    routes::build_routes(state, cors_origins)
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}

/// Resolve the listen address from host and port.
pub fn resolve_bind_address(host: &str, port: u16) -> Result<SocketAddr> {
    let ip: IpAddr = host
        .parse()
        .with_context(|| format!("invalid bind host: {host}"))?;
    Ok(SocketAddr::new(ip, port))
}

/// Print startup banner with server info.
fn print_startup_banner(state: &GatewayState, addr: &SocketAddr, cors_origins: &[String]) {
    let models: Vec<&str> = state.models.items().iter().map(|m| m.id.as_str()).collect();

    info!("-------------------------------------------");
    info!("  chatrelay v{}", state.version);
    info!("  Listening on: http://{}", addr);
    info!("  Models: {}", models.join(", "));
    info!("  CORS origins: {}", cors_origins.join(", "));
    info!("  Health: http://{}/health", addr);
    info!("  Chat stream: http://{}/api/chat/stream", addr);
    info!("-------------------------------------------");
}
