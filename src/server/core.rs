//! Listener lifecycle and routing

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use log::{error, info, warn};
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::middleware::logging::log_request;
use crate::server::handlers;
use crate::server::state::AppState;

/// Builds the application router for `config`.
pub fn router(config: &ServerConfig) -> Router {
    build_router(config, AppState::from_config(config))
}

fn build_router(config: &ServerConfig, state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/images/contents/", get(handlers::contents_root))
        .route("/images/contents/*path", get(handlers::contents))
        .route("/images/add_folder/", post(handlers::add_folder))
        .route("/images/add_file/", post(handlers::add_file))
        .route("/images/delete/*path", post(handlers::delete))
        .route("/images/download/*path", get(handlers::download))
        .route("/images/render/*path", get(handlers::render))
        .fallback(handlers::browse)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes()))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

pub struct Server {
    listener: TcpListener,
    app: Router,
}

impl Server {
    pub async fn new(config: ServerConfig) -> io::Result<Self> {
        for root in [config.data_root_path(), config.cache_root_path()] {
            if let Err(e) = std::fs::create_dir_all(&root) {
                warn!("Failed to create directory {}: {}", root.display(), e);
            }
        }

        let socket = config.listen_socket();
        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(e);
            }
        };

        let state = AppState::from_config(&config);
        if state.credentials.is_empty() {
            warn!("No users configured; every request will be rejected");
        } else {
            info!("Loaded {} user accounts", state.credentials.len());
        }

        info!(
            "Data root: {}, cache root: {}, render sizes: {:?}",
            config.data_root, config.cache_root, config.render_sizes
        );

        Ok(Self {
            app: build_router(&config, state),
            listener,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves requests until Ctrl-C is received.
    pub async fn start(self) -> io::Result<()> {
        info!("Starting media-shelf on {}", self.local_addr()?);

        axum::serve(self.listener, self.app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
