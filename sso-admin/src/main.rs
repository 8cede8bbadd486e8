mod api;
mod cache;
mod config;
mod errors;
mod headers;
mod models;
mod openapi;
mod permissions;
mod reconcile;
mod services;
mod state;
mod store;
mod tokens;
#[cfg(test)]
mod test_utils;

use crate::state::AppState;
use crate::store::memory::MemoryStore;
use crate::store::Store;
use axum::Router;
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};

#[tokio::main]
async fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = match config::AdminConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Token store
    let cache = match cache::create_cache(&config).await {
        Ok(cache) => cache,
        Err(e) => {
            error!("Failed to initialize cache: {}", e);
            std::process::exit(1);
        }
    };

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    if config.seed {
        match store::seed::seed(store.as_ref()).await {
            Ok(Some(admin)) => info!("Seeded administrator '{}'", admin.user_name),
            Ok(None) => info!("Store already populated, skipping seed"),
            Err(e) => {
                error!("Failed to seed store: {}", e);
                std::process::exit(1);
            }
        }
    }

    let state = AppState::new(&config, store, cache);
    let app = create_app(state).await;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let server = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("SSO admin listening on {}", addr);
    let serve = axum::serve(server, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Err(e) = serve {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

/// Builds the admin router: API routes, `/openapi.json` and the Scalar UI
pub async fn create_app(state: AppState) -> Router {
    let (openapi_router, api_doc) =
        OpenApiRouter::with_openapi(openapi::ApiDoc::openapi()).split_for_parts();

    Router::new()
        .merge(api::router(&state))
        .merge(openapi::router())
        .merge(openapi_router)
        .merge(Scalar::with_url("/scalar", api_doc))
        .with_state(state)
}

/// Resolves on Ctrl+C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
