pub mod handlers;

use std::future::Future;
use std::net::SocketAddr;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub use handlers::ApiState;

/// Build the `/api` router.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/ping", get(handlers::handle_ping))
        .route("/download", get(handlers::handle_download))
        .route(
            "/upload",
            post(handlers::handle_upload).layer(DefaultBodyLimit::disable()),
        )
        .route("/network-info", get(handlers::handle_network_info))
        .route(
            "/hardware",
            get(handlers::handle_hardware_list).post(handlers::handle_hardware_register),
        )
        .route("/hardware/{id}", get(handlers::handle_hardware_get))
        .route(
            "/results",
            get(handlers::handle_results_list).post(handlers::handle_results_submit),
        )
        .route("/results/{id}", get(handlers::handle_results_get))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(cors)
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve_on<F>(listener: TcpListener, state: ApiState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("API server failed")?;
    Ok(())
}

pub async fn serve<F>(state: ApiState, bind: &str, port: u16, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind((bind, port))
        .await
        .with_context(|| format!("failed to bind {}:{}", bind, port))?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "API listening");
    serve_on(listener, state, shutdown).await
}
