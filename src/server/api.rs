use crate::cli::Args;
use std::error::Error;
use std::net::SocketAddr;

use axum::{ routing::get, Router, http::StatusCode, response::IntoResponse };
use tower_http::cors::{ Any, CorsLayer };
use tower_http::services::ServeDir;
use log::{ info, error };

/// Serves the static chat client and a health probe. Presentation only; the
/// chat protocol itself lives on the WebSocket listener.
pub async fn start_http_server(
    http_port: u16,
    args: Args
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = format!("0.0.0.0:{}", http_port).parse::<SocketAddr>()?;
    info!("Starting HTTP server on: http://{} (static dir: {})", addr, args.static_dir);

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let app = Router::new()
        .route("/healthz", get(health_handler))
        .fallback_service(ServeDir::new(&args.static_dir))
        .layer(cors);

    tokio::spawn(async move {
        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                    error!("HTTP server error: {}", e);
                }
            }
            Err(e) => {
                error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
            }
        }
    });

    info!("HTTP server started");
    Ok(())
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
