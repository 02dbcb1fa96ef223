pub mod api;
pub mod routes;

use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;

use crate::config::AppConfig;
pub use crate::server::api::ServerContext;
use crate::server::routes::route_request;

/// Router that hands every request to [route_request]. Requests run on the blocking pool
/// because projections are CPU-bound.
pub fn router(ctx: ServerContext) -> Router {
    Router::new().fallback(dispatch).with_state(ctx)
}

async fn dispatch(
    State(ctx): State<ServerContext>,
    method: Method,
    uri: Uri,
    body: String,
) -> Response {
    let path = uri.path().to_string();
    let joined = tokio::task::spawn_blocking(move || {
        route_request(method.as_str(), &path, &body, &ctx)
    })
    .await;
    match joined {
        Ok(response) => {
            let status =
                StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, [(header::CONTENT_TYPE, response.content_type)], response.body).into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "request handler panicked");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
    }
}

pub fn run_server(config: &AppConfig) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let ctx = ServerContext::new(config.clone());
    runtime.block_on(async move {
        let listener = TcpListener::bind(&config.bind).await?;
        tracing::info!(
            bind = %config.bind,
            data_dir = %config.data_dir.display(),
            "playoff_odds server listening"
        );
        axum::serve(listener, router(ctx)).await
    })
}
