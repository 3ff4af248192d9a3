//! Demonstration server wiring the engine into an axum application.

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{Extension, MatchedPath},
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, info_span, warn, Span};
use ulid::Ulid;

use crate::auth::Registry;

pub mod directory;
pub mod handlers;
pub mod state;

use self::{directory::Directory, state::AppState};

/// Paths served regardless of configuration.
const ROUTES: [&str; 9] = [
    "/health",
    "/signin",
    "/signout",
    "/protected",
    "/account",
    "/authorized",
    "/admin",
    "/admin/:rank",
    "/user",
];

/// Build the application router over `state`, including a landing page on
/// the registry's failed route.
pub fn router(state: Arc<AppState>) -> Router {
    let failed_route = state.lane().registry().failed_route().to_string();

    let mut app = Router::new()
        .route("/health", get(handlers::health))
        .route("/signin", post(handlers::signin))
        .route("/signout", get(handlers::signout))
        .route("/protected", get(handlers::protected))
        .route(handlers::ACCOUNT_ROUTE, get(handlers::account))
        .route("/authorized", get(handlers::authorized))
        .route("/admin", get(handlers::admin))
        .route("/admin/:rank", get(handlers::admin_rank))
        .route("/user", get(handlers::user));

    if failed_route.starts_with('/') && !ROUTES.contains(&failed_route.as_str()) {
        app = app.route(&failed_route, get(handlers::unauthorized));
    } else {
        warn!("failed route {failed_route} is not served by the router");
    }

    app.layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(Extension(state)),
    )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, registry: Registry) -> Result<()> {
    let state = Arc::new(AppState::new(registry, Arc::new(Directory::seeded())));
    info!(registry = ?state.lane().registry(), "authlane configured");

    let app = router(state);

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
