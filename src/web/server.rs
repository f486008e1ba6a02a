use axum::{routing::get, routing::post, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::api::passes as pass_handlers;
use super::api::tracker as tracker_handlers;
use super::api_doc::ApiDoc;
use super::auth::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/tracker/status", get(tracker_handlers::status))
        .route("/api/tracker/select", post(tracker_handlers::select))
        .route("/api/tracker/engage", post(tracker_handlers::engage))
        .route("/api/tracker/disengage", post(tracker_handlers::disengage))
        .route("/api/tracker/recenter", post(tracker_handlers::recenter))
        .route("/api/tracker/mode", post(tracker_handlers::mode))
        .route("/api/tracker/offsets", post(tracker_handlers::offsets))
        .route("/api/passes", get(pass_handlers::list_passes))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(bind_addr: String, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await
}
