//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The JSON API lives under `/api`, the development bundle is served from
//! `/dist`, and everything else falls through to the SPA handler: paths the
//! client route table resolves get the shell HTML (history-API fallback),
//! anything else is a 404.

pub mod models;
pub mod objects;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::spa::shell;
use crate::state::AppState;

/// JSON API routes.
fn api_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/models", get(models::list_models).post(models::create_model))
        .route(
            "/api/models/{model_uuid}",
            get(models::get_model).put(models::update_model).delete(models::delete_model),
        )
        .route(
            "/api/models/{model_uuid}/objects",
            get(objects::list_objects).post(objects::create_object),
        )
        .route(
            "/api/models/objects/{object_uuid}",
            get(objects::get_object).put(objects::update_object).delete(objects::delete_object),
        )
        .route("/healthz", get(healthz))
        .layer(cors)
        .with_state(state)
}

/// Full application: API + static bundle output + SPA fallback.
pub fn app(state: AppState) -> Router {
    let spa = Router::new().fallback(spa_fallback).with_state(state.clone());

    api_routes(state)
        .nest_service("/dist", ServeDir::new("dist"))
        .merge(spa)
        .layer(TraceLayer::new_for_http())
}

/// History-API fallback: serve the shell for paths the client router owns.
async fn spa_fallback(State(state): State<AppState>, uri: Uri) -> Response {
    if state.route_table.resolve(uri.path()).is_none() {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    }

    let stats = shell::load_stats(&state.stats_root, &state.build_plan);
    Html(shell::render(&state.build_plan, stats.as_ref())).into_response()
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

// =============================================================================
// ERROR BODIES
// =============================================================================

/// `400` with the field-errors body the client renders next to its inputs.
pub(crate) fn validation_error(errors: serde_json::Value) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "errors": errors })))
}

/// Plain status-with-detail body for non-validation failures.
pub(crate) fn detail_error(status: StatusCode, detail: &str) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(serde_json::json!({ "detail": detail })))
}
