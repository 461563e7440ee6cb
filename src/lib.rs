pub mod config;
pub mod cors;
pub mod database;
pub mod error;
pub mod handlers;
pub mod models;
pub mod storage;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use cors::OriginAllowList;
use database::AppState;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState, allow_list: OriginAllowList, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/get/surveys", get(handlers::list_surveys_handler))
        .route(
            "/api/survey",
            post(handlers::submit_survey_handler).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .layer(allow_list.cors_layer())
        .layer(middleware::from_fn_with_state(
            allow_list,
            cors::reject_disallowed_origin,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
