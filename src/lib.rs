//! Worldpay redirect gateway
//!
//! Implements the redirect-and-notify protocol against the provider's
//! hosted payment page: builds signed outbound payment requests for
//! orders entering checkout, and reconciles the provider's asynchronous
//! Payment Response into idempotent payment records.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod address;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod notification;
pub mod openapi;
pub mod redirect;
pub mod services;
pub mod signature;
pub mod templates;

use axum::{
    extract::State,
    response::Json,
    routing::{any, get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::ToSchema;

use crate::config::GatewaySettings;
use crate::errors::GatewayError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub settings: Arc<GatewaySettings>,
}

/// Common response wrapper for JSON endpoints.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

/// Builds the application router.
///
/// The notification route is registered for any method: the validator
/// owns the method check and rejects non-POST probes as empty
/// notifications rather than letting the router answer 405.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route(
            "/api/v1/checkout/:order_number/worldpay",
            post(handlers::checkout::build_worldpay_redirect),
        )
        .route(config::NOTIFY_PATH, any(handlers::notify::worldpay_notify))
        .route(
            "/checkout/:order_number/payment/return",
            get(handlers::checkout::shopper_return),
        )
        .route(
            "/checkout/:order_number/payment/cancel",
            get(handlers::checkout::shopper_cancel),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    use utoipa::OpenApi;
    Json(openapi::ApiDoc::openapi())
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, GatewayError> {
    let db_status = if db::ping(&state.db).await {
        "healthy"
    } else {
        "unhealthy"
    };

    let health_data = json!({
        "status": db_status,
        "checks": { "database": db_status },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}
