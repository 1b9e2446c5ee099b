//! Starting and cancelling flows, and the login QR code of a running login.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use snapcart_core::{CoordinatorError, SettingsError, TaskParameters};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub flow_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

fn coordinator_error(e: CoordinatorError) -> ApiError {
    let status = match &e {
        CoordinatorError::AlreadyRunning(_) => StatusCode::CONFLICT,
        CoordinatorError::InvalidParameters(_) => StatusCode::BAD_REQUEST,
        CoordinatorError::Settings(SettingsError::Invalid(_)) => StatusCode::BAD_REQUEST,
        CoordinatorError::Settings(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e)
}

/// Start a flow.
///
/// Without a body the task comes from the stored settings.
pub async fn start_acquisition(
    State(state): State<Arc<AppState>>,
    body: Option<Json<TaskParameters>>,
) -> Result<(StatusCode, Json<StartResponse>), ApiError> {
    let coordinator = state.coordinator();
    let result = match body {
        Some(Json(params)) => coordinator.start_acquisition(params).await,
        None => coordinator.start_from_settings().await,
    };

    let flow_id = result.map_err(coordinator_error)?;
    info!("Flow {} started via API", flow_id);
    Ok((StatusCode::ACCEPTED, Json(StartResponse { flow_id })))
}

pub async fn cancel_acquisition(State(state): State<Arc<AppState>>) -> Json<CancelResponse> {
    Json(CancelResponse {
        cancelled: state.coordinator().cancel_current().await,
    })
}

/// The QR code to scan while a login is pending, as PNG.
pub async fn get_login_qr(State(state): State<Arc<AppState>>) -> Response {
    match state.coordinator().login_qr().await {
        Some(png) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        None => api_error(StatusCode::NOT_FOUND, "No login in progress").into_response(),
    }
}
