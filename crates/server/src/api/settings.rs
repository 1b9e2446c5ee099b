use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use snapcart_core::{Settings, SettingsError};
use std::sync::Arc;
use tracing::info;

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

/// Partial settings update. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSettingsBody {
    pub item_id: Option<String>,
    pub area_id: Option<String>,
    pub count: Option<u32>,
    pub poll_interval_secs: Option<u64>,
    /// An empty string removes the stored password.
    pub payment_password: Option<String>,
}

impl UpdateSettingsBody {
    fn apply(self, settings: &mut Settings) {
        if let Some(item_id) = self.item_id {
            settings.item_id = item_id.trim().to_string();
        }
        if let Some(area_id) = self.area_id {
            settings.area_id = area_id.trim().to_string();
        }
        if let Some(count) = self.count {
            settings.count = count;
        }
        if let Some(interval) = self.poll_interval_secs {
            settings.poll_interval_secs = interval;
        }
        if let Some(password) = self.payment_password {
            settings.payment_password = Some(password).filter(|p| !p.is_empty());
        }
    }
}

fn settings_error(e: SettingsError) -> ApiError {
    let status = match e {
        SettingsError::Invalid(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e)
}

/// Stored settings with the payment password masked.
pub async fn get_settings(State(state): State<Arc<AppState>>) -> Result<Json<Settings>, ApiError> {
    let settings = state.settings().load().map_err(settings_error)?;
    Ok(Json(settings.redacted()))
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UpdateSettingsBody>,
) -> Result<Json<Settings>, ApiError> {
    let store = state.settings();
    let mut settings = store.load().map_err(settings_error)?;
    let password_changed = body.payment_password.is_some();

    body.apply(&mut settings);
    settings.validate().map_err(settings_error)?;
    store.save(&settings).map_err(settings_error)?;

    if password_changed {
        state
            .session()
            .set_payment_password(settings.payment_password.clone());
    }
    info!("Settings updated for item {:?}", settings.item_id);

    Ok(Json(settings.redacted()))
}
