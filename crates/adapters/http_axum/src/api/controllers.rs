//! JSON REST handlers for controller status.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use thermodiff_app::status::ControllerStatus;
use thermodiff_domain::error::NotFoundError;
use thermodiff_domain::id::DeviceId;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<ControllerStatus>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<ControllerStatus>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/controllers`
pub async fn list(State(state): State<AppState>) -> ListResponse {
    ListResponse::Ok(Json(state.status.list()))
}

/// `GET /api/controllers/{device}`
pub async fn get(
    State(state): State<AppState>,
    Path(device): Path<String>,
) -> Result<GetResponse, ApiError> {
    let device: DeviceId = device.parse()?;
    let status = state.status.get(&device).ok_or_else(|| NotFoundError {
        entity: "Controller",
        id: device.to_string(),
    })?;
    Ok(GetResponse::Ok(Json(status)))
}
