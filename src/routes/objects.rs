//! Risk object API routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{Value, json};
use tracing::error;
use uuid::Uuid;

use crate::routes::{detail_error, validation_error};
use crate::services::object::{self, ObjectError, RiskObjectRecord};
use crate::state::AppState;

#[cfg(test)]
#[path = "objects_test.rs"]
mod tests;

type ApiError = (StatusCode, Json<Value>);
type ApiResult = Result<(StatusCode, Json<Value>), ApiError>;

pub(crate) fn object_error_to_response(err: ObjectError) -> ApiError {
    match err {
        ObjectError::ModelNotFound(_) => {
            detail_error(StatusCode::NOT_FOUND, "Risk model not found")
        }
        ObjectError::NotFound(_) => detail_error(StatusCode::NOT_FOUND, "Risk object not found"),
        ObjectError::Validation(errors) => {
            validation_error(json!(errors))
        }
        ObjectError::UnknownFieldType(_) | ObjectError::Database(_) => {
            error!(error = %err, "object operation failed");
            detail_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /api/models/:model_uuid/objects` — list a model's objects.
pub async fn list_objects(
    State(state): State<AppState>,
    Path(model_uuid): Path<Uuid>,
) -> ApiResult {
    let objects = object::list_objects(&state.pool, model_uuid)
        .await
        .map_err(object_error_to_response)?;
    let results: Vec<Value> = objects.iter().map(RiskObjectRecord::to_json).collect();

    Ok((StatusCode::OK, Json(json!({ "count": results.len(), "results": results }))))
}

/// `POST /api/models/:model_uuid/objects` — create an object from a
/// `{slug: value}` submission.
pub async fn create_object(
    State(state): State<AppState>,
    Path(model_uuid): Path<Uuid>,
    Json(body): Json<Value>,
) -> ApiResult {
    let Some(payload) = body.as_object() else {
        return Err(validation_error(json!({
            "non_field_errors": "Submission must be an object of field values"
        })));
    };

    let record = object::create_object(&state.pool, model_uuid, payload)
        .await
        .map_err(object_error_to_response)?;

    Ok((StatusCode::CREATED, Json(record.to_json())))
}

/// `GET /api/models/objects/:object_uuid` — fetch one object.
pub async fn get_object(
    State(state): State<AppState>,
    Path(object_uuid): Path<Uuid>,
) -> ApiResult {
    let record = object::get_object(&state.pool, object_uuid)
        .await
        .map_err(object_error_to_response)?;
    Ok((StatusCode::OK, Json(record.to_json())))
}

/// `PUT /api/models/objects/:object_uuid` — replace an object's values
/// from a `{slug: value}` submission.
pub async fn update_object(
    State(state): State<AppState>,
    Path(object_uuid): Path<Uuid>,
    Json(body): Json<Value>,
) -> ApiResult {
    let Some(payload) = body.as_object() else {
        return Err(validation_error(json!({
            "non_field_errors": "Submission must be an object of field values"
        })));
    };

    let record = object::update_object(&state.pool, object_uuid, payload)
        .await
        .map_err(object_error_to_response)?;

    Ok((StatusCode::OK, Json(record.to_json())))
}

/// `DELETE /api/models/objects/:object_uuid` — delete an object.
pub async fn delete_object(
    State(state): State<AppState>,
    Path(object_uuid): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    object::delete_object(&state.pool, object_uuid).await.map_err(object_error_to_response)?;
    Ok(StatusCode::NO_CONTENT)
}
