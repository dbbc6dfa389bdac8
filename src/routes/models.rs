//! Risk model API routes.
//!
//! Payload validation lives here, service calls do the rest. Per-field
//! errors are reported positionally — one error object per submitted field,
//! in submission order — so the client can line messages up with inputs.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{Value, json};
use tracing::error;
use uuid::Uuid;

use crate::routes::{detail_error, validation_error};
use crate::services::model::{self, FieldSpec, ModelError, RiskModelRecord};
use crate::services::value::{FieldType, slugify};
use crate::state::AppState;

#[cfg(test)]
#[path = "models_test.rs"]
mod tests;

type ApiError = (StatusCode, Json<Value>);
type ApiResult = Result<(StatusCode, Json<Value>), ApiError>;

// =============================================================================
// VALIDATION
// =============================================================================

/// Shape-check a create/update submission into a name plus field specs.
///
/// # Errors
///
/// Returns the error body rendered under `"errors"`: top-level messages for
/// `name`/`fields`, or a positional array of per-field error objects.
pub(crate) fn validate_model_payload(data: &Value) -> Result<(String, Vec<FieldSpec>), Value> {
    let mut errors = serde_json::Map::new();

    let name = data.get("name").and_then(Value::as_str).unwrap_or("").trim().to_string();
    if name.is_empty() {
        errors.insert("name".to_string(), json!("Name must not be empty"));
    }

    let mut specs = Vec::new();
    match data.get("fields") {
        None | Some(Value::Null) => {}
        Some(Value::Array(fields)) => {
            let mut has_error = false;
            let mut fields_errors = Vec::with_capacity(fields.len());

            for field in fields {
                let mut field_errors = serde_json::Map::new();

                let field_name =
                    field.get("name").and_then(Value::as_str).unwrap_or("").trim().to_string();
                if field_name.is_empty() {
                    has_error = true;
                    field_errors.insert("name".to_string(), json!("Name must not be empty"));
                } else if slugify(&field_name).is_empty() {
                    // A name of pure punctuation would slug to an empty
                    // object-value key.
                    has_error = true;
                    field_errors.insert(
                        "name".to_string(),
                        json!("Name must contain letters or numbers"),
                    );
                }

                let raw_type = field.get("type").and_then(Value::as_str).unwrap_or("");
                let field_type = if raw_type.is_empty() {
                    has_error = true;
                    field_errors.insert("type".to_string(), json!("Type must not be empty"));
                    None
                } else {
                    match FieldType::from_str(raw_type) {
                        Some(t) => Some(t),
                        None => {
                            has_error = true;
                            field_errors.insert("type".to_string(), json!("Type is invalid"));
                            None
                        }
                    }
                };

                let choices =
                    field.get("choices").and_then(Value::as_str).map(str::to_string);
                if field_type == Some(FieldType::Enum)
                    && choices.as_deref().is_none_or(|c| c.trim().is_empty())
                {
                    has_error = true;
                    field_errors
                        .insert("choices".to_string(), json!("Choices must not be empty"));
                }

                let field_id = match field.get("field_id") {
                    None | Some(Value::Null) => None,
                    Some(v) => match v.as_i64().and_then(|id| i32::try_from(id).ok()) {
                        // Ids come from a 1-based per-model sequence.
                        Some(id) if id >= 1 => Some(id),
                        Some(_) => {
                            has_error = true;
                            field_errors.insert(
                                "field_id".to_string(),
                                json!("Field id must be a positive integer"),
                            );
                            None
                        }
                        None => {
                            has_error = true;
                            field_errors
                                .insert("field_id".to_string(), json!("Field id must be an integer"));
                            None
                        }
                    },
                };

                if let Some(field_type) = field_type {
                    specs.push(FieldSpec {
                        field_id,
                        name: field_name,
                        field_type,
                        is_required: field
                            .get("is_required")
                            .and_then(Value::as_bool)
                            .unwrap_or(false),
                        choices,
                    });
                }

                fields_errors.push(Value::Object(field_errors));
            }

            if has_error {
                errors.insert("fields".to_string(), Value::Array(fields_errors));
            }
        }
        Some(_) => {
            errors.insert("fields".to_string(), json!("Fields must be a list"));
        }
    }

    if errors.is_empty() { Ok((name, specs)) } else { Err(Value::Object(errors)) }
}

pub(crate) fn model_error_to_response(err: ModelError) -> ApiError {
    match err {
        ModelError::NotFound(_) => detail_error(StatusCode::NOT_FOUND, "Risk model not found"),
        ModelError::UnknownFieldType(_) | ModelError::Database(_) => {
            error!(error = %err, "model operation failed");
            detail_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /api/models` — list models, `{count, results}` envelope.
///
/// This is also the store's data-loading path: the shared collection is
/// wholesale-replaced with the fresh listing.
pub async fn list_models(State(state): State<AppState>) -> ApiResult {
    let models = model::list_models(&state.pool).await.map_err(model_error_to_response)?;
    let results: Vec<Value> = models.iter().map(RiskModelRecord::to_json).collect();

    state.store.write().await.set_risk_models(models);

    Ok((StatusCode::OK, Json(json!({ "count": results.len(), "results": results }))))
}

/// `POST /api/models` — create a model with its fields.
pub async fn create_model(State(state): State<AppState>, Json(body): Json<Value>) -> ApiResult {
    let (name, fields) = validate_model_payload(&body).map_err(validation_error)?;

    let record = model::create_model(&state.pool, &name, &fields)
        .await
        .map_err(model_error_to_response)?;

    Ok((StatusCode::CREATED, Json(record.to_json())))
}

/// `GET /api/models/:model_uuid` — fetch one model.
pub async fn get_model(
    State(state): State<AppState>,
    Path(model_uuid): Path<Uuid>,
) -> ApiResult {
    let record =
        model::get_model(&state.pool, model_uuid).await.map_err(model_error_to_response)?;
    Ok((StatusCode::OK, Json(record.to_json())))
}

/// `PUT /api/models/:model_uuid` — rename and synchronize fields.
pub async fn update_model(
    State(state): State<AppState>,
    Path(model_uuid): Path<Uuid>,
    Json(body): Json<Value>,
) -> ApiResult {
    let (name, fields) = validate_model_payload(&body).map_err(validation_error)?;

    let record = model::update_model(&state.pool, model_uuid, &name, &fields)
        .await
        .map_err(model_error_to_response)?;

    Ok((StatusCode::OK, Json(record.to_json())))
}

/// `DELETE /api/models/:model_uuid` — delete a model and everything under it.
pub async fn delete_model(
    State(state): State<AppState>,
    Path(model_uuid): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    model::delete_model(&state.pool, model_uuid).await.map_err(model_error_to_response)?;
    Ok(StatusCode::NO_CONTENT)
}
