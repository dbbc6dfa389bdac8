//! Risk object service — instances of a risk model.
//!
//! DESIGN
//! ======
//! An object is one row of user data conforming to a model's field schema.
//! Submissions arrive as a flat `{slug: naive value}` map; validation
//! resolves each slug against the model's fields and coerces the value per
//! field type (`validate_values` is pure and tested without a database).
//! Storage keeps one row per value with the field type cached and exactly
//! one typed column populated.
//!
//! Serialization flattens values back under their slugs:
//! `{uuid, created, brand: "Toyota", seats: 4, ...}`.

use std::collections::BTreeMap;

use sqlx::PgPool;
use time::{Date, OffsetDateTime};
use time::format_description::well_known::Rfc3339;
use tracing::info;
use uuid::Uuid;

use crate::services::model::{self, FieldRecord, ModelError};
use crate::services::value::{self, FieldType, FieldValue};

#[cfg(test)]
#[path = "object_test.rs"]
mod tests;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    #[error("risk model not found: {0}")]
    ModelNotFound(Uuid),
    #[error("risk object not found: {0}")]
    NotFound(Uuid),
    #[error("invalid object values")]
    Validation(BTreeMap<String, String>),
    #[error("unknown field type in storage: {0}")]
    UnknownFieldType(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ModelError> for ObjectError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::NotFound(uuid) => Self::ModelNotFound(uuid),
            ModelError::UnknownFieldType(raw) => Self::UnknownFieldType(raw),
            ModelError::Database(e) => Self::Database(e),
        }
    }
}

/// One typed value of an object, keyed by the field's slug.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectValueRecord {
    pub field_id: i32,
    pub slug: String,
    pub value: FieldValue,
}

/// An object with its values. Listings are newest-first.
#[derive(Clone, Debug, PartialEq)]
pub struct RiskObjectRecord {
    pub uuid: Uuid,
    pub model_uuid: Uuid,
    pub created: OffsetDateTime,
    pub values: Vec<ObjectValueRecord>,
}

impl RiskObjectRecord {
    /// Flat JSON form: metadata plus one key per field slug.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut out = serde_json::json!({
            "uuid": self.uuid,
            "created": self.created.format(&Rfc3339).unwrap_or_else(|_| self.created.to_string()),
        });
        for value in &self.values {
            out[value.slug.as_str()] = value.value.to_json();
        }
        out
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Resolve a `{slug: naive value}` submission against a model's fields.
///
/// # Errors
///
/// Returns a slug-keyed error map: unknown slugs, missing required fields,
/// and per-type coercion failures, all reported together.
pub fn validate_values(
    fields: &[FieldRecord],
    payload: &serde_json::Map<String, serde_json::Value>,
) -> Result<Vec<ObjectValueRecord>, BTreeMap<String, String>> {
    let mut errors = BTreeMap::new();
    let mut values = Vec::new();

    for (slug, naive) in payload {
        let Some(field) = fields.iter().find(|f| &f.slug == slug) else {
            errors.insert(slug.clone(), "No such field".to_string());
            continue;
        };

        match value::coerce(field.field_type, naive, field.choices.as_deref()) {
            Ok(value) => values.push(ObjectValueRecord {
                field_id: field.field_id,
                slug: slug.clone(),
                value,
            }),
            Err(e) => {
                errors.insert(slug.clone(), e.to_string());
            }
        }
    }

    for field in fields {
        if field.is_required && !payload.contains_key(&field.slug) {
            errors.insert(field.slug.clone(), "This field is required".to_string());
        }
    }

    if errors.is_empty() { Ok(values) } else { Err(errors) }
}

// =============================================================================
// CREATE
// =============================================================================

/// Create an object under a model from a slug-keyed value submission.
///
/// # Errors
///
/// Returns `ModelNotFound`, `Validation` with the slug-keyed error map, or
/// a database error.
pub async fn create_object(
    pool: &PgPool,
    model_uuid: Uuid,
    payload: &serde_json::Map<String, serde_json::Value>,
) -> Result<RiskObjectRecord, ObjectError> {
    let model = model::get_model(pool, model_uuid).await?;
    let values = validate_values(&model.fields, payload).map_err(ObjectError::Validation)?;

    let uuid = Uuid::new_v4();
    let mut tx = pool.begin().await?;

    let created: OffsetDateTime = sqlx::query_scalar(
        "INSERT INTO risk_model_objects (uuid, model_uuid) VALUES ($1, $2) RETURNING created",
    )
    .bind(uuid)
    .bind(model_uuid)
    .fetch_one(&mut *tx)
    .await?;

    for record in &values {
        let (text, number, date, enumv) = storage_columns(&record.value);
        sqlx::query(
            "INSERT INTO risk_model_object_values
                 (object_uuid, model_uuid, field_id, field_type,
                  value_text, value_number, value_date, value_enum)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(uuid)
        .bind(model_uuid)
        .bind(record.field_id)
        .bind(record.value.field_type().as_str())
        .bind(text)
        .bind(number)
        .bind(date)
        .bind(enumv)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(object = %uuid, model = %model_uuid, values = values.len(), "risk object created");
    Ok(RiskObjectRecord { uuid, model_uuid, created, values })
}

/// Split a typed value into its storage columns; exactly one is set.
fn storage_columns(value: &FieldValue) -> (Option<String>, Option<i64>, Option<Date>, Option<String>) {
    match value {
        FieldValue::Text(s) => (Some(s.clone()), None, None, None),
        FieldValue::Number(n) => (None, Some(*n), None, None),
        FieldValue::Date(d) => (None, None, Some(*d), None),
        FieldValue::Enum(s) => (None, None, None, Some(s.clone())),
    }
}

// =============================================================================
// READ
// =============================================================================

type ValueRow = (Uuid, i32, String, String, Option<String>, Option<i64>, Option<Date>, Option<String>);

/// List a model's objects, newest first.
///
/// # Errors
///
/// Returns `ModelNotFound` or a database error.
pub async fn list_objects(
    pool: &PgPool,
    model_uuid: Uuid,
) -> Result<Vec<RiskObjectRecord>, ObjectError> {
    // Existence check first so an empty list isn't ambiguous.
    model::get_model(pool, model_uuid).await?;

    let objects = sqlx::query_as::<_, (Uuid, OffsetDateTime)>(
        "SELECT uuid, created FROM risk_model_objects
         WHERE model_uuid = $1
         ORDER BY created DESC, uuid",
    )
    .bind(model_uuid)
    .fetch_all(pool)
    .await?;

    let rows = sqlx::query_as::<_, ValueRow>(
        "SELECT v.object_uuid, v.field_id, f.slug, v.field_type,
                v.value_text, v.value_number, v.value_date, v.value_enum
         FROM risk_model_object_values v
         JOIN risk_model_fields f
           ON f.model_uuid = v.model_uuid AND f.field_id = v.field_id
         WHERE v.model_uuid = $1
         ORDER BY v.object_uuid, v.field_id",
    )
    .bind(model_uuid)
    .fetch_all(pool)
    .await?;

    let mut values: BTreeMap<Uuid, Vec<ObjectValueRecord>> = BTreeMap::new();
    for row in rows {
        let record = value_from_row(&row)?;
        values.entry(row.0).or_default().push(record);
    }

    Ok(objects
        .into_iter()
        .map(|(uuid, created)| RiskObjectRecord {
            uuid,
            model_uuid,
            created,
            values: values.remove(&uuid).unwrap_or_default(),
        })
        .collect())
}

/// Fetch one object by uuid.
///
/// # Errors
///
/// Returns `NotFound` or a database error.
pub async fn get_object(pool: &PgPool, uuid: Uuid) -> Result<RiskObjectRecord, ObjectError> {
    let (model_uuid, created) = sqlx::query_as::<_, (Uuid, OffsetDateTime)>(
        "SELECT model_uuid, created FROM risk_model_objects WHERE uuid = $1",
    )
    .bind(uuid)
    .fetch_optional(pool)
    .await?
    .ok_or(ObjectError::NotFound(uuid))?;

    let rows = sqlx::query_as::<_, ValueRow>(
        "SELECT v.object_uuid, v.field_id, f.slug, v.field_type,
                v.value_text, v.value_number, v.value_date, v.value_enum
         FROM risk_model_object_values v
         JOIN risk_model_fields f
           ON f.model_uuid = v.model_uuid AND f.field_id = v.field_id
         WHERE v.object_uuid = $1
         ORDER BY v.field_id",
    )
    .bind(uuid)
    .fetch_all(pool)
    .await?;

    let values = rows.iter().map(value_from_row).collect::<Result<Vec<_>, _>>()?;

    Ok(RiskObjectRecord { uuid, model_uuid, created, values })
}

/// Rebuild a typed value from its storage row, using the cached field type
/// to pick the populated column.
fn value_from_row(row: &ValueRow) -> Result<ObjectValueRecord, ObjectError> {
    let (_, field_id, slug, field_type, text, number, date, enumv) = row;
    let field_type = FieldType::from_str(field_type)
        .ok_or_else(|| ObjectError::UnknownFieldType(field_type.clone()))?;

    let value = match field_type {
        FieldType::Text => text.clone().map(FieldValue::Text),
        FieldType::Number => number.map(FieldValue::Number),
        FieldType::Date => date.map(FieldValue::Date),
        FieldType::Enum => enumv.clone().map(FieldValue::Enum),
    }
    .ok_or_else(|| ObjectError::UnknownFieldType(format!("{}: empty value column", slug)))?;

    Ok(ObjectValueRecord { field_id: *field_id, slug: slug.clone(), value })
}

// =============================================================================
// UPDATE
// =============================================================================

/// Replace an object's values from a slug-keyed submission. The submission
/// is validated against the owning model's current fields exactly like a
/// create, so required fields must be present again.
///
/// # Errors
///
/// Returns `NotFound`, `Validation` with the slug-keyed error map, or a
/// database error.
pub async fn update_object(
    pool: &PgPool,
    uuid: Uuid,
    payload: &serde_json::Map<String, serde_json::Value>,
) -> Result<RiskObjectRecord, ObjectError> {
    let (model_uuid, created) = sqlx::query_as::<_, (Uuid, OffsetDateTime)>(
        "SELECT model_uuid, created FROM risk_model_objects WHERE uuid = $1",
    )
    .bind(uuid)
    .fetch_optional(pool)
    .await?
    .ok_or(ObjectError::NotFound(uuid))?;

    let model = model::get_model(pool, model_uuid).await?;
    let values = validate_values(&model.fields, payload).map_err(ObjectError::Validation)?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM risk_model_object_values WHERE object_uuid = $1")
        .bind(uuid)
        .execute(&mut *tx)
        .await?;

    for record in &values {
        let (text, number, date, enumv) = storage_columns(&record.value);
        sqlx::query(
            "INSERT INTO risk_model_object_values
                 (object_uuid, model_uuid, field_id, field_type,
                  value_text, value_number, value_date, value_enum)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(uuid)
        .bind(model_uuid)
        .bind(record.field_id)
        .bind(record.value.field_type().as_str())
        .bind(text)
        .bind(number)
        .bind(date)
        .bind(enumv)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(object = %uuid, model = %model_uuid, values = values.len(), "risk object updated");
    Ok(RiskObjectRecord { uuid, model_uuid, created, values })
}

// =============================================================================
// DELETE
// =============================================================================

/// Delete an object; its values cascade.
///
/// # Errors
///
/// Returns `NotFound` or a database error.
pub async fn delete_object(pool: &PgPool, uuid: Uuid) -> Result<(), ObjectError> {
    let result = sqlx::query("DELETE FROM risk_model_objects WHERE uuid = $1")
        .bind(uuid)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ObjectError::NotFound(uuid));
    }

    info!(object = %uuid, "risk object deleted");
    Ok(())
}
