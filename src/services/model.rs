//! Risk model service — CRUD and field synchronization.
//!
//! DESIGN
//! ======
//! A risk model is a named, user-defined schema: an ordered set of typed
//! fields. Fields get a `field_id` from a per-model sequence on first save
//! and a slug derived from their name, unique within the model; both are
//! stable keys (`field_id` for edits, slug for object values).
//!
//! Updates synchronize the field set against the submitted list: fields
//! arriving with a known `field_id` are updated in place, fields without
//! one are created, and existing fields absent from the submission are
//! deleted. The sync decision is a pure function (`plan_field_sync`) so it
//! can be tested without a database.

use std::collections::{HashMap, HashSet};

use sqlx::{PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;
use uuid::Uuid;

use crate::services::value::{FieldType, slugify, unique_slug};

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("risk model not found: {0}")]
    NotFound(Uuid),
    #[error("unknown field type in storage: {0}")]
    UnknownFieldType(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// One field of a risk model, as stored.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldRecord {
    pub field_id: i32,
    pub slug: String,
    pub name: String,
    pub field_type: FieldType,
    pub is_required: bool,
    /// Comma-separated admissible values; enum fields only.
    pub choices: Option<String>,
}

impl FieldRecord {
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut out = serde_json::json!({
            "field_id": self.field_id,
            "slug": self.slug,
            "name": self.name,
            "type": self.field_type.as_str(),
            "is_required": self.is_required,
        });
        if let Some(choices) = &self.choices {
            out["choices"] = serde_json::Value::String(choices.clone());
        }
        out
    }
}

/// A risk model with its fields. Listings are newest-first.
#[derive(Clone, Debug, PartialEq)]
pub struct RiskModelRecord {
    pub uuid: Uuid,
    pub name: String,
    pub created: OffsetDateTime,
    pub fields: Vec<FieldRecord>,
}

impl RiskModelRecord {
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "uuid": self.uuid,
            "name": self.name,
            "created": self.created.format(&Rfc3339).unwrap_or_else(|_| self.created.to_string()),
            "fields": self.fields.iter().map(FieldRecord::to_json).collect::<Vec<_>>(),
        })
    }
}

/// A submitted field definition (already shape-validated by the API layer).
#[derive(Clone, Debug)]
pub struct FieldSpec {
    pub field_id: Option<i32>,
    pub name: String,
    pub field_type: FieldType,
    pub is_required: bool,
    pub choices: Option<String>,
}

// =============================================================================
// CREATE
// =============================================================================

/// Create a model with its fields. Field ids start at 1 for a fresh model;
/// slugs are derived from names and de-duplicated within the batch.
///
/// # Errors
///
/// Returns a database error if any insert fails.
pub async fn create_model(
    pool: &PgPool,
    name: &str,
    fields: &[FieldSpec],
) -> Result<RiskModelRecord, ModelError> {
    let uuid = Uuid::new_v4();

    let mut tx = pool.begin().await?;

    let created: OffsetDateTime = sqlx::query_scalar(
        "INSERT INTO risk_models (uuid, name) VALUES ($1, $2) RETURNING created",
    )
    .bind(uuid)
    .bind(name)
    .fetch_one(&mut *tx)
    .await?;

    let mut taken = HashSet::new();
    let mut records = Vec::with_capacity(fields.len());
    for (i, spec) in fields.iter().enumerate() {
        let field_id = i32::try_from(i + 1).unwrap_or(i32::MAX);
        let slug = unique_slug(&slugify(&spec.name), &taken);
        taken.insert(slug.clone());
        records.push(FieldRecord {
            field_id,
            slug,
            name: spec.name.clone(),
            field_type: spec.field_type,
            is_required: spec.is_required,
            choices: spec.choices.clone(),
        });
    }

    for record in &records {
        upsert_field(&mut tx, uuid, record).await?;
    }

    tx.commit().await?;

    info!(model = %uuid, fields = records.len(), "risk model created");
    Ok(RiskModelRecord { uuid, name: name.to_string(), created, fields: records })
}

// =============================================================================
// READ
// =============================================================================

/// List all models, newest first, with fields in `field_id` order.
///
/// # Errors
///
/// Returns a database error if a query fails, or `UnknownFieldType` if a
/// stored type string no longer parses.
pub async fn list_models(pool: &PgPool) -> Result<Vec<RiskModelRecord>, ModelError> {
    let models = sqlx::query_as::<_, (Uuid, String, OffsetDateTime)>(
        "SELECT uuid, name, created FROM risk_models ORDER BY created DESC, uuid",
    )
    .fetch_all(pool)
    .await?;

    let mut fields = fetch_fields(pool, None).await?;

    Ok(models
        .into_iter()
        .map(|(uuid, name, created)| RiskModelRecord {
            uuid,
            name,
            created,
            fields: fields.remove(&uuid).unwrap_or_default(),
        })
        .collect())
}

/// Fetch one model by uuid.
///
/// # Errors
///
/// Returns `NotFound` when no model has this uuid.
pub async fn get_model(pool: &PgPool, uuid: Uuid) -> Result<RiskModelRecord, ModelError> {
    let row = sqlx::query_as::<_, (String, OffsetDateTime)>(
        "SELECT name, created FROM risk_models WHERE uuid = $1",
    )
    .bind(uuid)
    .fetch_optional(pool)
    .await?
    .ok_or(ModelError::NotFound(uuid))?;

    let mut fields = fetch_fields(pool, Some(uuid)).await?;

    Ok(RiskModelRecord {
        uuid,
        name: row.0,
        created: row.1,
        fields: fields.remove(&uuid).unwrap_or_default(),
    })
}

/// Load fields for one model or for all of them, grouped by model uuid.
async fn fetch_fields(
    pool: &PgPool,
    model: Option<Uuid>,
) -> Result<HashMap<Uuid, Vec<FieldRecord>>, ModelError> {
    let rows = sqlx::query_as::<_, (Uuid, i32, String, String, String, bool, Option<String>)>(
        "SELECT model_uuid, field_id, slug, name, field_type, is_required, choices
         FROM risk_model_fields
         WHERE $1::uuid IS NULL OR model_uuid = $1
         ORDER BY model_uuid, field_id",
    )
    .bind(model)
    .fetch_all(pool)
    .await?;

    let mut by_model: HashMap<Uuid, Vec<FieldRecord>> = HashMap::new();
    for (model_uuid, field_id, slug, name, field_type, is_required, choices) in rows {
        let field_type = FieldType::from_str(&field_type)
            .ok_or(ModelError::UnknownFieldType(field_type))?;
        by_model.entry(model_uuid).or_default().push(FieldRecord {
            field_id,
            slug,
            name,
            field_type,
            is_required,
            choices,
        });
    }

    Ok(by_model)
}

// =============================================================================
// FIELD SYNC
// =============================================================================

/// The field mutations an update implies.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldSyncPlan {
    /// Fields to write, updated and newly created alike; applied as an
    /// upsert keyed on `(model, field_id)`.
    pub upserts: Vec<FieldRecord>,
    /// Existing `field_id`s absent from the submission.
    pub delete_field_ids: Vec<i32>,
}

/// Decide field mutations for an update submission.
///
/// Incoming fields with a known `field_id` keep their stored slug and type
/// (a field's type is fixed at creation; object values are already stored
/// under it); fields without an id are assigned the next id past every id
/// in sight and a fresh slug unique among surviving fields.
#[must_use]
pub fn plan_field_sync(existing: &[FieldRecord], incoming: &[FieldSpec]) -> FieldSyncPlan {
    let by_id: HashMap<i32, &FieldRecord> =
        existing.iter().map(|f| (f.field_id, f)).collect();

    let submitted_ids: HashSet<i32> =
        incoming.iter().filter_map(|spec| spec.field_id).collect();

    // Slugs already spoken for: surviving fields keep theirs.
    let mut taken: HashSet<String> = existing
        .iter()
        .filter(|f| submitted_ids.contains(&f.field_id))
        .map(|f| f.slug.clone())
        .collect();

    let mut next_id = existing
        .iter()
        .map(|f| f.field_id)
        .chain(submitted_ids.iter().copied())
        .max()
        .unwrap_or(0)
        + 1;

    let mut upserts = Vec::with_capacity(incoming.len());
    for spec in incoming {
        let (field_id, slug, field_type) = match spec.field_id {
            Some(id) => match by_id.get(&id) {
                // Known field: slug and type are immutable, only the name,
                // required flag, and choices follow the submission.
                Some(current) => (id, current.slug.clone(), current.field_type),
                // Unknown id: honor it and create the field under that id.
                None => (id, unique_slug(&slugify(&spec.name), &taken), spec.field_type),
            },
            None => {
                let id = next_id;
                next_id += 1;
                (id, unique_slug(&slugify(&spec.name), &taken), spec.field_type)
            }
        };
        taken.insert(slug.clone());
        upserts.push(FieldRecord {
            field_id,
            slug,
            name: spec.name.clone(),
            field_type,
            is_required: spec.is_required,
            choices: spec.choices.clone(),
        });
    }

    let kept: HashSet<i32> = upserts.iter().map(|f| f.field_id).collect();
    let delete_field_ids =
        existing.iter().map(|f| f.field_id).filter(|id| !kept.contains(id)).collect();

    FieldSyncPlan { upserts, delete_field_ids }
}

// =============================================================================
// UPDATE
// =============================================================================

/// Rename a model and synchronize its field set.
///
/// # Errors
///
/// Returns `NotFound` when the model doesn't exist, or a database error.
pub async fn update_model(
    pool: &PgPool,
    uuid: Uuid,
    name: &str,
    fields: &[FieldSpec],
) -> Result<RiskModelRecord, ModelError> {
    let existing = get_model(pool, uuid).await?;
    let plan = plan_field_sync(&existing.fields, fields);

    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE risk_models SET name = $1 WHERE uuid = $2")
        .bind(name)
        .bind(uuid)
        .execute(&mut *tx)
        .await?;

    if !plan.delete_field_ids.is_empty() {
        sqlx::query(
            "DELETE FROM risk_model_fields WHERE model_uuid = $1 AND field_id = ANY($2)",
        )
        .bind(uuid)
        .bind(&plan.delete_field_ids)
        .execute(&mut *tx)
        .await?;
    }

    for record in &plan.upserts {
        upsert_field(&mut tx, uuid, record).await?;
    }

    tx.commit().await?;

    info!(
        model = %uuid,
        upserted = plan.upserts.len(),
        deleted = plan.delete_field_ids.len(),
        "risk model updated"
    );

    Ok(RiskModelRecord {
        uuid,
        name: name.to_string(),
        created: existing.created,
        fields: plan.upserts,
    })
}

async fn upsert_field(
    tx: &mut Transaction<'_, Postgres>,
    model_uuid: Uuid,
    record: &FieldRecord,
) -> Result<(), ModelError> {
    sqlx::query(
        "INSERT INTO risk_model_fields
             (model_uuid, field_id, slug, name, field_type, is_required, choices)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (model_uuid, field_id) DO UPDATE
             SET name = EXCLUDED.name,
                 is_required = EXCLUDED.is_required,
                 choices = EXCLUDED.choices",
    )
    .bind(model_uuid)
    .bind(record.field_id)
    .bind(&record.slug)
    .bind(&record.name)
    .bind(record.field_type.as_str())
    .bind(record.is_required)
    .bind(&record.choices)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// DELETE
// =============================================================================

/// Delete a model; fields and objects cascade.
///
/// # Errors
///
/// Returns `NotFound` when the model doesn't exist.
pub async fn delete_model(pool: &PgPool, uuid: Uuid) -> Result<(), ModelError> {
    let result = sqlx::query("DELETE FROM risk_models WHERE uuid = $1")
        .bind(uuid)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ModelError::NotFound(uuid));
    }

    info!(model = %uuid, "risk model deleted");
    Ok(())
}
