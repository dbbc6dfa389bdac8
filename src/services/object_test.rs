use serde_json::json;
use time::macros::date;

use super::*;

fn car_fields() -> Vec<FieldRecord> {
    vec![
        FieldRecord {
            field_id: 1,
            slug: "brand".to_string(),
            name: "Brand".to_string(),
            field_type: FieldType::Text,
            is_required: true,
            choices: None,
        },
        FieldRecord {
            field_id: 2,
            slug: "purchased".to_string(),
            name: "Purchased".to_string(),
            field_type: FieldType::Date,
            is_required: false,
            choices: None,
        },
        FieldRecord {
            field_id: 3,
            slug: "seats".to_string(),
            name: "Seats".to_string(),
            field_type: FieldType::Number,
            is_required: false,
            choices: None,
        },
        FieldRecord {
            field_id: 4,
            slug: "type-of-car".to_string(),
            name: "Type of Car".to_string(),
            field_type: FieldType::Enum,
            is_required: false,
            choices: Some("Sedan,SUV,Eco,Sport".to_string()),
        },
    ]
}

fn payload(json: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    json.as_object().unwrap().clone()
}

#[test]
fn valid_submission_coerces_every_type() {
    let values = validate_values(
        &car_fields(),
        &payload(json!({
            "brand": "Toyota",
            "purchased": "2016-12-01",
            "seats": 4,
            "type-of-car": "Sedan",
        })),
    )
    .unwrap();

    assert_eq!(values.len(), 4);
    let by_slug = |slug: &str| values.iter().find(|v| v.slug == slug).unwrap();
    assert_eq!(by_slug("brand").value, FieldValue::Text("Toyota".to_string()));
    assert_eq!(by_slug("purchased").value, FieldValue::Date(date!(2016 - 12 - 01)));
    assert_eq!(by_slug("seats").value, FieldValue::Number(4));
    assert_eq!(by_slug("type-of-car").value, FieldValue::Enum("Sedan".to_string()));
    assert_eq!(by_slug("brand").field_id, 1);
}

#[test]
fn unknown_slug_is_rejected() {
    let err = validate_values(&car_fields(), &payload(json!({"brand": "Toyota", "wheels": 4})))
        .unwrap_err();
    assert_eq!(err.get("wheels").map(String::as_str), Some("No such field"));
}

#[test]
fn missing_required_field_is_rejected() {
    let err = validate_values(&car_fields(), &payload(json!({"seats": 4}))).unwrap_err();
    assert_eq!(err.get("brand").map(String::as_str), Some("This field is required"));
}

#[test]
fn errors_are_collected_per_slug_not_short_circuited() {
    let err = validate_values(
        &car_fields(),
        &payload(json!({
            "purchased": "yesterday",
            "seats": "many",
            "type-of-car": "Truck",
        })),
    )
    .unwrap_err();

    assert_eq!(err.len(), 4); // three bad values + missing required brand
    assert!(err.contains_key("brand"));
    assert!(err.contains_key("purchased"));
    assert!(err.contains_key("seats"));
    assert!(err.contains_key("type-of-car"));
}

#[test]
fn optional_fields_may_be_omitted() {
    let values = validate_values(&car_fields(), &payload(json!({"brand": "Toyota"}))).unwrap();
    assert_eq!(values.len(), 1);
}

#[test]
fn object_json_flattens_values_under_slugs() {
    let record = RiskObjectRecord {
        uuid: Uuid::nil(),
        model_uuid: Uuid::nil(),
        created: OffsetDateTime::UNIX_EPOCH,
        values: vec![
            ObjectValueRecord {
                field_id: 1,
                slug: "brand".to_string(),
                value: FieldValue::Text("Toyota".to_string()),
            },
            ObjectValueRecord {
                field_id: 3,
                slug: "seats".to_string(),
                value: FieldValue::Number(4),
            },
        ],
    };

    let json = record.to_json();
    assert_eq!(json["brand"], "Toyota");
    assert_eq!(json["seats"], 4);
    assert_eq!(json["created"], "1970-01-01T00:00:00Z");
    assert!(json.get("model_uuid").is_none());
}

#[test]
fn storage_columns_populate_exactly_one_slot() {
    let cases = [
        FieldValue::Text("x".to_string()),
        FieldValue::Number(1),
        FieldValue::Date(date!(2016 - 12 - 01)),
        FieldValue::Enum("Sedan".to_string()),
    ];
    for value in cases {
        let (text, number, date, enumv) = storage_columns(&value);
        let populated = [text.is_some(), number.is_some(), date.is_some(), enumv.is_some()];
        assert_eq!(populated.iter().filter(|p| **p).count(), 1);
    }
}

#[test]
fn value_from_row_uses_cached_field_type() {
    let row: ValueRow = (
        Uuid::nil(),
        2,
        "purchased".to_string(),
        "date".to_string(),
        None,
        None,
        Some(date!(2016 - 12 - 01)),
        None,
    );
    let record = value_from_row(&row).unwrap();
    assert_eq!(record.value, FieldValue::Date(date!(2016 - 12 - 01)));

    let bad: ValueRow =
        (Uuid::nil(), 2, "purchased".to_string(), "blob".to_string(), None, None, None, None);
    assert!(matches!(value_from_row(&bad), Err(ObjectError::UnknownFieldType(_))));
}
