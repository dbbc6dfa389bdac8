use std::collections::HashSet;

use serde_json::json;
use time::macros::date;

use super::*;

#[test]
fn field_type_round_trips() {
    for raw in ["text", "number", "date", "enum"] {
        assert_eq!(FieldType::from_str(raw).unwrap().as_str(), raw);
    }
    assert!(FieldType::from_str("datetime").is_none());
    assert!(FieldType::from_str("").is_none());
}

#[test]
fn text_accepts_strings_and_renders_scalars() {
    assert_eq!(
        coerce(FieldType::Text, &json!("Toyota"), None).unwrap(),
        FieldValue::Text("Toyota".to_string())
    );
    assert_eq!(
        coerce(FieldType::Text, &json!(42), None).unwrap(),
        FieldValue::Text("42".to_string())
    );
    assert_eq!(coerce(FieldType::Text, &json!(["a"]), None), Err(ValueError::NotText));
}

#[test]
fn number_accepts_integers_and_integer_strings() {
    assert_eq!(coerce(FieldType::Number, &json!(4), None).unwrap(), FieldValue::Number(4));
    assert_eq!(coerce(FieldType::Number, &json!("17"), None).unwrap(), FieldValue::Number(17));
    assert_eq!(coerce(FieldType::Number, &json!("four"), None), Err(ValueError::NotNumber));
    assert_eq!(coerce(FieldType::Number, &json!(1.5), None), Err(ValueError::NotNumber));
}

#[test]
fn date_accepts_iso_calendar_dates() {
    assert_eq!(
        coerce(FieldType::Date, &json!("2016-12-01"), None).unwrap(),
        FieldValue::Date(date!(2016 - 12 - 01))
    );
    assert_eq!(coerce(FieldType::Date, &json!("12/01/2016"), None), Err(ValueError::NotDate));
    assert_eq!(coerce(FieldType::Date, &json!(20161201), None), Err(ValueError::NotDate));
}

#[test]
fn enum_requires_a_declared_choice() {
    let choices = Some("Sedan,SUV,Eco,Sport");
    assert_eq!(
        coerce(FieldType::Enum, &json!("Sedan"), choices).unwrap(),
        FieldValue::Enum("Sedan".to_string())
    );
    assert_eq!(coerce(FieldType::Enum, &json!("Truck"), choices), Err(ValueError::NotAChoice));
    assert_eq!(coerce(FieldType::Enum, &json!("Sedan"), None), Err(ValueError::NotAChoice));
}

#[test]
fn choices_parsing_trims_and_skips_empties() {
    assert_eq!(parse_choices("Sedan, SUV ,,Eco"), vec!["Sedan", "SUV", "Eco"]);
    assert!(parse_choices("").is_empty());
}

#[test]
fn values_render_back_to_json() {
    assert_eq!(FieldValue::Text("x".into()).to_json(), json!("x"));
    assert_eq!(FieldValue::Number(4).to_json(), json!(4));
    assert_eq!(FieldValue::Date(date!(2016 - 12 - 01)).to_json(), json!("2016-12-01"));
    assert_eq!(FieldValue::Enum("Sedan".into()).to_json(), json!("Sedan"));
}

#[test]
fn slugify_matches_auto_slug_behavior() {
    assert_eq!(slugify("Type of Car"), "type-of-car");
    assert_eq!(slugify("Brand"), "brand");
    assert_eq!(slugify("  Weird -- Name!  "), "weird-name");
    assert_eq!(slugify("Año 2000"), "año-2000");
}

#[test]
fn unique_slug_appends_counter_on_collision() {
    let mut taken = HashSet::new();
    assert_eq!(unique_slug("brand", &taken), "brand");

    taken.insert("brand".to_string());
    assert_eq!(unique_slug("brand", &taken), "brand-2");

    taken.insert("brand-2".to_string());
    assert_eq!(unique_slug("brand", &taken), "brand-3");
}
