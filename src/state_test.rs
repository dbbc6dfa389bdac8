use super::*;
use crate::services::model::RiskModelRecord;
use time::OffsetDateTime;
use uuid::Uuid;

fn record(name: &str) -> RiskModelRecord {
    RiskModelRecord {
        uuid: Uuid::new_v4(),
        name: name.to_string(),
        created: OffsetDateTime::UNIX_EPOCH,
        fields: Vec::new(),
    }
}

#[test]
fn store_starts_empty() {
    let store = RiskModelStore::new();
    assert!(store.risk_models().is_empty());
}

#[test]
fn replacement_preserves_order() {
    let mut store = RiskModelStore::new();
    store.set_risk_models(vec![record("A"), record("B")]);

    let names: Vec<&str> = store.risk_models().iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[test]
fn replacement_with_empty_clears() {
    let mut store = RiskModelStore::new();
    store.set_risk_models(vec![record("A"), record("B"), record("C")]);
    store.set_risk_models(Vec::new());
    assert!(store.risk_models().is_empty());
}

#[test]
fn replacement_is_wholesale_not_a_merge() {
    let mut store = RiskModelStore::new();
    store.set_risk_models(vec![record("A"), record("B"), record("C")]);
    store.set_risk_models(vec![record("D")]);

    let names: Vec<&str> = store.risk_models().iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["D"]);
}

#[tokio::test]
async fn app_state_store_is_shared_across_clones() {
    let state = test_helpers::test_app_state();
    let cloned = state.clone();

    state.store.write().await.set_risk_models(vec![record("A")]);
    assert_eq!(cloned.store.read().await.risk_models().len(), 1);
}
