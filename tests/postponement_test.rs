//! Tests for the postponement service: copy-forward, horizon computation,
//! and drift conflicts.

use std::collections::BTreeMap;
use std::sync::Arc;

use cursus::application::commands::PostponeCommand;
use cursus::application::{ApplicationError, PostponementService};
use cursus::domain::{FieldMap, FieldValue, YearRecord, YearSnapshot};
use cursus::infrastructure::traits::YearRecordStore;
use cursus::infrastructure::InMemoryYearRecordStore;

fn fields(pairs: &[(&str, &str)]) -> FieldMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), FieldValue::text(*v)))
        .collect()
}

fn record(code: &str, year: i32, pairs: &[(&str, &str)]) -> YearRecord {
    YearRecord {
        code: code.to_string(),
        year,
        fields: fields(pairs),
        collections: BTreeMap::new(),
    }
}

fn service_2020(store: Arc<InMemoryYearRecordStore>) -> PostponementService {
    // Horizon base fixed to 2020 so the scenario is year-stable.
    PostponementService::with_reference_year(store, 3, 2020)
}

fn command(code: &str, from_year: i32, snapshot_fields: &[(&str, &str)]) -> PostponeCommand {
    PostponeCommand {
        code: code.to_string(),
        from_year,
        end_year: None,
        initial_snapshot: YearSnapshot::capture(fields(snapshot_fields)),
    }
}

#[test]
fn given_record_in_2020_when_postponing_then_2021_through_2023_created() {
    // Arrange
    let store = Arc::new(InMemoryYearRecordStore::new());
    store
        .save(&record("LDROI100B", 2020, &[("title", "Bachelier en droit")]))
        .unwrap();
    let service = service_2020(store.clone());

    // Act
    let report = service
        .postpone(&command("LDROI100B", 2020, &[("title", "Bachelier en droit")]))
        .unwrap();

    // Assert
    assert_eq!(report.postponed, vec![2021, 2022, 2023]);
    assert!(report.conflict.is_none());
    for year in 2021..=2023 {
        let copied = store.get("LDROI100B", year).unwrap().expect("copied year");
        assert_eq!(copied.fields.get("title"), Some(&FieldValue::text("Bachelier en droit")));
    }
}

#[test]
fn given_already_postponed_years_when_running_again_then_idempotent() {
    // Arrange
    let store = Arc::new(InMemoryYearRecordStore::new());
    store
        .save(&record("LDROI100B", 2020, &[("title", "Bachelier en droit")]))
        .unwrap();
    let service = service_2020(store.clone());
    let cmd = command("LDROI100B", 2020, &[("title", "Bachelier en droit")]);
    service.postpone(&cmd).unwrap();

    // Act - future years now exist but match the snapshot
    let report = service.postpone(&cmd).unwrap();

    // Assert
    assert_eq!(report.postponed, vec![2021, 2022, 2023]);
    assert!(report.conflict.is_none());
}

#[test]
fn given_manually_edited_2022_when_postponing_then_conflict_and_2023_untouched() {
    // Arrange - 2022 was edited by hand after the snapshot was taken
    let store = Arc::new(InMemoryYearRecordStore::new());
    store
        .save(&record("LDROI100B", 2020, &[("title", "Bachelier en droit")]))
        .unwrap();
    store
        .save(&record("LDROI100B", 2022, &[("title", "Bachelier en droit (reforme)")]))
        .unwrap();
    let service = service_2020(store.clone());

    // Act
    let report = service
        .postpone(&command("LDROI100B", 2020, &[("title", "Bachelier en droit")]))
        .unwrap();

    // Assert - 2021 written, conflict reported at 2022, 2023 never created
    assert_eq!(report.postponed, vec![2021]);
    let conflict = report.conflict.expect("drift must be reported");
    assert_eq!(conflict.year, 2022);
    assert!(conflict.differences.contains_key("title"));
    assert!(conflict.message().contains("2022"));
    assert!(store.get("LDROI100B", 2023).unwrap().is_none());
    // The edited year keeps its manual state.
    let edited = store.get("LDROI100B", 2022).unwrap().unwrap();
    assert_eq!(
        edited.fields.get("title"),
        Some(&FieldValue::text("Bachelier en droit (reforme)"))
    );
}

#[test]
fn given_collections_when_postponing_then_copied_with_fields() {
    // Arrange
    let store = Arc::new(InMemoryYearRecordStore::new());
    let mut source = record("LDROI100B", 2020, &[("title", "Bachelier en droit")]);
    source.collections.insert(
        "domains".to_string(),
        vec![fields(&[("domain", "DROIT")]), fields(&[("domain", "CRIM")])],
    );
    store.save(&source).unwrap();
    let service = service_2020(store.clone());

    // Act
    service
        .postpone(&command("LDROI100B", 2020, &[("title", "Bachelier en droit")]))
        .unwrap();

    // Assert
    let copied = store.get("LDROI100B", 2021).unwrap().unwrap();
    assert_eq!(copied.collections["domains"].len(), 2);
}

#[test]
fn given_entity_end_year_when_computing_horizon_then_capped() {
    let store = Arc::new(InMemoryYearRecordStore::new());
    let service = service_2020(store);

    let end = service.compute_end_year("LDROI100B", Some(2022)).unwrap();

    assert_eq!(end, 2022);
}

#[test]
fn given_existing_later_year_when_computing_horizon_then_extended() {
    // A year already in the store keeps the horizon from shrinking below it.
    let store = Arc::new(InMemoryYearRecordStore::new());
    store
        .save(&record("LDROI100B", 2025, &[("title", "Bachelier en droit")]))
        .unwrap();
    let service = service_2020(store);

    let end = service.compute_end_year("LDROI100B", None).unwrap();

    assert_eq!(end, 2025);
}

#[test]
fn given_missing_source_year_when_postponing_then_record_not_found() {
    let store = Arc::new(InMemoryYearRecordStore::new());
    let service = service_2020(store);

    let result = service.postpone(&command("LDROI100B", 2020, &[]));

    assert!(matches!(
        result,
        Err(ApplicationError::RecordNotFound { year: 2020, .. })
    ));
}
