use std::sync::{Arc, Once};

use alivio_domain::database::{InMemoryStore, KeyValueStore};
use alivio_domain::entities::{Crisis, CrisisPatch, EntryType, MedicationEntry, NewCrisis, Relief, UserProfile};
use alivio_domain::repository::{CrisisRepository, ProfileRepository, CRISES_KEY};
use alivio_domain::services::{stats_naive_on, stats_on, JournalService, JournalServiceError};
use chrono::{Duration, NaiveDate};
use pretty_assertions::assert_eq;

// Initialize tracing once for all tests
static INIT: Once = Once::new();
fn initialize() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 20).unwrap()
}

fn journal_over(store: &InMemoryStore) -> JournalService<CrisisRepository, ProfileRepository> {
    JournalService::new(
        CrisisRepository::new(Arc::new(store.clone())),
        ProfileRepository::new(Arc::new(store.clone())),
    )
}

#[test]
fn test_cache_and_store_agree_after_every_operation() {
    initialize();
    let store = InMemoryStore::new();
    let journal = journal_over(&store);

    let first = journal
        .log_crisis(NewCrisis::new(today() - Duration::days(3), EntryType::Migraine).with_intensity(7))
        .unwrap();
    let second = journal
        .log_crisis(NewCrisis::new(today(), EntryType::Pain).with_intensity(2))
        .unwrap();
    journal
        .update_crisis(
            &first.id,
            CrisisPatch {
                date: Some(today() + Duration::days(1)),
                ..CrisisPatch::default()
            },
        )
        .unwrap();
    journal.delete_crisis(&second.id).unwrap();

    let cached = journal.crises().to_vec();
    let reopened = journal_over(&store).crises().to_vec();
    assert_eq!(cached, reopened);
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].date, today() + Duration::days(1));
}

#[test]
fn test_update_of_unknown_id_leaves_storage_untouched() {
    initialize();
    let store = InMemoryStore::new();
    let journal = journal_over(&store);
    journal.log_crisis(NewCrisis::new(today(), EntryType::Rest)).unwrap();
    let before = store.get(CRISES_KEY).unwrap();

    let patch = CrisisPatch {
        intensity: Some(9),
        ..CrisisPatch::default()
    };
    assert_eq!(journal.update_crisis("missing", patch).unwrap(), None);

    assert_eq!(store.get(CRISES_KEY).unwrap(), before);
}

#[test]
fn test_duration_follows_time_changes() {
    initialize();
    let journal = journal_over(&InMemoryStore::new());

    let logged = journal
        .log_crisis(NewCrisis::new(today(), EntryType::Migraine).with_times("23:30", Some("01:15")))
        .unwrap();
    assert_eq!(logged.duration.as_deref(), Some("1h 45m"));

    let updated = journal
        .update_crisis(
            &logged.id,
            CrisisPatch {
                end_time: Some(Some("23:50".to_string())),
                ..CrisisPatch::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(updated.duration.as_deref(), Some("0h 20m"));

    let cleared = journal
        .update_crisis(
            &logged.id,
            CrisisPatch {
                end_time: Some(None),
                ..CrisisPatch::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(cleared.duration, None);
}

#[test]
fn test_backup_moves_a_journal_between_devices() {
    initialize();
    let phone = journal_over(&InMemoryStore::new());
    phone
        .save_profile(UserProfile::new("Lucía", "Menstrual", "2024-01-10T12:00:00.000Z"))
        .unwrap();
    for offset in 0..20 {
        phone
            .log_crisis(
                NewCrisis::new(today() - Duration::days(offset * 3), EntryType::Migraine)
                    .with_intensity((offset % 10) as u8)
                    .with_symptoms(["Nausea"])
                    .with_medication(MedicationEntry::new("Sumatriptan", "50mg", "08:00", Relief::Total)),
            )
            .unwrap();
    }

    let backup = phone.export().unwrap();
    let tablet = journal_over(&InMemoryStore::new());
    assert!(tablet.needs_onboarding());

    assert_eq!(tablet.import(&backup).unwrap(), 20);

    assert!(!tablet.needs_onboarding());
    assert_eq!(tablet.crises().to_vec(), phone.crises().to_vec());
    assert_eq!(tablet.stats_on(today()), phone.stats_on(today()));
    assert_eq!(tablet.insights().unwrap().top_medication, "Sumatriptan");
}

#[test]
fn test_failed_import_keeps_journal() {
    initialize();
    let journal = journal_over(&InMemoryStore::new());
    journal.log_crisis(NewCrisis::new(today(), EntryType::Pain)).unwrap();

    let result = journal.import(r#"{"version": 1, "crises": {"not": "a list"}}"#);

    assert!(matches!(result, Err(JournalServiceError::InvalidBackup(_))));
    assert_eq!(journal.crises().len(), 1);
}

#[test]
fn test_import_with_repeated_ids_keeps_ids_unique() {
    initialize();
    let journal = journal_over(&InMemoryStore::new());
    let backup = r#"{
        "version": 1,
        "crises": [
            {"id": "a", "date": "2024-09-19", "type": "Pain", "intensity": 3},
            {"id": "a", "date": "2024-09-18", "type": "Pain", "intensity": 5}
        ]
    }"#;

    assert_eq!(journal.import(backup).unwrap(), 2);

    let all = journal.crises();
    assert_eq!(all[0].id, "a");
    assert_ne!(all[0].id, all[1].id);

    journal
        .update_crisis(
            "a",
            CrisisPatch {
                intensity: Some(9),
                ..CrisisPatch::default()
            },
        )
        .unwrap();
    let intensities: Vec<u8> = journal.crises().iter().map(|c| c.intensity).collect();
    assert_eq!(intensities, vec![9, 5]);
}

#[test]
fn test_corrupt_storage_is_healed_by_next_save() {
    initialize();
    let store = InMemoryStore::new();
    store.set(CRISES_KEY, "{\"truncated\": [").unwrap();
    let journal = journal_over(&store);

    assert!(journal.crises().is_empty());

    journal.log_crisis(NewCrisis::new(today(), EntryType::Rest)).unwrap();

    let raw = store.get(CRISES_KEY).unwrap().unwrap();
    assert!(raw.starts_with('['));
    assert_eq!(journal_over(&store).crises().len(), 1);
}

#[test]
fn test_rolling_stats_on_a_large_journal() {
    initialize();
    let journal = journal_over(&InMemoryStore::new());
    let crises: Vec<Crisis> = (0..2000)
        .map(|i| {
            NewCrisis::new(today() - Duration::days(i % 365), EntryType::Pain)
                .with_intensity((i % 11) as u8)
                .into_crisis(format!("seed-{}", i))
        })
        .collect();
    journal.import(&format!(
        r#"{{"version": 1, "crises": {}}}"#,
        serde_json::to_string(&crises).unwrap()
    ))
    .unwrap();

    let all = journal.crises();
    assert_eq!(stats_on(&all, today()), stats_naive_on(&all, today()));
    assert_eq!(journal.stats_on(today()).total_history, 2000);
}
