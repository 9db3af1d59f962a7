use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, info, warn};
use validator::Validate;

use alivio_data::repository::{CrisisRepositoryTrait, ProfileRepositoryTrait, RepositoryError};

use crate::entities::{BackupSnapshot, Crisis, UserProfile, BACKUP_VERSION};

/// Backup/restore errors
#[derive(Debug, Error)]
pub enum BackupError {
    /// The backup is not valid JSON
    #[error("Backup is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    /// The JSON does not have the shape of a backup
    #[error("Invalid backup format: {0}")]
    InvalidFormat(String),

    /// The snapshot could not be encoded
    #[error("Failed to encode backup: {0}")]
    Encode(#[source] serde_json::Error),

    /// Installing the snapshot failed
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Serialize the profile and every episode as pretty-printed JSON
pub fn export_all<C, P>(crises: &C, profiles: &P) -> Result<String, BackupError>
where
    C: CrisisRepositoryTrait + ?Sized,
    P: ProfileRepositoryTrait + ?Sized,
{
    let snapshot = BackupSnapshot::new(profiles.get_profile(), crises.get_all().to_vec());
    let text = serde_json::to_string_pretty(&snapshot).map_err(BackupError::Encode)?;

    info!("Exported {} episodes ({} bytes)", snapshot.crises.len(), text.len());
    Ok(text)
}

/// A backup that passed validation and is ready to be installed
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBackup {
    pub version: Value,
    pub profile: Option<UserProfile>,
    pub crises: Vec<Crisis>,
}

/// Parse and validate backup text without touching any repository
pub fn parse_backup(text: &str) -> Result<ParsedBackup, BackupError> {
    let value: Value = serde_json::from_str(text).map_err(BackupError::Parse)?;
    let Value::Object(mut fields) = value else {
        return Err(BackupError::InvalidFormat("expected a JSON object".to_string()));
    };

    let version = fields.remove("version").unwrap_or(Value::Null);
    if !is_truthy(&version) {
        return Err(BackupError::InvalidFormat("missing version".to_string()));
    }

    let crises = match fields.remove("crises") {
        Some(Value::Array(items)) => parse_crises(items)?,
        _ => return Err(BackupError::InvalidFormat("crises must be an array".to_string())),
    };

    let profile = parse_profile(&mut fields)?;

    Ok(ParsedBackup {
        version,
        profile,
        crises,
    })
}

fn parse_crises(items: Vec<Value>) -> Result<Vec<Crisis>, BackupError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let crisis: Crisis = serde_json::from_value(item)
                .map_err(|e| BackupError::InvalidFormat(format!("episode {}: {}", index, e)))?;
            crisis
                .validate()
                .map_err(|e| BackupError::InvalidFormat(format!("episode {}: {}", index, RepositoryError::from(e))))?;
            Ok(crisis)
        })
        .collect()
}

fn parse_profile(fields: &mut Map<String, Value>) -> Result<Option<UserProfile>, BackupError> {
    match fields.remove("profile") {
        Some(profile) if is_truthy(&profile) => serde_json::from_value(profile)
            .map(Some)
            .map_err(|e| BackupError::InvalidFormat(format!("profile: {}", e))),
        _ => Ok(None),
    }
}

/// JavaScript truthiness, which older backups were checked against
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(true, |n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Replace the journal with the contents of a backup.
///
/// Nothing is changed unless the backup parses and validates. The profile is
/// only replaced when the backup carries one. If storing the profile fails,
/// the previous episodes are restored before the error is returned.
///
/// Returns the number of episodes imported.
pub fn import_all<C, P>(text: &str, crises: &C, profiles: &P) -> Result<usize, BackupError>
where
    C: CrisisRepositoryTrait + ?Sized,
    P: ProfileRepositoryTrait + ?Sized,
{
    let backup = parse_backup(text).map_err(|e| {
        error!("Import failed: {}", e);
        e
    })?;

    if backup.version.as_u64().map_or(false, |v| v > u64::from(BACKUP_VERSION)) {
        warn!("Importing backup version {} written by a newer release", backup.version);
    }

    let imported = backup.crises.len();
    let previous = crises.get_all();
    crises.replace_all(backup.crises)?;

    if let Some(profile) = backup.profile {
        if let Err(e) = profiles.save_profile(profile) {
            error!("Failed to import profile, restoring previous episodes: {}", e);
            if let Err(restore_error) = crises.replace_all(previous.to_vec()) {
                error!("Failed to restore previous episodes: {}", restore_error);
            }
            return Err(e.into());
        }
    }

    info!("Imported {} episodes", imported);
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alivio_data::database::{InMemoryStore, KeyValueStore};
    use alivio_data::repository::{CrisisRepository, ProfileRepository, CRISES_KEY};
    use crate::entities::{EntryType, FunctionalImpact, MedicationEntry, NewCrisis, Relief};
    use chrono::NaiveDate;
    use mockall::mock;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    mock! {
        pub Profiles {}

        impl ProfileRepositoryTrait for Profiles {
            fn get_profile(&self) -> Option<UserProfile>;
            fn save_profile(&self, profile: UserProfile) -> Result<(), RepositoryError>;
            fn clear(&self) -> Result<(), RepositoryError>;
        }
    }

    struct Journal {
        store: InMemoryStore,
        crises: CrisisRepository,
        profiles: ProfileRepository,
    }

    fn journal() -> Journal {
        let store = InMemoryStore::new();
        Journal {
            crises: CrisisRepository::new(Arc::new(store.clone())),
            profiles: ProfileRepository::new(Arc::new(store.clone())),
            store,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seed(journal: &Journal) {
        journal
            .crises
            .save(
                NewCrisis::new(date(2024, 3, 1), EntryType::Migraine)
                    .with_intensity(7)
                    .with_times("23:30", Some("01:15"))
                    .with_symptoms(["Nausea"])
                    .with_medication(MedicationEntry::new("Ibuprofen", "400mg", "23:45", Relief::Moderate)),
            )
            .unwrap();
        journal
            .crises
            .save(NewCrisis::new(date(2024, 3, 4), EntryType::Rest).with_notes("Nap"))
            .unwrap();
        journal
            .profiles
            .save_profile(UserProfile::new("Ana", "Chronic", "2024-01-01T00:00:00.000Z"))
            .unwrap();
    }

    #[test]
    fn test_export_then_import_restores_everything() {
        let source = journal();
        seed(&source);
        let backup = export_all(&source.crises, &source.profiles).unwrap();

        let target = journal();
        let imported = import_all(&backup, &target.crises, &target.profiles).unwrap();

        assert_eq!(imported, 2);
        assert_eq!(target.crises.get_all().to_vec(), source.crises.get_all().to_vec());
        assert_eq!(target.profiles.get_profile(), source.profiles.get_profile());
    }

    #[test]
    fn test_export_format() {
        let source = journal();
        seed(&source);

        let backup = export_all(&source.crises, &source.profiles).unwrap();
        let value: Value = serde_json::from_str(&backup).unwrap();

        assert!(backup.contains("\n  \"version\": 1"));
        assert_eq!(value["crises"].as_array().unwrap().len(), 2);
        assert_eq!(value["crises"][0]["date"], "2024-03-04");
        assert_eq!(value["profile"]["name"], "Ana");
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_export_without_profile() {
        let source = journal();
        let value: Value = serde_json::from_str(&export_all(&source.crises, &source.profiles).unwrap()).unwrap();
        assert_eq!(value["profile"], Value::Null);
        assert_eq!(value["crises"], Value::Array(Vec::new()));
    }

    #[test]
    fn test_import_rejects_missing_crises_without_changes() {
        let target = journal();
        seed(&target);
        let before = target.store.get(CRISES_KEY).unwrap();

        let result = import_all(r#"{"version": 1, "profile": null}"#, &target.crises, &target.profiles);

        assert!(matches!(result, Err(BackupError::InvalidFormat(_))));
        assert_eq!(target.crises.get_all().len(), 2);
        assert_eq!(target.store.get(CRISES_KEY).unwrap(), before);
        assert_eq!(target.profiles.get_profile().unwrap().name, "Ana");
    }

    #[test]
    fn test_import_rejects_falsy_versions() {
        for text in [
            r#"{"crises": []}"#,
            r#"{"version": null, "crises": []}"#,
            r#"{"version": 0, "crises": []}"#,
            r#"{"version": false, "crises": []}"#,
            r#"{"version": "", "crises": []}"#,
        ] {
            assert!(matches!(parse_backup(text), Err(BackupError::InvalidFormat(_))), "{}", text);
        }
    }

    #[test]
    fn test_import_rejects_invalid_json() {
        let target = journal();
        let result = import_all("{ not json", &target.crises, &target.profiles);
        assert!(matches!(result, Err(BackupError::Parse(_))));
    }

    #[test]
    fn test_import_rejects_out_of_range_intensity() {
        let result = parse_backup(r#"{"version": 1, "crises": [{"id": "a", "date": "2024-01-01", "intensity": 14}]}"#);
        assert!(matches!(result, Err(BackupError::InvalidFormat(_))));
    }

    #[test]
    fn test_import_accepts_newer_version() {
        let target = journal();
        let imported = import_all(
            r#"{"version": 3, "crises": [{"id": "x", "date": "2024-02-02"}]}"#,
            &target.crises,
            &target.profiles,
        )
        .unwrap();
        assert_eq!(imported, 1);
    }

    #[test]
    fn test_import_normalizes_legacy_records() {
        let target = journal();
        let text = r#"{
            "version": 1,
            "timestamp": "2024-05-01T10:00:00.000Z",
            "crises": [
                {"id": "old", "date": "2024-01-05T08:30:00.000Z", "type": "Migraña", "intensity": 6,
                 "functionalImpact": "Postración",
                 "medications": [{"id": "m1", "name": "Naproxeno", "dose": "550mg", "time": "09:00", "relief": "Moderado"}]},
                {"date": "2024-02-10", "type": "Descanso"}
            ]
        }"#;

        import_all(text, &target.crises, &target.profiles).unwrap();

        let crises = target.crises.get_all();
        assert_eq!(crises.len(), 2);
        assert_eq!(crises[0].date, date(2024, 2, 10));
        assert_eq!(crises[0].kind, EntryType::Rest);
        assert!(!crises[0].id.is_empty());
        assert!(crises[0].symptoms.is_empty());
        assert_eq!(crises[1].date, date(2024, 1, 5));
        assert_eq!(crises[1].kind, EntryType::Migraine);
        assert_eq!(crises[1].functional_impact, FunctionalImpact::Prostration);
        assert_eq!(crises[1].medications[0].relief, Relief::Moderate);
        assert_eq!(target.profiles.get_profile(), None);
    }

    #[test]
    fn test_import_keeps_profile_when_backup_has_none() {
        let target = journal();
        seed(&target);

        import_all(r#"{"version": 1, "profile": null, "crises": []}"#, &target.crises, &target.profiles).unwrap();

        assert!(target.crises.get_all().is_empty());
        assert_eq!(target.profiles.get_profile().unwrap().name, "Ana");
    }

    #[test]
    fn test_failed_profile_import_restores_episodes() {
        let target = journal();
        seed(&target);
        let before = target.crises.get_all().to_vec();

        let mut profiles = MockProfiles::new();
        profiles
            .expect_save_profile()
            .times(1)
            .returning(|_| Err(RepositoryError::Validation("profile rejected".to_string())));

        let text = r#"{"version": 1, "profile": {"name": "Eva", "migraineType": "Episodic", "joinedDate": "2024-04-01"},
                       "crises": [{"id": "new", "date": "2024-04-02"}]}"#;
        let result = import_all(text, &target.crises, &profiles);

        assert!(matches!(result, Err(BackupError::Repository(_))));
        assert_eq!(target.crises.get_all().to_vec(), before);
    }
}
