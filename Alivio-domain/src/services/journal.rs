use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{error, info, warn};

use alivio_data::database::{open_store, KeyValueStore, StorageError, StoreConfig};
use alivio_data::repository::{
    CrisisRepository, CrisisRepositoryTrait, ProfileRepository, ProfileRepositoryTrait, RepositoryError,
};

use crate::entities::{ClinicalInsights, Crisis, CrisisPatch, CrisisStats, InsightLabels, NewCrisis, UserProfile};
use crate::services::analytics;
use crate::services::backup::{self, BackupError};
use crate::services::calendar::{self, CalendarFilter, DayIndex};

/// Journal service errors
#[derive(Debug, Error)]
pub enum JournalServiceError {
    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Not found error
    #[error("Episode not found: {0}")]
    NotFound(String),

    /// The backup could not be read
    #[error("Invalid backup: {0}")]
    InvalidBackup(String),

    /// Repository error
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

/// Map repository errors to service errors
fn map_repo_error(err: RepositoryError) -> JournalServiceError {
    match err {
        RepositoryError::Validation(msg) => JournalServiceError::ValidationError(msg),
        _ => JournalServiceError::RepositoryError(err.to_string()),
    }
}

fn map_backup_error(err: BackupError) -> JournalServiceError {
    match err {
        BackupError::Repository(e) => map_repo_error(e),
        BackupError::Parse(_) | BackupError::InvalidFormat(_) => JournalServiceError::InvalidBackup(err.to_string()),
        BackupError::Encode(_) => JournalServiceError::RepositoryError(err.to_string()),
    }
}

/// Entry point for everything the app shows: episodes, the profile, the
/// aggregates computed over them and backups
pub struct JournalService<C: CrisisRepositoryTrait, P: ProfileRepositoryTrait> {
    crises: C,
    profiles: P,
    persistent: bool,
}

/// Journal service over the store-backed repositories
pub type DefaultJournalService = JournalService<CrisisRepository, ProfileRepository>;

/// Open the configured store and build a journal service on top of it
pub fn create_default_journal_service(config: &StoreConfig) -> Result<DefaultJournalService, StorageError> {
    let store = open_store(config)?;
    let persistent = store.is_persistent();
    if !persistent {
        warn!("Journal data will not outlive this process");
    }

    let mut service = JournalService::new(CrisisRepository::new(Arc::clone(&store)), ProfileRepository::new(store));
    service.persistent = persistent;
    Ok(service)
}

impl<C: CrisisRepositoryTrait, P: ProfileRepositoryTrait> JournalService<C, P> {
    /// Create a new journal service
    pub fn new(crises: C, profiles: P) -> Self {
        Self {
            crises,
            profiles,
            persistent: true,
        }
    }

    /// Whether changes survive a restart. Services built with [`JournalService::new`]
    /// assume they do.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// All episodes, most recent first
    pub fn crises(&self) -> Arc<[Crisis]> {
        self.crises.get_all()
    }

    /// The `limit` most recent episodes
    pub fn recent(&self, limit: usize) -> Vec<Crisis> {
        self.crises.get_all().iter().take(limit).cloned().collect()
    }

    /// Get an episode by ID
    pub fn crisis(&self, id: &str) -> Result<Crisis, JournalServiceError> {
        self.crises
            .get_by_id(id)
            .ok_or_else(|| JournalServiceError::NotFound(id.to_string()))
    }

    /// Log a new episode
    pub fn log_crisis(&self, crisis: NewCrisis) -> Result<Crisis, JournalServiceError> {
        self.crises.save(crisis).map_err(map_repo_error)
    }

    /// Apply a partial update; `Ok(None)` when the episode does not exist
    pub fn update_crisis(&self, id: &str, patch: CrisisPatch) -> Result<Option<Crisis>, JournalServiceError> {
        self.crises.update(id, patch).map_err(map_repo_error)
    }

    /// Delete an episode, returning whether it existed
    pub fn delete_crisis(&self, id: &str) -> Result<bool, JournalServiceError> {
        self.crises.delete(id).map_err(map_repo_error)
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.profiles.get_profile()
    }

    pub fn save_profile(&self, profile: UserProfile) -> Result<(), JournalServiceError> {
        self.profiles.save_profile(profile).map_err(map_repo_error)
    }

    /// Whether the user still has to create a profile
    pub fn needs_onboarding(&self) -> bool {
        self.profiles.get_profile().is_none()
    }

    /// Rolling statistics as of today
    pub fn stats(&self) -> CrisisStats {
        analytics::stats(&self.crises.get_all())
    }

    /// Rolling statistics as of `today`
    pub fn stats_on(&self, today: NaiveDate) -> CrisisStats {
        analytics::stats_on(&self.crises.get_all(), today)
    }

    pub fn insights(&self) -> Option<ClinicalInsights> {
        analytics::clinical_insights(&self.crises.get_all())
    }

    pub fn insights_with(&self, labels: &InsightLabels) -> Option<ClinicalInsights> {
        analytics::clinical_insights_with(&self.crises.get_all(), labels)
    }

    /// Episodes logged on `date` that pass `filter`
    pub fn entries_on(&self, date: NaiveDate, filter: CalendarFilter) -> Vec<Crisis> {
        let crises = self.crises.get_all();
        calendar::entries_on(&crises, date, filter).into_iter().cloned().collect()
    }

    /// Calendar markers for every logged day
    pub fn day_index(&self) -> DayIndex {
        DayIndex::build(&self.crises.get_all())
    }

    /// Pretty-printed JSON backup of the whole journal
    pub fn export(&self) -> Result<String, JournalServiceError> {
        backup::export_all(&self.crises, &self.profiles).map_err(map_backup_error)
    }

    /// Replace the journal with a backup, returning the number of episodes
    pub fn import(&self, text: &str) -> Result<usize, JournalServiceError> {
        backup::import_all(text, &self.crises, &self.profiles).map_err(map_backup_error)
    }

    /// Delete every episode and the profile
    pub fn clear_all(&self) -> Result<(), JournalServiceError> {
        self.crises.clear().map_err(map_repo_error)?;
        self.profiles.clear().map_err(|e| {
            error!("Episodes were cleared but the profile was not: {}", e);
            map_repo_error(e)
        })?;

        info!("Cleared all journal data");
        Ok(())
    }
}
