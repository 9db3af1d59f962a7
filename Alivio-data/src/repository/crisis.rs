use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};
use uuid::Uuid;
use validator::Validate;

use super::errors::RepositoryError;
use crate::database::KeyValueStore;
use crate::models::{Crisis, CrisisPatch, NewCrisis};

/// Storage key holding the serialized episode list
pub const CRISES_KEY: &str = "alivio_crises_v1";

/// Storage key holding the last episode list that failed to parse
pub const CRISES_QUARANTINE_KEY: &str = "alivio_crises_v1_unreadable";

/// Repository trait for episode records
pub trait CrisisRepositoryTrait {
    /// All episodes, most recent date first.
    ///
    /// Never fails: unreadable or corrupt storage yields an empty list.
    fn get_all(&self) -> Arc<[Crisis]>;

    /// Get an episode by ID
    fn get_by_id(&self, id: &str) -> Option<Crisis>;

    /// Create a new episode, assigning its ID
    fn save(&self, crisis: NewCrisis) -> Result<Crisis, RepositoryError>;

    /// Merge `patch` into the episode with `id`.
    ///
    /// Returns `Ok(None)` without writing anything when the ID is unknown.
    fn update(&self, id: &str, patch: CrisisPatch) -> Result<Option<Crisis>, RepositoryError>;

    /// Delete the episode with `id`, returning whether it existed
    fn delete(&self, id: &str) -> Result<bool, RepositoryError>;

    /// Replace the whole collection. Missing or repeated IDs get a fresh one.
    fn replace_all(&self, crises: Vec<Crisis>) -> Result<(), RepositoryError>;

    /// Remove every episode
    fn clear(&self) -> Result<(), RepositoryError>;
}

/// Result of reading the persisted episode list
#[derive(Debug)]
enum LoadOutcome {
    Loaded(Vec<Crisis>),
    Missing,
    Unparsable { raw: String, reason: String },
    Unreadable(String),
}

/// Episode repository: an in-memory cache mirroring the key-value store.
///
/// The cache is loaded lazily on first read and replaced only after a write
/// to the store succeeds, so it never holds state the store does not.
pub struct CrisisRepository {
    /// Backing store
    store: Arc<dyn KeyValueStore>,

    /// Sorted episodes; `None` until first loaded
    cache: Mutex<Option<Arc<[Crisis]>>>,
}

impl fmt::Debug for CrisisRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self.lock_cache().as_ref().map(|crises| crises.len());
        f.debug_struct("CrisisRepository")
            .field("key", &CRISES_KEY)
            .field("cached", &cached)
            .finish()
    }
}

impl CrisisRepository {
    /// Create a new repository over `store`
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            cache: Mutex::new(None),
        }
    }

    // A panic mid-mutation never leaves a half-written cache behind, so a
    // poisoned lock still guards consistent data.
    fn lock_cache(&self) -> MutexGuard<'_, Option<Arc<[Crisis]>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load_from_store(&self) -> LoadOutcome {
        match self.store.get(CRISES_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Crisis>>(&raw) {
                Ok(crises) => LoadOutcome::Loaded(crises),
                Err(e) => LoadOutcome::Unparsable {
                    raw,
                    reason: e.to_string(),
                },
            },
            Ok(None) => LoadOutcome::Missing,
            Err(e) => LoadOutcome::Unreadable(e.to_string()),
        }
    }

    /// Current episodes, loading them from the store on first use
    fn loaded(&self, cache: &mut Option<Arc<[Crisis]>>) -> Arc<[Crisis]> {
        if let Some(crises) = cache.as_ref() {
            return Arc::clone(crises);
        }

        let crises: Vec<Crisis> = match self.load_from_store() {
            LoadOutcome::Loaded(mut crises) => {
                sort_by_date_desc(&mut crises);
                debug!("Loaded {} episodes from storage", crises.len());
                crises
            }
            LoadOutcome::Missing => {
                debug!("No episodes stored yet");
                Vec::new()
            }
            LoadOutcome::Unparsable { raw, reason } => {
                error!("Stored episodes are corrupt, starting from an empty journal: {}", reason);
                // The next write replaces CRISES_KEY, so keep the raw list aside first
                match self.store.set(CRISES_QUARANTINE_KEY, &raw) {
                    Ok(()) => warn!("Copied the corrupt episode list to {}", CRISES_QUARANTINE_KEY),
                    Err(e) => error!("Failed to keep a copy of the corrupt episode list: {}", e),
                }
                Vec::new()
            }
            LoadOutcome::Unreadable(reason) => {
                error!("Storage read failed, starting from an empty journal: {}", reason);
                Vec::new()
            }
        };

        let crises: Arc<[Crisis]> = Arc::from(crises);
        *cache = Some(Arc::clone(&crises));
        crises
    }

    /// Write `crises` to the store, then make them the cached state
    fn persist(&self, cache: &mut Option<Arc<[Crisis]>>, crises: Vec<Crisis>) -> Result<(), RepositoryError> {
        let payload = serde_json::to_string(&crises)?;
        self.store.set(CRISES_KEY, &payload)?;

        debug!("Persisted {} episodes ({} bytes)", crises.len(), payload.len());
        *cache = Some(Arc::from(crises));
        Ok(())
    }
}

/// Sort most recent first. The sort is stable, so same-day entries keep
/// their insertion order.
pub fn sort_by_date_desc(crises: &mut [Crisis]) {
    crises.sort_by(|a, b| b.date.cmp(&a.date));
}

impl CrisisRepositoryTrait for CrisisRepository {
    fn get_all(&self) -> Arc<[Crisis]> {
        let mut cache = self.lock_cache();
        self.loaded(&mut cache)
    }

    fn get_by_id(&self, id: &str) -> Option<Crisis> {
        self.get_all().iter().find(|crisis| crisis.id == id).cloned()
    }

    fn save(&self, crisis: NewCrisis) -> Result<Crisis, RepositoryError> {
        let crisis = crisis.into_crisis(Uuid::new_v4().to_string());
        crisis.validate()?;

        let mut cache = self.lock_cache();
        let current = self.loaded(&mut cache);

        // Insert after every entry on the same day or later, which keeps the
        // order a stable re-sort of an appended list would produce.
        let position = current.partition_point(|existing| existing.date >= crisis.date);
        let mut crises = Vec::with_capacity(current.len() + 1);
        crises.extend_from_slice(&current[..position]);
        crises.push(crisis.clone());
        crises.extend_from_slice(&current[position..]);

        self.persist(&mut cache, crises)?;
        debug!("Saved episode {} dated {}", crisis.id, crisis.date);
        Ok(crisis)
    }

    fn update(&self, id: &str, patch: CrisisPatch) -> Result<Option<Crisis>, RepositoryError> {
        let mut cache = self.lock_cache();
        let current = self.loaded(&mut cache);

        let Some(index) = current.iter().position(|crisis| crisis.id == id) else {
            debug!("Ignoring update for unknown episode {}", id);
            return Ok(None);
        };

        let mut crises = current.to_vec();
        patch.apply_to(&mut crises[index]);
        crises[index].validate()?;

        let updated = crises[index].clone();
        sort_by_date_desc(&mut crises);

        self.persist(&mut cache, crises)?;
        debug!("Updated episode {}", id);
        Ok(Some(updated))
    }

    fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        let mut cache = self.lock_cache();
        let current = self.loaded(&mut cache);

        if !current.iter().any(|crisis| crisis.id == id) {
            debug!("Ignoring delete for unknown episode {}", id);
            return Ok(false);
        }

        let crises: Vec<Crisis> = current.iter().filter(|crisis| crisis.id != id).cloned().collect();

        self.persist(&mut cache, crises)?;
        debug!("Deleted episode {}", id);
        Ok(true)
    }

    fn replace_all(&self, mut crises: Vec<Crisis>) -> Result<(), RepositoryError> {
        let mut seen = HashSet::with_capacity(crises.len());
        for crisis in crises.iter_mut() {
            if crisis.id.is_empty() {
                warn!("Assigning an ID to an episode dated {} that had none", crisis.date);
                crisis.id = Uuid::new_v4().to_string();
            } else if seen.contains(&crisis.id) {
                warn!("Assigning a new ID to a repeat of episode {} dated {}", crisis.id, crisis.date);
                crisis.id = Uuid::new_v4().to_string();
            }
            seen.insert(crisis.id.clone());
        }
        sort_by_date_desc(&mut crises);

        let mut cache = self.lock_cache();
        self.persist(&mut cache, crises)?;
        info!("Replaced episode collection");
        Ok(())
    }

    fn clear(&self) -> Result<(), RepositoryError> {
        let mut cache = self.lock_cache();
        self.store.remove(CRISES_KEY)?;
        self.store.remove(CRISES_QUARANTINE_KEY)?;
        *cache = Some(Arc::from(Vec::<Crisis>::new()));
        info!("Cleared all episodes");
        Ok(())
    }
}
