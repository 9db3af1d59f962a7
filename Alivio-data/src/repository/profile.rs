use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info};

use super::errors::RepositoryError;
use crate::database::KeyValueStore;
use crate::models::UserProfile;

/// Storage key holding the serialized profile
pub const PROFILE_KEY: &str = "alivio_profile_v1";

/// Repository trait for the user profile
pub trait ProfileRepositoryTrait {
    /// The stored profile, if any. Corrupt storage reads as no profile.
    fn get_profile(&self) -> Option<UserProfile>;

    /// Replace the profile wholesale
    fn save_profile(&self, profile: UserProfile) -> Result<(), RepositoryError>;

    /// Remove the profile
    fn clear(&self) -> Result<(), RepositoryError>;
}

/// Profile repository backed by the key-value store
pub struct ProfileRepository {
    store: Arc<dyn KeyValueStore>,

    /// Outer `None` until loaded, inner `None` when no profile exists
    cache: Mutex<Option<Option<UserProfile>>>,
}

impl fmt::Debug for ProfileRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileRepository")
            .field("key", &PROFILE_KEY)
            .field("cached", &*self.lock_cache())
            .finish()
    }
}

impl ProfileRepository {
    /// Create a new repository over `store`
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            cache: Mutex::new(None),
        }
    }

    fn lock_cache(&self) -> MutexGuard<'_, Option<Option<UserProfile>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load_from_store(&self) -> Option<UserProfile> {
        match self.store.get(PROFILE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    error!("Stored profile is unreadable, treating it as absent: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                error!("Failed to read profile from storage: {}", e);
                None
            }
        }
    }
}

impl ProfileRepositoryTrait for ProfileRepository {
    fn get_profile(&self) -> Option<UserProfile> {
        let mut cache = self.lock_cache();
        cache.get_or_insert_with(|| self.load_from_store()).clone()
    }

    fn save_profile(&self, profile: UserProfile) -> Result<(), RepositoryError> {
        let payload = serde_json::to_string(&profile)?;

        let mut cache = self.lock_cache();
        self.store.set(PROFILE_KEY, &payload)?;
        debug!("Saved profile for {}", profile.name);
        *cache = Some(Some(profile));
        Ok(())
    }

    fn clear(&self) -> Result<(), RepositoryError> {
        let mut cache = self.lock_cache();
        self.store.remove(PROFILE_KEY)?;
        *cache = Some(None);
        info!("Cleared profile");
        Ok(())
    }
}
