// Repository module structure
pub mod errors;
mod crisis;
mod profile;

// Re-export commonly used types
pub use crisis::{sort_by_date_desc, CrisisRepository, CrisisRepositoryTrait, CRISES_KEY, CRISES_QUARANTINE_KEY};
pub use errors::RepositoryError;
pub use profile::{ProfileRepository, ProfileRepositoryTrait, PROFILE_KEY};
