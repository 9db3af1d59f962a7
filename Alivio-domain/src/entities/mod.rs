// Domain entities and value objects
pub mod analytics;
pub mod backup;

// Stored models are used as-is by the domain
pub use alivio_data::models::{
    format_duration, Crisis, CrisisPatch, EntryType, FunctionalImpact, MedicationEntry, NewCrisis, Relief,
    UserProfile,
};

// Re-export common types for easier imports
pub use alivio_data::models::date::parse_record_date;
pub use analytics::{ClinicalInsights, CrisisStats, InsightLabels};
pub use backup::{BackupSnapshot, BACKUP_VERSION};
