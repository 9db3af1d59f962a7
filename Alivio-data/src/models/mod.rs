// Storage models for journal data
pub mod crisis;
pub mod date;
pub mod profile;

pub use crisis::{
    format_duration, Crisis, CrisisPatch, EntryType, FunctionalImpact, MedicationEntry, NewCrisis, Relief,
};
pub use profile::UserProfile;
