pub mod analytics;
pub mod backup;
pub mod calendar;
pub mod journal;

// Domain services
// This module contains business logic implementations.

// Re-export service types and factory functions
pub use analytics::{clinical_insights, clinical_insights_with, stats, stats_naive_on, stats_on};
pub use backup::{export_all, import_all, parse_backup, BackupError};
pub use calendar::{entries_on, CalendarFilter, DayIndex, DayMarkers, MonthLayout};
pub use journal::{create_default_journal_service, DefaultJournalService, JournalService, JournalServiceError};
