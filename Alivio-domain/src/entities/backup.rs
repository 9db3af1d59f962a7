use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use alivio_data::models::{Crisis, UserProfile};

/// Backup format version written by this build
pub const BACKUP_VERSION: u32 = 1;

/// Full export of the journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    pub version: u32,

    /// When the snapshot was taken (RFC 3339, UTC, millisecond precision)
    pub timestamp: String,

    pub profile: Option<UserProfile>,

    pub crises: Vec<Crisis>,
}

impl BackupSnapshot {
    pub fn new(profile: Option<UserProfile>, crises: Vec<Crisis>) -> Self {
        Self {
            version: BACKUP_VERSION,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            profile,
            crises,
        }
    }
}
