use serde::{Deserialize, Serialize};

/// Rolling statistics over the journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrisisStats {
    /// Episodes dated within the last 30 days
    pub total_recent: usize,

    /// Mean intensity of the recent episodes with one decimal, or "0"
    pub avg_intensity: String,

    /// Every episode ever logged
    pub total_history: usize,

    /// Whole days since the most recent episode
    pub days_free: i64,
}

impl Default for CrisisStats {
    fn default() -> Self {
        Self {
            total_recent: 0,
            avg_intensity: "0".to_string(),
            total_history: 0,
            days_free: 0,
        }
    }
}

/// Most frequent tags across the journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalInsights {
    pub top_symptom: String,

    /// Most frequently effective medication
    pub top_medication: String,

    pub top_localization: String,
}

/// Labels used when a category has no entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightLabels {
    pub no_symptom: String,
    pub no_medication: String,
    pub no_localization: String,
}

impl Default for InsightLabels {
    fn default() -> Self {
        Self {
            no_symptom: "None".to_string(),
            no_medication: "None registered".to_string(),
            no_localization: "Diffuse".to_string(),
        }
    }
}

impl InsightLabels {
    /// Labels the mobile app shows to Spanish-speaking users
    pub fn spanish() -> Self {
        Self {
            no_symptom: "Ninguno".to_string(),
            no_medication: "No registrado".to_string(),
            no_localization: "Difusa".to_string(),
        }
    }
}
