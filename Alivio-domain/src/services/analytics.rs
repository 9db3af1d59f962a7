use chrono::{Duration, NaiveDate, Utc};
use indexmap::IndexMap;

use crate::entities::{ClinicalInsights, Crisis, CrisisStats, InsightLabels};

/// Length of the rolling window used for "recent" statistics
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// Statistics as of the current UTC date
pub fn stats(crises: &[Crisis]) -> CrisisStats {
    stats_on(crises, Utc::now().date_naive())
}

/// Statistics as of `today`.
///
/// `crises` must be sorted by date, most recent first. The scan stops at the
/// first episode older than the window.
pub fn stats_on(crises: &[Crisis], today: NaiveDate) -> CrisisStats {
    let cutoff = window_start(today);

    let mut total_recent = 0usize;
    let mut intensity_sum = 0u64;
    for crisis in crises {
        if crisis.date < cutoff {
            break;
        }
        total_recent += 1;
        intensity_sum += u64::from(crisis.intensity);
    }

    CrisisStats {
        total_recent,
        avg_intensity: format_average(intensity_sum, total_recent),
        total_history: crises.len(),
        days_free: crises.first().map_or(0, |latest| days_since(latest.date, today)),
    }
}

/// Full-scan statistics that make no assumption about ordering
pub fn stats_naive_on(crises: &[Crisis], today: NaiveDate) -> CrisisStats {
    let cutoff = window_start(today);
    let recent: Vec<&Crisis> = crises.iter().filter(|crisis| crisis.date >= cutoff).collect();
    let intensity_sum: u64 = recent.iter().map(|crisis| u64::from(crisis.intensity)).sum();

    CrisisStats {
        total_recent: recent.len(),
        avg_intensity: format_average(intensity_sum, recent.len()),
        total_history: crises.len(),
        days_free: crises
            .iter()
            .map(|crisis| crisis.date)
            .max()
            .map_or(0, |latest| days_since(latest, today)),
    }
}

fn window_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(RECENT_WINDOW_DAYS)
}

/// Mean to one decimal, halves rounded up
fn format_average(sum: u64, count: usize) -> String {
    if count == 0 {
        return "0".to_string();
    }
    let count = count as u64;
    let tenths = (sum * 20 + count) / (count * 2);
    format!("{}.{}", tenths / 10, tenths % 10)
}

fn days_since(date: NaiveDate, today: NaiveDate) -> i64 {
    (today - date).num_days().max(0)
}

/// Most frequent symptom, effective medication and pain location, using the
/// default fallback labels
pub fn clinical_insights(crises: &[Crisis]) -> Option<ClinicalInsights> {
    clinical_insights_with(crises, &InsightLabels::default())
}

/// Most frequent symptom, effective medication and pain location.
///
/// Returns `None` for an empty journal. Ties go to the tag seen first.
/// Medications only count when they brought moderate or total relief.
pub fn clinical_insights_with(crises: &[Crisis], labels: &InsightLabels) -> Option<ClinicalInsights> {
    if crises.is_empty() {
        return None;
    }

    let mut symptoms: IndexMap<&str, usize> = IndexMap::new();
    let mut medications: IndexMap<&str, usize> = IndexMap::new();
    let mut localizations: IndexMap<&str, usize> = IndexMap::new();

    for crisis in crises {
        for symptom in &crisis.symptoms {
            *symptoms.entry(symptom.as_str()).or_insert(0) += 1;
        }
        for location in &crisis.localization {
            *localizations.entry(location.as_str()).or_insert(0) += 1;
        }
        for medication in crisis.medications.iter().filter(|m| m.relief.is_effective()) {
            *medications.entry(medication.name.as_str()).or_insert(0) += 1;
        }
    }

    Some(ClinicalInsights {
        top_symptom: most_frequent(&symptoms).unwrap_or(labels.no_symptom.as_str()).to_string(),
        top_medication: most_frequent(&medications).unwrap_or(labels.no_medication.as_str()).to_string(),
        top_localization: most_frequent(&localizations).unwrap_or(labels.no_localization.as_str()).to_string(),
    })
}

fn most_frequent<'a>(counts: &IndexMap<&'a str, usize>) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for (&tag, &count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((tag, count));
        }
    }
    best.map(|(tag, _)| tag)
}
