use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Classification of a journal entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Migraine attack
    #[serde(alias = "Migraña")]
    Migraine,

    /// Any other pain episode
    #[default]
    #[serde(alias = "Dolor")]
    Pain,

    /// Medication taken without a pain episode
    #[serde(alias = "Medicina")]
    Medication,

    /// Menstrual period day
    #[serde(alias = "Periodo")]
    Period,

    /// Rest / recovery session
    #[serde(alias = "Descanso")]
    Rest,
}

impl EntryType {
    /// Derive the entry type from what was actually logged.
    ///
    /// Pain wins over medication, medication over period; otherwise the
    /// requested type is kept.
    pub fn classify(requested: EntryType, intensity: u8, has_medications: bool, is_period: bool) -> Self {
        if intensity > 0 {
            EntryType::Pain
        } else if has_medications {
            EntryType::Medication
        } else if is_period {
            EntryType::Period
        } else {
            requested
        }
    }

    /// Whether the entry counts as a pain episode
    pub fn is_pain(self) -> bool {
        matches!(self, EntryType::Migraine | EntryType::Pain)
    }
}

/// Relief obtained from a medication
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relief {
    /// The medication did not help
    #[default]
    #[serde(alias = "Ninguno")]
    None,

    /// Partial relief
    #[serde(alias = "Moderado")]
    Moderate,

    /// Complete relief
    Total,
}

impl Relief {
    /// Moderate and total relief count as effective
    pub fn is_effective(self) -> bool {
        matches!(self, Relief::Moderate | Relief::Total)
    }
}

/// How much an episode limited the user's day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionalImpact {
    #[default]
    #[serde(alias = "Nada")]
    None,

    #[serde(alias = "Limitado")]
    Limited,

    #[serde(alias = "Postración", alias = "Postracion")]
    Prostration,
}

/// A medication logged as part of an episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationEntry {
    /// Identifier of the entry within its episode
    #[serde(default)]
    pub id: String,

    /// Medication name
    pub name: String,

    /// Dose as typed by the user (e.g. "400mg")
    #[serde(default)]
    pub dose: String,

    /// Time the medication was taken (`HH:MM`)
    #[serde(default)]
    pub time: String,

    /// Relief obtained
    #[serde(default)]
    pub relief: Relief,
}

impl MedicationEntry {
    /// Create a medication entry with a fresh identifier
    pub fn new(name: impl Into<String>, dose: impl Into<String>, time: impl Into<String>, relief: Relief) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            dose: dose.into(),
            time: time.into(),
            relief,
        }
    }
}

/// Storage model for one logged episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Crisis {
    /// Unique identifier, assigned by the repository
    #[serde(default)]
    pub id: String,

    /// Day the episode pertains to
    #[serde(with = "super::date")]
    pub date: NaiveDate,

    /// Entry classification
    #[serde(rename = "type", default)]
    pub kind: EntryType,

    /// Start time (`HH:MM`)
    #[serde(default)]
    pub start_time: String,

    /// Optional end time (`HH:MM`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,

    /// Derived from start and end time, e.g. "1h 45m"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    /// Pain intensity on a 0-10 scale
    #[validate(range(min = 0, max = 10, message = "Intensity must be between 0 and 10"))]
    #[serde(default)]
    pub intensity: u8,

    /// Body locations of the pain
    #[serde(default)]
    pub localization: Vec<String>,

    /// Descriptive pain qualities (pulsating, pressing...)
    #[serde(default)]
    pub pain_quality: Vec<String>,

    /// Accompanying symptoms
    #[serde(default)]
    pub symptoms: Vec<String>,

    /// Medications taken, in the order they were logged
    #[serde(default)]
    pub medications: Vec<MedicationEntry>,

    #[serde(default)]
    pub functional_impact: FunctionalImpact,

    #[serde(default)]
    pub notes: String,

    /// Menstrual correlation flag, independent of `kind`
    #[serde(default)]
    pub is_period: bool,

    /// Name of the first medication, kept for older readers of the data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_name: Option<String>,

    /// Dose of the first medication, kept for older readers of the data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_amount: Option<String>,
}

impl Crisis {
    /// Recompute the duration from the start and end times
    pub fn refresh_duration(&mut self) {
        self.duration = self
            .end_time
            .as_deref()
            .and_then(|end| format_duration(&self.start_time, end));
    }

    /// Mirror the first medication into the denormalized fields and make sure
    /// every medication entry has an identifier
    pub fn sync_medications(&mut self) {
        for medication in &mut self.medications {
            if medication.id.is_empty() {
                medication.id = Uuid::new_v4().to_string();
            }
        }

        let first = self.medications.first();
        self.medication_name = first.map(|m| m.name.clone());
        self.medication_amount = first.map(|m| m.dose.clone());
    }
}

/// Input data for creating a new episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCrisis {
    /// Day the episode pertains to. Timestamps are reduced to their UTC date.
    #[serde(with = "super::date")]
    pub date: NaiveDate,

    #[serde(rename = "type", default)]
    pub kind: EntryType,

    #[serde(default)]
    pub start_time: String,

    #[serde(default)]
    pub end_time: Option<String>,

    #[serde(default)]
    pub intensity: u8,

    #[serde(default)]
    pub localization: Vec<String>,

    #[serde(default)]
    pub pain_quality: Vec<String>,

    #[serde(default)]
    pub symptoms: Vec<String>,

    #[serde(default)]
    pub medications: Vec<MedicationEntry>,

    #[serde(default)]
    pub functional_impact: FunctionalImpact,

    #[serde(default)]
    pub notes: String,

    #[serde(default)]
    pub is_period: bool,
}

impl NewCrisis {
    /// Start an entry for the given day
    pub fn new(date: NaiveDate, kind: EntryType) -> Self {
        Self {
            date,
            kind,
            start_time: String::new(),
            end_time: None,
            intensity: 0,
            localization: Vec::new(),
            pain_quality: Vec::new(),
            symptoms: Vec::new(),
            medications: Vec::new(),
            functional_impact: FunctionalImpact::None,
            notes: String::new(),
            is_period: false,
        }
    }

    pub fn with_intensity(mut self, intensity: u8) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_times(mut self, start_time: impl Into<String>, end_time: Option<&str>) -> Self {
        self.start_time = start_time.into();
        self.end_time = end_time.map(str::to_string);
        self
    }

    pub fn with_symptoms<I, S>(mut self, symptoms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symptoms = symptoms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_localization<I, S>(mut self, localization: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.localization = localization.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_medication(mut self, medication: MedicationEntry) -> Self {
        self.medications.push(medication);
        self
    }

    pub fn with_period(mut self, is_period: bool) -> Self {
        self.is_period = is_period;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Replace the requested type with the one derived from the logged data
    pub fn with_derived_type(mut self) -> Self {
        self.kind = EntryType::classify(self.kind, self.intensity, !self.medications.is_empty(), self.is_period);
        self
    }

    /// Build the stored record under the given identifier
    pub fn into_crisis(self, id: String) -> Crisis {
        let mut crisis = Crisis {
            id,
            date: self.date,
            kind: self.kind,
            start_time: self.start_time,
            end_time: self.end_time,
            duration: None,
            intensity: self.intensity,
            localization: self.localization,
            pain_quality: self.pain_quality,
            symptoms: self.symptoms,
            medications: self.medications,
            functional_impact: self.functional_impact,
            notes: self.notes,
            is_period: self.is_period,
            medication_name: None,
            medication_amount: None,
        };
        crisis.refresh_duration();
        crisis.sync_medications();
        crisis
    }
}

/// Partial update for an episode. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrisisPatch {
    pub date: Option<NaiveDate>,
    pub kind: Option<EntryType>,
    pub start_time: Option<String>,
    /// `Some(None)` clears the end time
    pub end_time: Option<Option<String>>,
    pub intensity: Option<u8>,
    pub localization: Option<Vec<String>>,
    pub pain_quality: Option<Vec<String>>,
    pub symptoms: Option<Vec<String>>,
    pub medications: Option<Vec<MedicationEntry>>,
    pub functional_impact: Option<FunctionalImpact>,
    pub notes: Option<String>,
    pub is_period: Option<bool>,
}

impl CrisisPatch {
    /// Merge the specified fields into `crisis`, refreshing derived fields
    pub fn apply_to(self, crisis: &mut Crisis) {
        let times_changed = self.start_time.is_some() || self.end_time.is_some();
        let medications_changed = self.medications.is_some();

        if let Some(date) = self.date {
            crisis.date = date;
        }
        if let Some(kind) = self.kind {
            crisis.kind = kind;
        }
        if let Some(start_time) = self.start_time {
            crisis.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            crisis.end_time = end_time;
        }
        if let Some(intensity) = self.intensity {
            crisis.intensity = intensity;
        }
        if let Some(localization) = self.localization {
            crisis.localization = localization;
        }
        if let Some(pain_quality) = self.pain_quality {
            crisis.pain_quality = pain_quality;
        }
        if let Some(symptoms) = self.symptoms {
            crisis.symptoms = symptoms;
        }
        if let Some(medications) = self.medications {
            crisis.medications = medications;
        }
        if let Some(functional_impact) = self.functional_impact {
            crisis.functional_impact = functional_impact;
        }
        if let Some(notes) = self.notes {
            crisis.notes = notes;
        }
        if let Some(is_period) = self.is_period {
            crisis.is_period = is_period;
        }

        if times_changed {
            crisis.refresh_duration();
        }
        if medications_changed {
            crisis.sync_medications();
        }
    }
}

/// Parse a `HH:MM` clock time into minutes past midnight
fn parse_clock(time: &str) -> Option<u32> {
    let (hours, minutes) = time.trim().split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;

    if hours < 24 && minutes < 60 {
        Some(hours * 60 + minutes)
    } else {
        None
    }
}

/// Format the time between two clock times, wrapping past midnight
pub fn format_duration(start_time: &str, end_time: &str) -> Option<String> {
    const MINUTES_PER_DAY: u32 = 24 * 60;

    let start = parse_clock(start_time)?;
    let end = parse_clock(end_time)?;
    let elapsed = (end + MINUTES_PER_DAY - start) % MINUTES_PER_DAY;

    Some(format!("{}h {}m", elapsed / 60, elapsed % 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_format_duration_same_day() {
        assert_eq!(format_duration("10:15", "12:45").as_deref(), Some("2h 30m"));
        assert_eq!(format_duration("08:00", "08:00").as_deref(), Some("0h 0m"));
    }

    #[test]
    fn test_format_duration_wraps_midnight() {
        assert_eq!(format_duration("23:30", "01:15").as_deref(), Some("1h 45m"));
    }

    #[test]
    fn test_format_duration_rejects_bad_times() {
        assert_eq!(format_duration("", "10:00"), None);
        assert_eq!(format_duration("25:00", "10:00"), None);
        assert_eq!(format_duration("10:00", "10:75"), None);
    }

    #[test]
    fn test_classify_entry_type() {
        assert_eq!(EntryType::classify(EntryType::Rest, 3, true, true), EntryType::Pain);
        assert_eq!(EntryType::classify(EntryType::Rest, 0, true, true), EntryType::Medication);
        assert_eq!(EntryType::classify(EntryType::Rest, 0, false, true), EntryType::Period);
        assert_eq!(EntryType::classify(EntryType::Rest, 0, false, false), EntryType::Rest);
    }

    #[test]
    fn test_into_crisis_derives_fields() {
        let crisis = NewCrisis::new(test_date(), EntryType::Migraine)
            .with_times("22:00", Some("02:30"))
            .with_medication(MedicationEntry {
                id: String::new(),
                name: "Ibuprofen".to_string(),
                dose: "400mg".to_string(),
                time: "22:10".to_string(),
                relief: Relief::Moderate,
            })
            .into_crisis("abc".to_string());

        assert_eq!(crisis.id, "abc");
        assert_eq!(crisis.duration.as_deref(), Some("4h 30m"));
        assert_eq!(crisis.medication_name.as_deref(), Some("Ibuprofen"));
        assert_eq!(crisis.medication_amount.as_deref(), Some("400mg"));
        assert!(!crisis.medications[0].id.is_empty());
    }

    #[test]
    fn test_patch_only_touches_given_fields() {
        let mut crisis = NewCrisis::new(test_date(), EntryType::Pain)
            .with_intensity(5)
            .with_symptoms(["Nausea"])
            .with_times("09:00", Some("10:00"))
            .into_crisis("id-1".to_string());

        CrisisPatch {
            intensity: Some(8),
            ..Default::default()
        }
        .apply_to(&mut crisis);

        assert_eq!(crisis.intensity, 8);
        assert_eq!(crisis.symptoms, vec!["Nausea".to_string()]);
        assert_eq!(crisis.duration.as_deref(), Some("1h 0m"));
    }

    #[test]
    fn test_patch_clearing_end_time_drops_duration() {
        let mut crisis = NewCrisis::new(test_date(), EntryType::Pain)
            .with_times("09:00", Some("10:00"))
            .into_crisis("id-1".to_string());

        CrisisPatch {
            end_time: Some(None),
            ..Default::default()
        }
        .apply_to(&mut crisis);

        assert_eq!(crisis.end_time, None);
        assert_eq!(crisis.duration, None);
    }

    #[test]
    fn test_intensity_validation() {
        let mut crisis = NewCrisis::new(test_date(), EntryType::Pain).into_crisis("id".to_string());
        crisis.intensity = 10;
        assert!(crisis.validate().is_ok());
        crisis.intensity = 11;
        assert!(crisis.validate().is_err());
    }

    #[test]
    fn test_deserialize_legacy_labels() {
        let json = r#"{
            "id": "legacy-1",
            "date": "2023-11-02T18:20:00.000Z",
            "type": "Migraña",
            "startTime": "18:20",
            "intensity": 7,
            "localization": ["Temporal"],
            "painQuality": [],
            "symptoms": ["Náuseas"],
            "medications": [
                {"id": "m1", "name": "Sumatriptán", "dose": "50mg", "time": "18:30", "relief": "Moderado"}
            ],
            "functionalImpact": "Postración",
            "notes": "",
            "isPeriod": true
        }"#;

        let crisis: Crisis = serde_json::from_str(json).unwrap();
        assert_eq!(crisis.date, NaiveDate::from_ymd_opt(2023, 11, 2).unwrap());
        assert_eq!(crisis.kind, EntryType::Migraine);
        assert_eq!(crisis.medications[0].relief, Relief::Moderate);
        assert_eq!(crisis.functional_impact, FunctionalImpact::Prostration);
        assert!(crisis.is_period);
    }

    #[test]
    fn test_serialize_uses_camel_case_and_plain_date() {
        let crisis = NewCrisis::new(test_date(), EntryType::Rest)
            .with_period(true)
            .into_crisis("id-9".to_string());

        let value = serde_json::to_value(&crisis).unwrap();
        assert_eq!(value["date"], "2024-06-01");
        assert_eq!(value["type"], "Rest");
        assert_eq!(value["isPeriod"], true);
        assert_eq!(value["functionalImpact"], "None");
        assert!(value.get("endTime").is_none());
    }
}
