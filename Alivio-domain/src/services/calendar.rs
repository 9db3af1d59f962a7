use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};

use crate::entities::{Crisis, EntryType};

/// Filter applied to the entries of a calendar day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CalendarFilter {
    #[default]
    All,
    /// Migraine or other pain episodes
    Pain,
    /// Entries flagged as period days, whatever their type
    Period,
    /// Entries of exactly this type
    Kind(EntryType),
}

impl CalendarFilter {
    pub fn matches(self, crisis: &Crisis) -> bool {
        match self {
            CalendarFilter::All => true,
            CalendarFilter::Pain => crisis.kind.is_pain(),
            CalendarFilter::Period => crisis.is_period,
            CalendarFilter::Kind(kind) => crisis.kind == kind,
        }
    }
}

/// Entries logged on `date` that pass `filter`, in journal order
pub fn entries_on(crises: &[Crisis], date: NaiveDate, filter: CalendarFilter) -> Vec<&Crisis> {
    crises
        .iter()
        .filter(|crisis| crisis.date == date && filter.matches(crisis))
        .collect()
}

/// Icons shown on a calendar cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayMarkers {
    pub pain: bool,
    pub medication: bool,
    pub period: bool,
    pub rest: bool,
}

impl DayMarkers {
    fn record(&mut self, crisis: &Crisis) {
        self.pain |= crisis.kind.is_pain();
        self.medication |= !crisis.medications.is_empty() || crisis.kind == EntryType::Medication;
        self.period |= crisis.is_period;
        self.rest |= crisis.kind == EntryType::Rest;
    }

    pub fn is_empty(&self) -> bool {
        *self == DayMarkers::default()
    }
}

/// Markers for every day that has entries, built in a single pass so each
/// calendar cell is a constant-time lookup
#[derive(Debug, Clone, Default)]
pub struct DayIndex {
    days: HashMap<NaiveDate, DayMarkers>,
}

impl DayIndex {
    pub fn build(crises: &[Crisis]) -> Self {
        let mut days: HashMap<NaiveDate, DayMarkers> = HashMap::new();
        for crisis in crises {
            days.entry(crisis.date).or_default().record(crisis);
        }
        Self { days }
    }

    /// Markers for `date`; empty when nothing was logged
    pub fn markers(&self, date: NaiveDate) -> DayMarkers {
        self.days.get(&date).copied().unwrap_or_default()
    }

    /// Number of distinct days with entries
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Grid geometry of a month in a Monday-first calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthLayout {
    first_day: NaiveDate,
    /// Cells before the 1st, filled with the end of the previous month
    pub start_offset: u32,
    /// Days in the month
    pub days: u32,
    /// Days in the previous month
    pub prev_month_days: u32,
}

impl MonthLayout {
    /// Layout of `month` (1-12) in `year`; `None` for an invalid month
    pub fn for_month(year: i32, month: u32) -> Option<Self> {
        let first_day = NaiveDate::from_ymd_opt(year, month, 1)?;
        let last_of_previous = first_day.pred_opt()?;
        let first_of_next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };

        Some(Self {
            first_day,
            start_offset: first_day.weekday().num_days_from_monday(),
            days: (first_of_next - first_day).num_days() as u32,
            prev_month_days: last_of_previous.day(),
        })
    }

    /// Layout of the month containing `date`
    pub fn containing(date: NaiveDate) -> Option<Self> {
        Self::for_month(date.year(), date.month())
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    /// Day numbers of the previous month shown before the 1st
    pub fn prev_month_fill(&self) -> Vec<u32> {
        (0..self.start_offset)
            .map(|i| self.prev_month_days - self.start_offset + i + 1)
            .collect()
    }

    /// Every date on the grid, padded with neighbouring days to whole weeks
    /// (28 to 42 cells)
    pub fn visible_dates(&self) -> Vec<NaiveDate> {
        let filled = self.start_offset + self.days;
        let cells = (filled + 6) / 7 * 7;
        let start = self.first_day - Duration::days(i64::from(self.start_offset));

        (0..i64::from(cells)).map(|i| start + Duration::days(i)).collect()
    }
}
