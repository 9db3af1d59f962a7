use std::path::PathBuf;

use alivio_domain::entities::{parse_record_date, EntryType, Relief};
use alivio_domain::services::CalendarFilter;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "alivio", version, about = "Local migraine journal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the most recent entries
    List {
        /// Number of entries to show
        #[arg(long, short = 'n', default_value_t = 10)]
        limit: usize,
    },

    /// Log a new entry
    Log(LogArgs),

    /// Delete an entry by ID
    Delete { id: String },

    /// Show the entries logged on one day
    Day {
        #[arg(value_parser = parse_date)]
        date: NaiveDate,

        #[arg(long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
    },

    /// Print a month grid with the markers of each day
    Calendar {
        year: i32,
        #[arg(value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,
    },

    /// Rolling 30-day statistics as JSON
    Stats {
        /// Compute as of this date instead of today
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },

    /// Most frequent symptom, medication and location as JSON
    Insights {
        /// Use Spanish fallback labels
        #[arg(long, default_value_t = false)]
        spanish: bool,
    },

    /// Show or replace the profile
    Profile(ProfileArgs),

    /// Write a JSON backup
    Export {
        /// Output file; stdout when omitted
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Replace the journal with a JSON backup
    Import {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Delete every entry and the profile
    Clear {
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
pub struct LogArgs {
    /// Day of the entry (YYYY-MM-DD or an ISO-8601 timestamp); today when omitted
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Entry type; derived from the logged data when omitted
    #[arg(long = "type", value_enum)]
    pub kind: Option<EntryTypeArg>,

    /// Pain intensity 0-10
    #[arg(long, short = 'i', default_value_t = 0)]
    pub intensity: u8,

    /// Start time (HH:MM)
    #[arg(long)]
    pub start: Option<String>,

    /// End time (HH:MM)
    #[arg(long)]
    pub end: Option<String>,

    #[arg(long = "symptom", value_delimiter = ',')]
    pub symptoms: Vec<String>,

    #[arg(long = "location", value_delimiter = ',')]
    pub localization: Vec<String>,

    /// Medication taken
    #[arg(long)]
    pub medication: Option<String>,

    #[arg(long, default_value = "")]
    pub dose: String,

    #[arg(long, value_enum, default_value_t = ReliefArg::None)]
    pub relief: ReliefArg,

    /// Mark the day as a period day
    #[arg(long, default_value_t = false)]
    pub period: bool,

    #[arg(long, default_value = "")]
    pub notes: String,
}

#[derive(Args, Debug)]
pub struct ProfileArgs {
    /// New display name; shows the current profile when omitted
    #[arg(long)]
    pub name: Option<String>,

    /// Kept from the stored profile when omitted
    #[arg(long)]
    pub age: Option<u32>,

    /// Kept from the stored profile when omitted
    #[arg(long = "migraine-type")]
    pub migraine_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntryTypeArg {
    Migraine,
    Pain,
    Medication,
    Period,
    Rest,
}

impl From<EntryTypeArg> for EntryType {
    fn from(arg: EntryTypeArg) -> Self {
        match arg {
            EntryTypeArg::Migraine => EntryType::Migraine,
            EntryTypeArg::Pain => EntryType::Pain,
            EntryTypeArg::Medication => EntryType::Medication,
            EntryTypeArg::Period => EntryType::Period,
            EntryTypeArg::Rest => EntryType::Rest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReliefArg {
    None,
    Moderate,
    Total,
}

impl From<ReliefArg> for Relief {
    fn from(arg: ReliefArg) -> Self {
        match arg {
            ReliefArg::None => Relief::None,
            ReliefArg::Moderate => Relief::Moderate,
            ReliefArg::Total => Relief::Total,
        }
    }
}

/// Calendar filter selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterArg {
    All,
    /// Migraine or other pain
    Pain,
    /// Any entry flagged as a period day
    Period,
    Migraine,
    Medication,
    Rest,
}

impl From<FilterArg> for CalendarFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => CalendarFilter::All,
            FilterArg::Pain => CalendarFilter::Pain,
            FilterArg::Period => CalendarFilter::Period,
            FilterArg::Migraine => CalendarFilter::Kind(EntryType::Migraine),
            FilterArg::Medication => CalendarFilter::Kind(EntryType::Medication),
            FilterArg::Rest => CalendarFilter::Kind(EntryType::Rest),
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    parse_record_date(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_log_command() {
        let cli = Cli::try_parse_from([
            "alivio",
            "log",
            "--date",
            "2024-05-02T21:00:00Z",
            "--intensity",
            "7",
            "--symptom",
            "Nausea,Aura",
            "--medication",
            "Ibuprofen",
            "--relief",
            "moderate",
        ])
        .unwrap();

        let Command::Log(args) = cli.command else {
            panic!("expected log command");
        };
        assert_eq!(args.date, NaiveDate::from_ymd_opt(2024, 5, 2));
        assert_eq!(args.symptoms, vec!["Nausea", "Aura"]);
        assert_eq!(Relief::from(args.relief), Relief::Moderate);
        assert_eq!(args.kind, None);
    }

    #[test]
    fn test_rejects_bad_month_and_date() {
        assert!(Cli::try_parse_from(["alivio", "calendar", "2024", "13"]).is_err());
        assert!(Cli::try_parse_from(["alivio", "day", "yesterday"]).is_err());
    }

    #[test]
    fn test_filter_mapping() {
        assert_eq!(CalendarFilter::from(FilterArg::Rest), CalendarFilter::Kind(EntryType::Rest));
        assert_eq!(CalendarFilter::from(FilterArg::Period), CalendarFilter::Period);
    }
}
