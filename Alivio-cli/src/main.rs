use std::fs;

use alivio_domain::database::{StoreBackend, StoreConfig};
use alivio_domain::entities::{Crisis, EntryType, InsightLabels, MedicationEntry, NewCrisis, UserProfile};
use alivio_domain::services::{create_default_journal_service, DefaultJournalService, MonthLayout};
use anyhow::{bail, Context, Result};
use chrono::{Datelike, SecondsFormat, Utc};
use clap::Parser;
use dotenv::dotenv;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;

use cli::{Cli, Command, LogArgs, ProfileArgs};

fn main() -> Result<()> {
    // Load environment variables from .env file
    if dotenv().is_err() {
        eprintln!("Warning: .env file not found or couldn't be read. Using environment variables.");
    }

    // Logs go to stderr so command output stays pipeable
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(env_filter)
        .init();

    let cli = Cli::parse();

    let config = StoreConfig::from_env().context("Invalid store configuration")?;
    let journal = create_default_journal_service(&config).context("Failed to open the journal store")?;
    if let Some(warning) = fallback_warning(&config, journal.is_persistent()) {
        eprintln!("{}", warning);
    }
    debug!("Journal opened, running {:?}", cli.command);

    run(&journal, cli.command)
}

fn run(journal: &DefaultJournalService, command: Command) -> Result<()> {
    match command {
        Command::List { limit } => {
            let recent = journal.recent(limit);
            if recent.is_empty() {
                println!("No entries yet.");
            }
            for crisis in &recent {
                println!("{}", describe(crisis));
            }
        }
        Command::Log(args) => {
            let crisis = journal.log_crisis(new_crisis(args))?;
            println!("Logged {}", describe(&crisis));
        }
        Command::Delete { id } => {
            if journal.delete_crisis(&id)? {
                println!("Deleted {}", id);
            } else {
                println!("No entry with ID {}", id);
            }
        }
        Command::Day { date, filter } => {
            for crisis in journal.entries_on(date, filter.into()) {
                println!("{}", describe(&crisis));
            }
        }
        Command::Calendar { year, month } => {
            let layout = MonthLayout::for_month(year, month).context("Invalid month")?;
            print_calendar(journal, &layout);
        }
        Command::Stats { today } => {
            let stats = match today {
                Some(today) => journal.stats_on(today),
                None => journal.stats(),
            };
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Insights { spanish } => {
            let labels = if spanish {
                InsightLabels::spanish()
            } else {
                InsightLabels::default()
            };
            println!("{}", serde_json::to_string_pretty(&journal.insights_with(&labels))?);
        }
        Command::Profile(args) => update_profile(journal, args)?,
        Command::Export { output } => {
            let backup = journal.export()?;
            match output {
                Some(path) => {
                    fs::write(&path, backup).with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Backup written to {}", path.display());
                }
                None => println!("{}", backup),
            }
        }
        Command::Import { input } => {
            let text =
                fs::read_to_string(&input).with_context(|| format!("Failed to read {}", input.display()))?;
            let imported = journal.import(&text)?;
            println!("Imported {} entries", imported);
        }
        Command::Clear { yes } => {
            if !yes {
                bail!("Refusing to delete all data without --yes");
            }
            journal.clear_all()?;
            println!("All data deleted.");
        }
    }

    Ok(())
}

fn new_crisis(args: LogArgs) -> NewCrisis {
    let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
    let mut crisis = NewCrisis::new(date, args.kind.map_or(EntryType::Pain, Into::into))
        .with_intensity(args.intensity)
        .with_symptoms(args.symptoms)
        .with_localization(args.localization)
        .with_period(args.period)
        .with_notes(args.notes);

    if let Some(start) = args.start {
        crisis = crisis.with_times(start, args.end.as_deref());
    }
    if let Some(name) = args.medication {
        let time = Utc::now().format("%H:%M").to_string();
        crisis = crisis.with_medication(MedicationEntry::new(name, args.dose, time, args.relief.into()));
    }
    if args.kind.is_none() {
        crisis = crisis.with_derived_type();
    }
    crisis
}

/// Notice for a SQLite journal that could only be opened in memory
fn fallback_warning(config: &StoreConfig, persistent: bool) -> Option<String> {
    if persistent || config.backend == StoreBackend::Memory {
        return None;
    }
    Some(format!(
        "Warning: could not open {}. Changes made now will be lost when alivio exits.",
        config.sqlite_path.display()
    ))
}

fn update_profile(journal: &DefaultJournalService, args: ProfileArgs) -> Result<()> {
    let existing = journal.profile();
    let Some(profile) = merge_profile(existing.clone(), args) else {
        match existing {
            Some(profile) => println!("{}", serde_json::to_string_pretty(&profile)?),
            None => println!("No profile yet. Create one with --name."),
        }
        return Ok(());
    };

    journal.save_profile(profile)?;
    println!("Profile saved.");
    Ok(())
}

/// Apply the given flags over the stored profile. Fields without a flag keep
/// their stored value; `None` when no name was given.
fn merge_profile(existing: Option<UserProfile>, args: ProfileArgs) -> Option<UserProfile> {
    let name = args.name?;
    let mut profile = existing.unwrap_or_else(|| {
        UserProfile::new("", "", Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
    });

    profile.name = name;
    if let Some(age) = args.age {
        profile.age = Some(age);
    }
    if let Some(migraine_type) = args.migraine_type {
        profile.migraine_type = migraine_type;
    }
    Some(profile)
}

fn describe(crisis: &Crisis) -> String {
    let mut line = format!("{}  {:<10} {:>2}/10  {}", crisis.date, format!("{:?}", crisis.kind), crisis.intensity, crisis.id);
    if let Some(duration) = &crisis.duration {
        line.push_str(&format!("  ({})", duration));
    }
    if !crisis.symptoms.is_empty() {
        line.push_str(&format!("  [{}]", crisis.symptoms.join(", ")));
    }
    line
}

fn print_calendar(journal: &DefaultJournalService, layout: &MonthLayout) {
    let index = journal.day_index();

    println!("Mo    Tu    We    Th    Fr    Sa    Su");
    for week in layout.visible_dates().chunks(7) {
        let row: Vec<String> = week
            .iter()
            .map(|&day| {
                let markers = index.markers(day);
                let flags: String = [
                    (markers.pain, 'P'),
                    (markers.medication, 'M'),
                    (markers.period, 'R'),
                    (markers.rest, 'Z'),
                ]
                .iter()
                .map(|&(set, flag)| if set { flag } else { ' ' })
                .collect();
                let in_month = day.month() == layout.first_day().month();
                if in_month {
                    format!("{:>2}{}", day.day(), flags)
                } else {
                    format!("  {}", " ".repeat(flags.len()))
                }
            })
            .collect();
        println!("{}", row.join(""));
    }
    println!("P pain, M medication, R period, Z rest");
}
