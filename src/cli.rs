use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use futures::StreamExt;

use weather_timeline::{
    AppConfig, Coordinate, FixedLocationProvider, HistoryRecord, HistoryService, HistoryStore,
    LocationProvider, LocationState, LookupOutcome, OpenMeteoClient, WeatherQueryService,
    WeatherSession, telemetry,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-timeline",
    version,
    about = "Weather for any date and time at your location, with lookup history"
)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Look up the weather at the current location.
    Fetch {
        /// Date as YYYY-MM-DD; today if absent.
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Time as HH:MM; noon if absent.
        #[arg(long, value_parser = parse_time)]
        time: Option<NaiveTime>,

        /// Latitude overriding the configured location.
        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,

        /// Longitude overriding the configured location.
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,

        /// Save the reading to history.
        #[arg(long)]
        save: bool,
    },

    /// Show the current location.
    Locate {
        /// Keep printing this many further updates.
        #[arg(long, default_value_t = 0)]
        follow: usize,
    },

    /// Browse and manage the lookup history.
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List records, newest first.
    List {
        /// Only records on or after this date.
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Only records on or before this date.
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Only records whose description contains this text.
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one record.
    Show { id: u64 },
    /// Delete one record.
    Delete { id: u64 },
    /// Delete every record.
    Clear,
    /// Number of records.
    Count,
    /// Print the list again whenever it changes.
    Watch,
}

fn parse_time(value: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(value, "%H:%M").or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = AppConfig::load_from_path(self.config)?;
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
        telemetry::init(&config.logging)?;

        match self.command {
            Command::Fetch {
                date,
                time,
                lat,
                lon,
                save,
            } => {
                let fixed = match (lat, lon) {
                    (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
                    _ => config.location.fixed_coordinate(),
                };
                let session = WeatherSession::new(
                    WeatherQueryService::new(Arc::new(OpenMeteoClient::new(&config.weather)?)),
                    open_history(&config)?,
                    Arc::new(FixedLocationProvider::new(fixed)),
                );

                let date = date.unwrap_or_else(|| Local::now().date_naive());
                match session.lookup(date, time, save).await? {
                    LookupOutcome::Applied(reading, saved) => {
                        println!("{reading}");
                        if let Some(id) = saved {
                            println!("Saved to history as #{id}");
                        }
                    }
                    LookupOutcome::Superseded => {}
                }
            }
            Command::Locate { follow } => {
                let provider = Arc::new(FixedLocationProvider::new(
                    config.location.fixed_coordinate(),
                ));
                let state = LocationState::from_fix(provider.current_location().await);
                println!("{}", state);

                if follow > 0 {
                    let updates = provider.location_updates(config.location.update_interval());
                    let mut updates = updates.skip(1).take(follow);
                    while let Some(coordinate) = updates.next().await {
                        println!("{}", coordinate.format_coordinates());
                    }
                }
            }
            Command::History { command } => {
                run_history(command, open_history(&config)?).await?;
            }
        }

        Ok(())
    }
}

fn open_history(config: &AppConfig) -> anyhow::Result<HistoryService> {
    let store = HistoryStore::open(&config.history.location)
        .with_context(|| format!("Failed to open history at {}", config.history.location))?;
    Ok(HistoryService::new(Arc::new(store)))
}

async fn run_history(command: HistoryCommand, history: HistoryService) -> anyhow::Result<()> {
    match command {
        HistoryCommand::List { from, to, search } => {
            let mut records = match (from, to) {
                (None, None) => history.snapshot().await?,
                (from, to) => {
                    let start = from.unwrap_or(NaiveDate::MIN).and_time(NaiveTime::MIN);
                    let end = to
                        .unwrap_or(NaiveDate::MAX)
                        .and_hms_opt(23, 59, 59)
                        .unwrap_or(chrono::NaiveDateTime::MAX);
                    let mut range = Box::pin(history.list_between(start, end));
                    range.next().await.transpose()?.unwrap_or_default()
                }
            };
            if let Some(text) = search {
                records.retain(|record| record.description_contains(&text));
            }
            print_records(&records);
        }
        HistoryCommand::Show { id } => match history.get_by_id(id).await? {
            Some(record) => println!("{record}"),
            None => println!("No history record #{id}"),
        },
        HistoryCommand::Delete { id } => {
            history.delete_by_id(id).await?;
            println!("Deleted #{id}");
        }
        HistoryCommand::Clear => {
            history.delete_all().await?;
            println!("History cleared");
        }
        HistoryCommand::Count => println!("{}", history.count().await),
        HistoryCommand::Watch => {
            let mut updates = Box::pin(history.list());
            while let Some(records) = updates.next().await {
                print_records(&records?);
                println!("---");
            }
        }
    }
    Ok(())
}

fn print_records(records: &[HistoryRecord]) {
    println!("{}", render_records(records));
}

fn render_records(records: &[HistoryRecord]) -> String {
    if records.is_empty() {
        return "History is empty".to_string();
    }
    records
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
