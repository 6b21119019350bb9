//! `weather-timeline` command-line tool.

use std::process::ExitCode;

use clap::Parser;
use weather_timeline::WeatherTimelineError;

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cmd = cli::Cli::parse();
    match cmd.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(app_error) = err.downcast_ref::<WeatherTimelineError>() {
                eprintln!("{}", app_error.user_message());
            }
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
