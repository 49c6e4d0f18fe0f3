use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use reqcount::{Config, logging, pipeline};
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    let config = Config::parse();
    logging::init(config.verbose, config.quiet);

    let mut rng = StdRng::from_entropy();
    let summary = match pipeline::run(&config, &mut rng) {
        Ok(summary) => summary,
        Err(e) => {
            error!("{}", e);
            // Reported even when the log filter hides errors.
            eprintln!("reqcount: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if config.stats_json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("could not encode run summary: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
