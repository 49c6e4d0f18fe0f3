use crate::CountError;
use crate::accumulator::Accumulator;
use crate::config::Config;
use crate::merger::merge_records;
use crate::scratch::ScratchDir;
use crate::store::PartialSumStore;
use rand::Rng;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub lines_read: u64,
    pub blank_lines: u64,
    pub requests_counted: u64,
    pub flushes: u64,
    pub distinct_tokens: u64,
    pub merge_batches: u64,
    pub output: PathBuf,
}

/// Count the configured input into the configured output.
///
/// The scratch directory is named from `rng` under [`Config::temp_root`] and
/// removed before this returns, on success or failure.
pub fn run<R: Rng>(config: &Config, rng: &mut R) -> Result<RunSummary, CountError> {
    config.validate()?;
    let input = open_input(config)?;
    let scratch = ScratchDir::create_in(&config.temp_root(), rng)?;
    run_with_scratch(config, input, &scratch)
}

/// Run the three stages over `input` using an already created scratch directory.
pub fn run_with_scratch<R: BufRead>(
    config: &Config,
    input: R,
    scratch: &ScratchDir,
) -> Result<RunSummary, CountError> {
    config.validate()?;
    let start = Instant::now();
    info!(
        input = %config.input.display(),
        output = %config.output.display(),
        qty = config.qty,
        scratch = %scratch.path().display(),
        "counting requests"
    );

    let mut store = PartialSumStore::new(scratch.path())
        .with_collision_policy(config.collision_policy())
        .with_sync(!config.no_sync);
    let counted = Accumulator::new(config.qty)?
        .with_source(&config.input)
        .process(input, &mut store)?;
    info!(
        lines = counted.lines_read,
        requests = counted.requests_counted,
        flushes = counted.flushes,
        "input consumed"
    );

    let merged = merge_records(scratch.path(), config.qty, &config.output)?;

    let summary = RunSummary {
        lines_read: counted.lines_read,
        blank_lines: counted.blank_lines,
        requests_counted: counted.requests_counted,
        flushes: counted.flushes,
        distinct_tokens: merged.records,
        merge_batches: merged.batches,
        output: config.output.clone(),
    };
    info!(
        distinct = summary.distinct_tokens,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "wrote {}",
        summary.output.display()
    );
    Ok(summary)
}

fn open_input(config: &Config) -> Result<Box<dyn BufRead>, CountError> {
    if config.reads_stdin() {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(&config.input).map_err(|source| CountError::Input {
        path: config.input.clone(),
        source,
    })?;
    Ok(Box::new(BufReader::new(file)))
}
