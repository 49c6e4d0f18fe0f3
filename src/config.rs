use crate::CountError;
use crate::store::CollisionPolicy;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

pub const DEFAULT_INPUT_PATH: &str = "input.txt";
pub const DEFAULT_OUTPUT_PATH: &str = "output.txt";
pub const DEFAULT_REQUESTS_QTY: usize = 4;

/// Overrides the parent of the scratch directory when `--temp-root` is absent.
pub const TEMP_ROOT_ENV: &str = "REQCOUNT_TMP_DIR";

/// Path value meaning "read requests from standard input".
pub const STDIN_PATH: &str = "-";

#[derive(Parser, Debug, Clone)]
#[command(name = "reqcount")]
#[command(about = "Count newline-delimited requests with a bounded number held in memory", long_about = None)]
pub struct Config {
    /// Input file with requests ("-" reads standard input)
    #[arg(long, default_value = DEFAULT_INPUT_PATH)]
    pub input: PathBuf,

    /// Output file with results
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Maximum quantity of distinct requests in memory (greater than 0)
    #[arg(long, default_value_t = DEFAULT_REQUESTS_QTY)]
    pub qty: usize,

    /// Directory to create the scratch directory in [env: REQCOUNT_TMP_DIR] [default: .]
    #[arg(long)]
    pub temp_root: Option<PathBuf>,

    /// Skip the fsync of each partial record (faster, but deferred write failures go unreported)
    #[arg(long)]
    pub no_sync: bool,

    /// Merge into a record even if it belongs to a different request with the same digest
    #[arg(long)]
    pub allow_collisions: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub stats_json: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT_PATH),
            output: PathBuf::from(DEFAULT_OUTPUT_PATH),
            qty: DEFAULT_REQUESTS_QTY,
            temp_root: None,
            no_sync: false,
            allow_collisions: false,
            stats_json: false,
            verbose: 0,
            quiet: false,
        }
    }
}

impl Config {
    /// Configuration for library callers and tests
    pub fn custom(input: impl Into<PathBuf>, output: impl Into<PathBuf>, qty: usize) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            qty,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), CountError> {
        if self.qty < 1 {
            return Err(CountError::Config("qty must be greater than 0".to_string()));
        }
        Ok(())
    }

    pub fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == STDIN_PATH
    }

    pub fn temp_root(&self) -> PathBuf {
        self.temp_root
            .clone()
            .or_else(|| std::env::var_os(TEMP_ROOT_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn collision_policy(&self) -> CollisionPolicy {
        if self.allow_collisions {
            CollisionPolicy::Ignore
        } else {
            CollisionPolicy::Reject
        }
    }
}
