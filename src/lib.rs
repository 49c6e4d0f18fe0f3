pub mod accumulator;
pub mod config;
pub mod digest;
pub mod error;
pub mod logging;
pub mod merger;
pub mod pipeline;
pub mod random;
pub mod record;
pub mod scratch;
pub mod store;

pub use accumulator::{Accumulator, AccumulatorStats};
pub use config::Config;
pub use error::*;
pub use merger::{MergeStats, merge_records};
pub use pipeline::{RunSummary, run, run_with_scratch};
pub use scratch::ScratchDir;
pub use store::{CollisionPolicy, CountBuffer, PartialSumStore, PartialSums};
