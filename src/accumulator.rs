use crate::CountError;
use crate::store::{CountBuffer, PartialSums};
use serde::Serialize;
use std::io::BufRead;
use std::path::PathBuf;
use tracing::debug;

pub const DEFAULT_DELIMITER: u8 = b'\n';

/// Counters describing one pass over the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AccumulatorStats {
    pub lines_read: u64,
    pub blank_lines: u64,
    pub requests_counted: u64,
    pub flushes: u64,
}

/// Counts tokens in memory and hands the buffer to a [`PartialSums`] sink
/// whenever it holds `max` distinct tokens.
pub struct Accumulator {
    buffer: CountBuffer,
    max: usize,
    delimiter: u8,
    source: PathBuf,
    stats: AccumulatorStats,
}

impl Accumulator {
    pub fn new(max: usize) -> Result<Self, CountError> {
        if max < 1 {
            return Err(CountError::Config(
                "max distinct requests in memory must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            buffer: CountBuffer::with_capacity_and_hasher(max, Default::default()),
            max,
            delimiter: DEFAULT_DELIMITER,
            source: PathBuf::from("<stream>"),
            stats: AccumulatorStats::default(),
        })
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Name used for the input in read errors.
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = source.into();
        self
    }

    pub fn stats(&self) -> AccumulatorStats {
        self.stats
    }

    /// Consume `reader` to the end, flushing into `sink` as the buffer fills
    /// and once more at end of input.
    pub fn process<R: BufRead, S: PartialSums>(
        &mut self,
        mut reader: R,
        sink: &mut S,
    ) -> Result<AccumulatorStats, CountError> {
        let mut line = Vec::new();
        loop {
            line.clear();
            let read = reader
                .read_until(self.delimiter, &mut line)
                .map_err(|source| CountError::Input {
                    path: self.source.clone(),
                    source,
                })?;
            if read == 0 {
                break;
            }

            if line.last() == Some(&self.delimiter) {
                line.pop();
            }
            self.stats.lines_read += 1;

            if line.is_empty() {
                self.stats.blank_lines += 1;
                continue;
            }

            self.add(&line, sink)?;
        }

        self.flush(sink)?;
        Ok(self.stats)
    }

    fn add<S: PartialSums>(&mut self, token: &[u8], sink: &mut S) -> Result<(), CountError> {
        match self.buffer.get_mut(token) {
            Some(count) => *count += 1,
            None => {
                self.buffer.insert(token.to_vec(), 1);
            }
        }
        self.stats.requests_counted += 1;

        if self.buffer.len() == self.max {
            self.flush(sink)?;
        }
        Ok(())
    }

    fn flush<S: PartialSums>(&mut self, sink: &mut S) -> Result<(), CountError> {
        debug!(distinct = self.buffer.len(), flush = self.stats.flushes + 1, "flushing buffer");
        sink.merge(&self.buffer)?;
        self.buffer.clear();
        self.stats.flushes += 1;
        Ok(())
    }
}
