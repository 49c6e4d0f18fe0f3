use crate::CountError;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub records: u64,
    pub batches: u64,
    pub bytes: u64,
}

/// Concatenate every record file in `dir` into `out_path`.
///
/// Directory entries are taken `batch_size` at a time, so at most that many
/// paths are held in memory. Output order is whatever the directory listing
/// yields. On failure the partially written output is removed.
pub fn merge_records(dir: &Path, batch_size: usize, out_path: &Path) -> Result<MergeStats, CountError> {
    if batch_size < 1 {
        return Err(CountError::Config("merge batch size must be greater than 0".to_string()));
    }

    let entries = fs::read_dir(dir).map_err(|source| CountError::Merge {
        path: dir.to_path_buf(),
        source,
    })?;

    let out = File::create(out_path).map_err(|source| CountError::Output {
        path: out_path.to_path_buf(),
        source,
    })?;

    let result = copy_batches(entries, dir, batch_size, BufWriter::new(out), out_path);
    if result.is_err() {
        if let Err(e) = fs::remove_file(out_path) {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %out_path.display(), error = %e, "could not remove partial output");
            }
        }
    }
    result
}

fn copy_batches(
    mut entries: fs::ReadDir,
    dir: &Path,
    batch_size: usize,
    mut out: BufWriter<File>,
    out_path: &Path,
) -> Result<MergeStats, CountError> {
    let output_err = |source: std::io::Error| CountError::Output {
        path: out_path.to_path_buf(),
        source,
    };

    let mut stats = MergeStats::default();
    let mut batch: Vec<PathBuf> = Vec::with_capacity(batch_size);

    loop {
        batch.clear();
        for entry in entries.by_ref().take(batch_size) {
            let entry = entry.map_err(|source| CountError::Merge {
                path: dir.to_path_buf(),
                source,
            })?;
            batch.push(entry.path());
        }
        if batch.is_empty() {
            break;
        }

        for path in &batch {
            let data = fs::read(path).map_err(|source| CountError::Merge {
                path: path.clone(),
                source,
            })?;
            out.write_all(&data).map_err(output_err)?;
            stats.records += 1;
            stats.bytes += data.len() as u64;
        }
        stats.batches += 1;
        debug!(batch = stats.batches, size = batch.len(), "merged batch");
    }

    out.flush().map_err(output_err)?;
    let file = out.into_inner().map_err(|e| output_err(e.into_error()))?;
    file.sync_all().map_err(output_err)?;

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn write_records(dir: &Path, count: usize) -> HashSet<String> {
        let mut expected = HashSet::new();
        for i in 0..count {
            let content = format!("test{}\t{}\n", i, i * 10);
            fs::write(dir.join(format!("test{}", i)), &content).unwrap();
            expected.insert(content);
        }
        expected
    }

    #[test]
    fn test_merge_concatenates_every_record() {
        let temp_dir = tempfile::tempdir().unwrap();
        let records = temp_dir.path().join("records");
        fs::create_dir(&records).unwrap();
        let expected = write_records(&records, 128);
        let out = temp_dir.path().join("out.txt");

        let stats = merge_records(&records, 4, &out).unwrap();

        assert_eq!(stats.records, 128);
        assert_eq!(stats.batches, 32);
        let output = fs::read_to_string(&out).unwrap();
        let lines: HashSet<String> = output.split_inclusive('\n').map(str::to_string).collect();
        assert_eq!(lines, expected);
        assert_eq!(output.lines().count(), 128);
    }

    #[test]
    fn test_merge_truncates_existing_output() {
        let temp_dir = tempfile::tempdir().unwrap();
        let records = temp_dir.path().join("records");
        fs::create_dir(&records).unwrap();
        write_records(&records, 1);
        let out = temp_dir.path().join("out.txt");
        fs::write(&out, "stale line\nanother stale line\n").unwrap();

        merge_records(&records, 3, &out).unwrap();

        assert_eq!(fs::read_to_string(&out).unwrap(), "test0\t0\n");
    }

    #[test]
    fn test_empty_directory_gives_empty_output() {
        let temp_dir = tempfile::tempdir().unwrap();
        let records = temp_dir.path().join("records");
        fs::create_dir(&records).unwrap();
        let out = temp_dir.path().join("out.txt");

        let stats = merge_records(&records, 4, &out).unwrap();

        assert_eq!(stats, MergeStats::default());
        assert_eq!(fs::read(&out).unwrap().len(), 0);
    }

    #[test]
    fn test_missing_directory_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let out = temp_dir.path().join("out.txt");
        let result = merge_records(&temp_dir.path().join("nope"), 4, &out);
        assert!(matches!(result, Err(CountError::Merge { .. })));
        assert!(!out.exists());
    }

    #[test]
    fn test_unwritable_output_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let out = temp_dir.path().join("no_such_dir").join("out.txt");
        let result = merge_records(temp_dir.path(), 4, &out);
        assert!(matches!(result, Err(CountError::Output { .. })));
    }

    #[test]
    fn test_unreadable_entry_removes_partial_output() {
        let temp_dir = tempfile::tempdir().unwrap();
        let records = temp_dir.path().join("records");
        fs::create_dir(&records).unwrap();
        // A directory entry cannot be read as a record.
        fs::create_dir(records.join("not_a_record")).unwrap();
        let out = temp_dir.path().join("out.txt");

        let result = merge_records(&records, 4, &out);

        assert!(matches!(result, Err(CountError::Merge { .. })));
        assert!(!out.exists());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = merge_records(temp_dir.path(), 0, &temp_dir.path().join("out.txt"));
        assert!(matches!(result, Err(CountError::Config(_))));
    }
}
