use crate::CountError;
use crate::random::random_name;
use rand::Rng;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Length of a generated scratch directory name.
pub const SCRATCH_NAME_LEN: usize = 16;

const MAX_NAME_ATTEMPTS: usize = 8;

/// Run-scoped directory holding the partial records.
///
/// Removal is attempted when the value is dropped, whether the run succeeded
/// or not. A failed removal is logged and otherwise ignored.
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Create a fresh directory with a random name under `root`.
    pub fn create_in<R: Rng>(root: &Path, rng: &mut R) -> Result<Self, CountError> {
        let mut last_err = None;
        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = root.join(random_name(rng, SCRATCH_NAME_LEN));
            match fs::create_dir(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "created scratch directory");
                    return Ok(Self { path });
                }
                // Name taken, draw another one.
                Err(e) if e.kind() == ErrorKind::AlreadyExists => last_err = Some((path, e)),
                Err(source) => return Err(CountError::Scratch { path, source }),
            }
        }
        match last_err {
            Some((path, source)) => Err(CountError::Scratch { path, source }),
            None => Err(CountError::Other("no scratch directory name attempts".to_string())),
        }
    }

    /// Take ownership of an existing, caller-chosen directory.
    pub fn adopt(path: PathBuf) -> Result<Self, CountError> {
        fs::create_dir_all(&path).map_err(|source| CountError::Scratch {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "could not remove scratch directory");
            }
        } else {
            debug!(path = %self.path.display(), "removed scratch directory");
        }
    }
}
