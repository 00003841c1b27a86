use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const RETRY_INTERVAL: Duration = Duration::from_millis(25);

/// Advisory single-writer lock for library-wide documents.
///
/// Holds an exclusive OS lock on a persistent lock file. The kernel drops
/// the lock when the holding process exits, so a crashed writer never
/// leaves the library locked. Whatever a previous holder wrote into the
/// file is irrelevant.
#[derive(Debug)]
pub struct LibraryLock {
    path: PathBuf,
    file: File,
}

impl LibraryLock {
    /// Wait up to `timeout` for the lock at `path`.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let start = Instant::now();
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => break,
                Err(err) if is_contended(&err) => {
                    if start.elapsed() >= timeout {
                        return Err(Error::Locked(path.to_path_buf()));
                    }
                    thread::sleep(RETRY_INTERVAL);
                }
                Err(err) => return Err(err.into()),
            }
        }

        // Holder pid is informational only.
        if let Err(err) = record_holder(&mut file) {
            debug!("Could not record lock holder in {}: {}", path.display(), err);
        }
        debug!("Acquired library lock {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LibraryLock {
    fn drop(&mut self) {
        match FileExt::unlock(&self.file) {
            Ok(()) => debug!("Released library lock {}", self.path.display()),
            Err(e) => warn!("Failed to release lock {}: {}", self.path.display(), e),
        }
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

fn record_holder(file: &mut File) -> io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", std::process::id())
}
