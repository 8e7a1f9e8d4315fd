//! Recording files: a literal byte-for-byte capture of everything written
//! to a client's rendering socket.
//!
//! Grounded on spec §6's recording file format and the teacher's own use of
//! `fs2` for advisory locking in its transfer/resume bookkeeping
//! (`crates/daemon`). A new recording is created with a numeric `.N` suffix
//! when the base path already exists, and held under an exclusive `flock`
//! for its lifetime so a second daemon process (or a stray second task in
//! this one) can detect an in-progress recording rather than silently
//! corrupting it.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;

use fs2::FileExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Highest numeric suffix tried before giving up.
const MAX_SUFFIX: u32 = 255;

/// Guards against two tasks in this process opening the same base path's
/// recording concurrently; `flock` only arbitrates across processes.
static OPEN_BASE_PATHS: StdMutex<Option<HashSet<PathBuf>>> = StdMutex::new(None);

fn claim_base_path(base: &Path) -> bool {
    let mut guard = OPEN_BASE_PATHS.lock().unwrap();
    let set = guard.get_or_insert_with(HashSet::new);
    set.insert(base.to_path_buf())
}

fn release_base_path(base: &Path) {
    if let Some(set) = OPEN_BASE_PATHS.lock().unwrap().as_mut() {
        set.remove(base);
    }
}

/// An error opening or writing a recording file.
#[derive(Debug)]
pub enum RecordingError {
    /// Every suffix up to [`MAX_SUFFIX`] was already locked or in use.
    Exhausted,
    /// A task in this process already holds the base path open.
    AlreadyOpenInProcess,
    /// The underlying filesystem operation failed.
    Io(io::Error),
}

impl std::fmt::Display for RecordingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exhausted => write!(f, "no free recording filename up to .{MAX_SUFFIX}"),
            Self::AlreadyOpenInProcess => {
                write!(f, "recording base path already open in this process")
            }
            Self::Io(e) => write!(f, "recording I/O error: {e}"),
        }
    }
}

impl std::error::Error for RecordingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Exhausted | Self::AlreadyOpenInProcess => None,
        }
    }
}

impl From<io::Error> for RecordingError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// An open, locked recording file.
pub struct RecordingFile {
    base: PathBuf,
    file: Mutex<File>,
}

impl RecordingFile {
    /// Opens a recording rooted at `base`. If `base` already exists, tries
    /// `base.1`, `base.2`, ... up to `base.255` before failing.
    pub async fn create(base: impl AsRef<Path>) -> Result<Self, RecordingError> {
        let base = base.as_ref().to_path_buf();
        if !claim_base_path(&base) {
            return Err(RecordingError::AlreadyOpenInProcess);
        }

        let result = Self::create_locked(&base).await;
        if result.is_err() {
            release_base_path(&base);
        }
        result
    }

    async fn create_locked(base: &Path) -> Result<Self, RecordingError> {
        let mut candidate = base.to_path_buf();
        let mut suffix = 0u32;
        loop {
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await;

            match opened {
                Ok(file) => {
                    let std_file = file.into_std().await;
                    std_file.try_lock_exclusive().map_err(|_| RecordingError::Exhausted)?;
                    return Ok(Self { base: base.to_path_buf(), file: Mutex::new(File::from_std(std_file)) });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    suffix += 1;
                    if suffix > MAX_SUFFIX {
                        return Err(RecordingError::Exhausted);
                    }
                    candidate = PathBuf::from(format!("{}.{suffix}", base.display()));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Appends raw bytes exactly as received (no re-framing).
    pub async fn append(&self, bytes: &[u8]) -> Result<(), RecordingError> {
        let mut file = self.file.lock().await;
        file.write_all(bytes).await.map_err(RecordingError::Io)
    }

    /// Flushes to disk.
    pub async fn flush(&self) -> Result<(), RecordingError> {
        let mut file = self.file.lock().await;
        file.flush().await.map_err(RecordingError::Io)
    }
}

impl Drop for RecordingFile {
    fn drop(&mut self) {
        release_base_path(&self.base);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_create_for_same_base_gets_numeric_suffix() {
        let dir = tempdir();
        let base = dir.join("recording");

        let first = RecordingFile::create(&base).await.unwrap();
        drop(first);

        let second = RecordingFile::create(&base).await.unwrap();

        assert!(tokio::fs::metadata(&base).await.is_ok());
        assert!(tokio::fs::metadata(format!("{}.1", base.display())).await.is_ok());

        drop(second);
        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn concurrent_create_in_process_is_rejected() {
        let dir = tempdir();
        let base = dir.join("recording");

        let _first = RecordingFile::create(&base).await.unwrap();
        let err = RecordingFile::create(&base).await.unwrap_err();
        assert!(matches!(err, RecordingError::AlreadyOpenInProcess));

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn append_writes_raw_bytes_verbatim() {
        let dir = tempdir();
        let base = dir.join("recording");

        let recording = RecordingFile::create(&base).await.unwrap();
        recording.append(b"4.sync,3.123;").await.unwrap();
        recording.flush().await.unwrap();
        drop(recording);

        let contents = tokio::fs::read(&base).await.unwrap();
        assert_eq!(contents, b"4.sync,3.123;");
        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    fn tempdir() -> PathBuf {
        let mut dir = std::env::temp_dir();
        let unique = format!(
            "guac-render-test-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        );
        dir.push(unique);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
