use crate::errors::StoreError;
use crate::models::{AnswerLabel, Tally};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};
use tracing::{info, warn};

/// Why [`TallyStore::read_all`] substituted the zero record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    Missing,
    Unreadable(String),
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyRead {
    pub tally: Tally,
    pub fallback: Option<FallbackReason>,
}

/// File-backed tally. Every call re-reads the file; the mutex serializes
/// whole read-modify-write cycles so concurrent submissions are not lost.
#[derive(Debug)]
pub struct TallyStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl TallyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub async fn read_all(&self) -> TallyRead {
        let _guard = self.lock.lock().await;
        read_file(&self.path).await
    }

    pub async fn write_all(&self, tally: &Tally) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        write_file(&self.path, tally).await
    }

    pub async fn increment(&self, label: AnswerLabel) -> Result<Tally, StoreError> {
        let _guard = self.lock.lock().await;
        let mut tally = read_file(&self.path).await.tally;
        tally.increment(label);
        write_file(&self.path, &tally).await?;
        Ok(tally)
    }

    pub async fn reset_all(&self) -> Result<(), StoreError> {
        self.write_all(&Tally::default()).await
    }

    /// Startup check: rewrites the file with zeros unless it already holds a
    /// well-formed tally. Returns `true` when the file was (re)initialized.
    pub async fn ensure_initialized(&self) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        match read_file(&self.path).await.fallback {
            None => {
                info!("data file {} found", self.path.display());
                Ok(false)
            }
            Some(reason) => {
                write_file(&self.path, &Tally::default()).await?;
                info!("data file {} initialized ({reason:?})", self.path.display());
                Ok(true)
            }
        }
    }
}

async fn read_file(path: &Path) -> TallyRead {
    let fallback = match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<Tally>(&bytes) {
            Ok(tally) => {
                return TallyRead {
                    tally,
                    fallback: None,
                }
            }
            Err(err) => {
                warn!("data file {} is malformed, using zero tally: {err}", path.display());
                FallbackReason::Malformed(err.to_string())
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => FallbackReason::Missing,
        Err(err) => {
            warn!("failed to read data file {}, using zero tally: {err}", path.display());
            FallbackReason::Unreadable(err.to_string())
        }
    };

    TallyRead {
        tally: Tally::default(),
        fallback: Some(fallback),
    }
}

/// Writes to a sibling temp file and renames it over `path`, so a failed
/// write never leaves a truncated data file behind.
async fn write_file(path: &Path, tally: &Tally) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(tally)?;
    let tmp = temp_path(path);

    let result = match fs::write(&tmp, payload).await {
        Ok(()) => fs::rename(&tmp, path).await,
        Err(err) => Err(err),
    };
    if let Err(source) = result {
        let _ = fs::remove_file(&tmp).await;
        return Err(StoreError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
