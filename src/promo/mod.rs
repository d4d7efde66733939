//! Emergency-promo banner dismissal.
//!
//! The only durable client-side state: the moment the visitor last closed the
//! banner. The banner stays hidden for seven days after that.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// How long a dismissal suppresses the banner.
pub const SUPPRESS_FOR: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Storage key, kept for parity with the browser's local-storage slot.
pub const STORAGE_KEY: &str = "emergency-banner-dismissed";

#[derive(Debug, Error)]
pub enum PromoError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("corrupt dismissal record in {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the dismissal timestamp lives.
pub trait DismissalStore: Send + Sync {
    /// Milliseconds since the Unix epoch of the last dismissal, if any.
    fn load(&self) -> Result<Option<u64>, PromoError>;

    fn save(&self, dismissed_at_ms: u64) -> Result<(), PromoError>;
}

/// Process-local store for tests and server-side rendering.
#[derive(Debug, Default)]
pub struct MemoryStore {
    value: Mutex<Option<u64>>,
}

impl DismissalStore for MemoryStore {
    fn load(&self) -> Result<Option<u64>, PromoError> {
        Ok(*self.value.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn save(&self, dismissed_at_ms: u64) -> Result<(), PromoError> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(dismissed_at_ms);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DismissalRecord {
    key: String,
    dismissed_at: u64,
}

/// Keeps the dismissal in a small JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

impl DismissalStore for FileStore {
    fn load(&self) -> Result<Option<u64>, PromoError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PromoError::Io {
                    path: self.display_path(),
                    source,
                });
            }
        };
        let record: DismissalRecord =
            serde_json::from_str(&contents).map_err(|source| PromoError::Corrupt {
                path: self.display_path(),
                source,
            })?;
        Ok(Some(record.dismissed_at))
    }

    fn save(&self, dismissed_at_ms: u64) -> Result<(), PromoError> {
        let record = DismissalRecord {
            key: STORAGE_KEY.to_owned(),
            dismissed_at: dismissed_at_ms,
        };
        let json = serde_json::to_string(&record).map_err(|source| PromoError::Corrupt {
            path: self.display_path(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| PromoError::Io {
            path: self.display_path(),
            source,
        })
    }
}

/// Decides whether the banner is shown.
pub struct PromoBanner<S> {
    store: S,
}

impl<S: DismissalStore> PromoBanner<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// `true` unless the banner was dismissed less than [`SUPPRESS_FOR`] before `now`.
    ///
    /// An unreadable record shows the banner.
    pub fn should_show(&self, now: SystemTime) -> bool {
        let dismissed_at = match self.store.load() {
            Ok(Some(ms)) => ms,
            Ok(None) => return true,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable banner dismissal");
                return true;
            }
        };
        let elapsed = epoch_ms(now).saturating_sub(dismissed_at);
        elapsed >= millis(SUPPRESS_FOR)
    }

    pub fn dismiss(&self, now: SystemTime) -> Result<(), PromoError> {
        let at = epoch_ms(now);
        debug!(dismissed_at = at, "banner dismissed");
        self.store.save(at)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn epoch_ms(time: SystemTime) -> u64 {
    // Clocks before 1970 count as the epoch.
    time.duration_since(UNIX_EPOCH).map(millis).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn at(days: u32) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_760_000_000) + DAY * days
    }

    #[test]
    fn shown_until_dismissed() {
        let banner = PromoBanner::new(MemoryStore::default());
        assert!(banner.should_show(at(0)));
        banner.dismiss(at(0)).unwrap();
        assert!(!banner.should_show(at(0)));
    }

    #[test]
    fn reappears_after_seven_days() {
        let banner = PromoBanner::new(MemoryStore::default());
        banner.dismiss(at(0)).unwrap();
        assert!(!banner.should_show(at(6)));
        assert!(banner.should_show(at(7)));
    }

    #[test]
    fn file_store_round_trips() {
        let path = std::env::temp_dir().join(format!("aircare-promo-{}.json", std::process::id()));
        let store = FileStore::new(&path);
        assert_eq!(store.load().unwrap(), None);

        store.save(42).unwrap();
        assert_eq!(store.load().unwrap(), Some(42));
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains(STORAGE_KEY));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn corrupt_file_shows_banner() {
        let path =
            std::env::temp_dir().join(format!("aircare-promo-corrupt-{}.json", std::process::id()));
        fs::write(&path, "not json").unwrap();
        let store = FileStore::new(&path);
        assert!(matches!(store.load(), Err(PromoError::Corrupt { .. })));
        assert!(PromoBanner::new(store).should_show(at(0)));
        fs::remove_file(&path).unwrap();
    }
}
