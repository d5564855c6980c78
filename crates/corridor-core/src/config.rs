use std::path::PathBuf;
use std::time::Duration;

/// Default maximum lock duration when no override file is readable.
pub const DEFAULT_LOCK_MINUTES: u64 = 60;

/// Hot-reloadable maximum lock duration.
///
/// Operators tune the lock window at runtime by writing a number of
/// minutes into a plain text file; the value is re-read on every use so a
/// change takes effect on the next payment without a restart. Any read or
/// parse failure falls back to the default.
#[derive(Debug, Clone)]
pub struct LockDurationConfig {
    path: Option<PathBuf>,
    default: Duration,
}

impl LockDurationConfig {
    pub fn new(path: Option<PathBuf>, default: Duration) -> Self {
        Self { path, default }
    }

    /// A fixed duration with no file override.
    pub fn fixed(default: Duration) -> Self {
        Self {
            path: None,
            default,
        }
    }

    /// Watch the given file, defaulting to [`DEFAULT_LOCK_MINUTES`].
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            default: Duration::from_secs(DEFAULT_LOCK_MINUTES * 60),
        }
    }

    /// The current maximum lock duration.
    pub fn max_duration(&self) -> Duration {
        let Some(path) = &self.path else {
            return self.default;
        };
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let digits: String = contents.chars().filter(|c| c.is_ascii_digit()).collect();
                match digits.parse::<u64>() {
                    Ok(minutes) => {
                        tracing::debug!(minutes, path = %path.display(), "lock max duration read from file");
                        Duration::from_secs(minutes * 60)
                    }
                    Err(_) => {
                        tracing::warn!(
                            path = %path.display(),
                            default_secs = self.default.as_secs(),
                            "lock duration file holds no number, using default"
                        );
                        self.default
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    default_secs = self.default.as_secs(),
                    "failed to read lock duration file, using default"
                );
                self.default
            }
        }
    }
}

impl Default for LockDurationConfig {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(DEFAULT_LOCK_MINUTES * 60))
    }
}
