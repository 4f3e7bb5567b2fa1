// cadre-common/src/settings.rs
use std::env;

use tracing::{debug, warn};

use super::error::Result;

const DEFAULT_SUITE_NAME: &str = "test";
const DEFAULT_SUITE_ENV: &str = "CADRE_DEFAULT_SUITE";
const CONFLICT_MODE_ENV: &str = "CADRE_CONFLICT_MODE";

/// How a (suite, kind) domain settles two direct declarations of the same
/// module at different versions. An enforced platform constraint settles the
/// disagreement regardless of mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictMode {
    HighestWins,
    Fail,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub default_suite: String,
    pub conflict_mode: ConflictMode,
}

impl Settings {
    pub fn load() -> Result<Self> {
        debug!("Loading cadre settings");

        let default_suite = env::var(DEFAULT_SUITE_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                debug!(
                    "{} not set or empty, falling back to default: {}",
                    DEFAULT_SUITE_ENV, DEFAULT_SUITE_NAME
                );
                DEFAULT_SUITE_NAME.to_string()
            });

        let conflict_mode = match env::var(CONFLICT_MODE_ENV).ok().as_deref() {
            Some("fail") => ConflictMode::Fail,
            Some("highest") | None => ConflictMode::HighestWins,
            Some(other) => {
                warn!(
                    "Unrecognized {} value '{}', falling back to 'highest'",
                    CONFLICT_MODE_ENV, other
                );
                ConflictMode::HighestWins
            }
        };

        debug!(
            "Settings loaded: default_suite='{}', conflict_mode={:?}",
            default_suite, conflict_mode
        );
        Ok(Self {
            default_suite,
            conflict_mode,
        })
    }

    pub fn with_conflict_mode(mut self, mode: ConflictMode) -> Self {
        self.conflict_mode = mode;
        self
    }

    pub fn with_default_suite(mut self, name: impl Into<String>) -> Self {
        self.default_suite = name.into();
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_suite: DEFAULT_SUITE_NAME.to_string(),
            conflict_mode: ConflictMode::HighestWins,
        }
    }
}

pub fn load_settings() -> Result<Settings> {
    Settings::load()
}
