use std::env;
use std::error::Error;
use std::fmt::{self, Display};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use tell_no_lie_core::ContextPolicy;
use tell_no_lie_core::trial::TrialSet;

/// Base URL used when `TELL_NO_LIE_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

const BASE_URL_VAR: &str = "TELL_NO_LIE_BASE_URL";
const TIMEOUT_VAR: &str = "TELL_NO_LIE_TIMEOUT_SECS";
const TRIAL_FILE_VAR: &str = "TELL_NO_LIE_TRIAL_FILE";
const INCLUDE_PROBES_VAR: &str = "TELL_NO_LIE_INCLUDE_PROBES";

/// Settings of a session, usually read from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Where the chat backend is served.
    pub base_url: String,
    /// Time a reply may take.
    pub timeout: Duration,
    /// The trial questions.
    pub trial_set: TrialSet,
    /// What goes into the backend context.
    pub context_policy: ContextPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(30),
            trial_set: TrialSet::default(),
            context_policy: ContextPolicy::default(),
        }
    }
}

impl Settings {
    /// Reads the settings from `TELL_NO_LIE_*` environment variables,
    /// falling back to defaults for unset ones.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the settings through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        if let Some(base_url) = lookup(BASE_URL_VAR) {
            settings.base_url = base_url;
        }
        if let Some(value) = lookup(TIMEOUT_VAR) {
            settings.timeout = match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(SettingsError::InvalidTimeout(value)),
            };
        }
        if let Some(path) = lookup(TRIAL_FILE_VAR) {
            settings.trial_set = load_trial_set(PathBuf::from(path))?;
        }
        if let Some(value) = lookup(INCLUDE_PROBES_VAR) {
            settings.context_policy.include_probes = parse_flag(&value)
                .ok_or(SettingsError::InvalidFlag {
                    name: INCLUDE_PROBES_VAR,
                    value,
                })?;
        }

        debug!("settings: {settings:?}");
        Ok(settings)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn load_trial_set(path: PathBuf) -> Result<TrialSet, SettingsError> {
    let json = match fs::read_to_string(&path) {
        Ok(json) => json,
        Err(source) => {
            return Err(SettingsError::ReadTrialFile { path, source });
        }
    };
    serde_json::from_str(&json)
        .map_err(|source| SettingsError::ParseTrialFile { path, source })
}

/// Why the settings could not be read.
#[derive(Debug)]
pub enum SettingsError {
    /// The timeout is not a positive number of seconds.
    InvalidTimeout(String),
    /// A boolean variable has an unrecognized value.
    InvalidFlag {
        /// Variable name.
        name: &'static str,
        /// The offending value.
        value: String,
    },
    /// The trial file could not be read.
    ReadTrialFile {
        /// Path of the file.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
    /// The trial file is not a valid trial set.
    ParseTrialFile {
        /// Path of the file.
        path: PathBuf,
        /// The underlying error.
        source: serde_json::Error,
    },
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTimeout(value) => write!(
                f,
                "{TIMEOUT_VAR} must be a positive number of seconds, \
                 got {value:?}"
            ),
            Self::InvalidFlag { name, value } => {
                write!(f, "{name} must be true or false, got {value:?}")
            }
            Self::ReadTrialFile { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            Self::ParseTrialFile { path, source } => {
                write!(f, "invalid trial set in {}: {source}", path.display())
            }
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ReadTrialFile { source, .. } => Some(source),
            Self::ParseTrialFile { source, .. } => Some(source),
            _ => None,
        }
    }
}
