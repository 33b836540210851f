use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_MANIFEST_DIR: &str = "/var/tmp";
pub const DEFAULT_MANIFEST_TAG: &str = "sumologic-import";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_MAX_POLLS: u32 = 3600;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

// ── Endpoint ──────────────────────────────────────────────────

/// How the API base URL is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Full base URL, e.g. `https://api.us2.sumologic.com/api`.
    Explicit(String),
    /// Deployment code, e.g. `us2`.
    Deployment(String),
    /// Ask the default endpoint and follow its redirect.
    Discover,
}

impl Endpoint {
    pub fn explicit(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        if url.ends_with('/') {
            return Err(ConfigError::TrailingSlash(url));
        }
        Ok(Endpoint::Explicit(url))
    }
}

// ── Credentials ───────────────────────────────────────────────

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_id: String,
    pub access_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_id", &self.access_id)
            .field("access_key", &"<redacted>")
            .finish()
    }
}

// ── Policies ──────────────────────────────────────────────────

/// What the source resolver does with a file it cannot parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Stop the run with an error naming the file.
    #[default]
    Abort,
    /// Log a warning and leave the file out of the work list.
    Skip,
}

impl FromStr for MalformedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(MalformedPolicy::Abort),
            "skip" => Ok(MalformedPolicy::Skip),
            other => Err(format!("unknown malformed-source policy '{other}' (abort|skip)")),
        }
    }
}

/// Pacing of the import job driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait between two status polls of the same job.
    pub interval: Duration,
    /// Wait after folder creation and before each job submission.
    pub settle: Duration,
    /// Status fetches allowed per job; `None` polls until terminal.
    pub max_polls: Option<u32>,
}

impl PollPolicy {
    /// `0` means unbounded.
    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = (max_polls > 0).then_some(max_polls);
        self
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            settle: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_polls: Some(DEFAULT_MAX_POLLS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSettings {
    pub dir: PathBuf,
    pub tag: String,
}

impl Default for ManifestSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_MANIFEST_DIR),
            tag: DEFAULT_MANIFEST_TAG.to_string(),
        }
    }
}

// ── Config file ───────────────────────────────────────────────

/// Lowest-priority defaults, read from a `[default]` table.
///
/// The file is TOML. When it is not valid TOML it is read as an INI file with
/// a `[Default]` section and unquoted values, the layout written for the
/// older import script (`SUMO_UID = suABC`). Keys are matched without regard
/// to case in that format.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default, alias = "Default")]
    pub default: FileDefaults,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileDefaults {
    #[serde(default, alias = "SUMO_UID")]
    pub access_id: Option<String>,
    #[serde(default, alias = "SUMO_KEY")]
    pub access_key: Option<String>,
    #[serde(default, alias = "SUMO_LOC")]
    pub deployment: Option<String>,
    #[serde(default, alias = "SUMO_ORG")]
    pub org_id: Option<String>,
    #[serde(default, alias = "SUMO_END")]
    pub endpoint: Option<String>,
    #[serde(default, alias = "SUMO_TAG")]
    pub tag: Option<String>,
    #[serde(default)]
    pub manifest_dir: Option<PathBuf>,
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
    #[serde(default)]
    pub max_polls: Option<u32>,
}

impl FileConfig {
    /// Return the default config file path: ~/.config/sumo-import/config.toml
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("sumo-import").join("config.toml"))
    }

    /// Load an explicitly named file, or the default file when it exists.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file is not.
    pub fn load(path: Option<&Path>) -> Result<Option<Self>, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) if p.exists() => p,
                _ => {
                    tracing::debug!("No config file found, using flags and environment only");
                    return Ok(None);
                }
            },
        };

        tracing::debug!(config_path = %path.display(), "Loading config");
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(&content, &path).map(Some)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        match toml::from_str(content) {
            Ok(config) => Ok(config),
            Err(source) => match Self::parse_ini(content, path)? {
                Some(config) => {
                    tracing::debug!(config_path = %path.display(), "Config read as INI");
                    Ok(config)
                }
                None => Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                }),
            },
        }
    }

    /// `Ok(None)` when the content is not INI or has no default section.
    fn parse_ini(content: &str, path: &Path) -> Result<Option<Self>, ConfigError> {
        let Ok(ini) = Ini::load_from_str(content) else {
            return Ok(None);
        };
        let Some(section) = ini
            .iter()
            .find(|(name, _)| name.is_some_and(|n| n.eq_ignore_ascii_case("default")))
            .map(|(_, props)| props)
        else {
            return Ok(None);
        };

        let mut defaults = FileDefaults::default();
        for (key, value) in section.iter() {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.to_ascii_lowercase().as_str() {
                "access_id" | "sumo_uid" => defaults.access_id = Some(value.to_string()),
                "access_key" | "sumo_key" => defaults.access_key = Some(value.to_string()),
                "deployment" | "sumo_loc" => defaults.deployment = Some(value.to_string()),
                "org_id" | "sumo_org" => defaults.org_id = Some(value.to_string()),
                "endpoint" | "sumo_end" => defaults.endpoint = Some(value.to_string()),
                "tag" | "sumo_tag" => defaults.tag = Some(value.to_string()),
                "manifest_dir" => defaults.manifest_dir = Some(PathBuf::from(value)),
                "poll_interval_ms" => {
                    defaults.poll_interval_ms = Some(parse_number(path, key, value)?)
                }
                "max_polls" => defaults.max_polls = Some(parse_number(path, key, value)?),
                _ => tracing::debug!(key, "Ignoring unknown config key"),
            }
        }

        Ok(Some(Self { default: defaults }))
    }
}

fn parse_number<T: FromStr>(path: &Path, key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        path: path.to_path_buf(),
        key: key.to_string(),
        value: value.to_string(),
    })
}

// ── Settings ──────────────────────────────────────────────────

/// Values given on the command line. They take priority over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `<access_id>:<access_key>`
    pub secret_pair: Option<String>,
    /// `<deployment>_<org_id>`
    pub client_pair: Option<String>,
    pub endpoint: Option<String>,
    pub manifest_dir: Option<PathBuf>,
    pub poll_interval_ms: Option<u64>,
    pub max_polls: Option<u32>,
    pub on_malformed: Option<MalformedPolicy>,
}

/// Immutable run configuration, assembled once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: Credentials,
    pub endpoint: Endpoint,
    pub org_id: Option<String>,
    pub manifest: ManifestSettings,
    pub poll: PollPolicy,
    pub on_malformed: MalformedPolicy,
}

fn split_pair(
    value: &str,
    sep: char,
    what: &'static str,
    expected: &'static str,
) -> Result<(String, String), ConfigError> {
    match value.split_once(sep) {
        Some((a, b)) if !a.is_empty() && !b.is_empty() => Ok((a.to_string(), b.to_string())),
        _ => Err(ConfigError::InvalidPair {
            what,
            value: value.to_string(),
            expected,
        }),
    }
}

impl Settings {
    /// Resolve every setting. Priority: command line > environment > config file > default.
    pub fn resolve(overrides: &Overrides, file: Option<&FileConfig>) -> Result<Self, ConfigError> {
        let defaults = file.map(|f| f.default.clone()).unwrap_or_default();

        let (cli_id, cli_key) = match overrides.secret_pair.as_deref() {
            Some(pair) => {
                let (id, key) = split_pair(pair, ':', "credential pair", "<key>:<secret>")?;
                (Some(id), Some(key))
            }
            None => (None, None),
        };
        let (cli_deployment, cli_org) = match overrides.client_pair.as_deref() {
            Some(pair) => {
                let (dep, org) = split_pair(pair, '_', "client pair", "<site>_<orgid>")?;
                (Some(dep), Some(org))
            }
            None => (None, None),
        };

        let access_id = cli_id
            .or_else(|| env_opt("SUMO_UID"))
            .or(defaults.access_id)
            .ok_or(ConfigError::MissingCredential {
                name: "access id",
                flag: "-a",
                env: "SUMO_UID",
            })?;
        let access_key = cli_key
            .or_else(|| env_opt("SUMO_KEY"))
            .or(defaults.access_key)
            .ok_or(ConfigError::MissingCredential {
                name: "access key",
                flag: "-a",
                env: "SUMO_KEY",
            })?;

        let deployment = cli_deployment
            .or_else(|| env_opt("SUMO_LOC"))
            .or(defaults.deployment);
        let org_id = cli_org.or_else(|| env_opt("SUMO_ORG")).or(defaults.org_id);

        let endpoint = match overrides
            .endpoint
            .clone()
            .or_else(|| env_opt("SUMO_END"))
            .or(defaults.endpoint)
        {
            Some(url) => Endpoint::explicit(url)?,
            None => match deployment {
                Some(dep) => Endpoint::Deployment(dep),
                None => Endpoint::Discover,
            },
        };

        let manifest = ManifestSettings {
            dir: overrides
                .manifest_dir
                .clone()
                .or(defaults.manifest_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST_DIR)),
            tag: env_opt("SUMO_TAG")
                .or(defaults.tag)
                .unwrap_or_else(|| DEFAULT_MANIFEST_TAG.to_string()),
        };

        let interval = Duration::from_millis(
            overrides
                .poll_interval_ms
                .or(defaults.poll_interval_ms)
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
        );
        let poll = PollPolicy {
            interval,
            settle: interval,
            max_polls: None,
        }
        .with_max_polls(
            overrides
                .max_polls
                .or(defaults.max_polls)
                .unwrap_or(DEFAULT_MAX_POLLS),
        );

        Ok(Self {
            credentials: Credentials {
                access_id,
                access_key,
            },
            endpoint,
            org_id,
            manifest,
            poll,
            on_malformed: overrides.on_malformed.unwrap_or_default(),
        })
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::debug!("Settings resolved:");
        tracing::debug!("  access_id:   {}", self.credentials.access_id);
        tracing::debug!("  endpoint:    {:?}", self.endpoint);
        tracing::debug!("  org_id:      {}", self.org_id.as_deref().unwrap_or("(none)"));
        tracing::debug!(
            "  manifest:    dir={}, tag={}",
            self.manifest.dir.display(),
            self.manifest.tag
        );
        tracing::debug!(
            "  poll:        interval={:?}, max_polls={:?}",
            self.poll.interval,
            self.poll.max_polls
        );
        tracing::debug!("  malformed:   {:?}", self.on_malformed);
    }
}
