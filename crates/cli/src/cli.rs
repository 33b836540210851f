use std::path::PathBuf;

use clap::Parser;

use sumo_import_core::{MalformedPolicy, Overrides};

/// Import exported Sumo Logic content into a personal folder.
///
/// Every JSON document under the source path that is importable content
/// (not a folder) is submitted as an import job into the destination folder,
/// one job at a time. A CSV manifest of the outcomes is written at the end.
#[derive(Parser, Debug)]
#[command(name = "sumo-import", version, about = "Import Sumo Logic content into a personal folder")]
pub struct CliArgs {
    /// Credential pair <access_id>:<access_key> (overrides SUMO_UID / SUMO_KEY)
    #[arg(short = 'a', value_name = "KEY:SECRET")]
    pub secret_pair: Option<String>,

    /// Client pair <deployment>_<org_id> (overrides SUMO_LOC / SUMO_ORG)
    #[arg(short = 'k', value_name = "SITE_ORGID")]
    pub client_pair: Option<String>,

    /// Config file (default: <config dir>/sumo-import/config.toml)
    #[arg(short = 'c', value_name = "CONFIGFILE")]
    pub config: Option<PathBuf>,

    /// Source file or directory of exported content
    #[arg(short = 's', value_name = "SOURCES")]
    pub source: PathBuf,

    /// Destination folder name under the personal folder
    #[arg(short = 'd', value_name = "IMPORTDST")]
    pub destination: String,

    /// Verbosity: >3 steps, >5 per item, >9 every status poll
    #[arg(short = 'v', value_name = "LEVEL", default_value_t = 0)]
    pub verbose: u32,

    /// Explicit API endpoint, e.g. https://api.us2.sumologic.com/api
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Directory the manifest is written to
    #[arg(long)]
    pub manifest_dir: Option<PathBuf>,

    /// What to do with files that are not valid content documents
    #[arg(long, value_name = "abort|skip")]
    pub on_malformed: Option<MalformedPolicy>,

    /// Delay between status polls, and before each submission
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Give up on a job after this many polls (0 = never)
    #[arg(long)]
    pub max_polls: Option<u32>,
}

impl CliArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            secret_pair: self.secret_pair.clone(),
            client_pair: self.client_pair.clone(),
            endpoint: self.endpoint.clone(),
            manifest_dir: self.manifest_dir.clone(),
            poll_interval_ms: self.poll_interval_ms,
            max_polls: self.max_polls,
            on_malformed: self.on_malformed,
        }
    }

    /// Default log filter for the `-v` level, used when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        verbosity_filter(self.verbose)
    }
}

pub fn verbosity_filter(level: u32) -> &'static str {
    match level {
        0..=3 => "warn",
        4..=5 => "info",
        6..=9 => "debug",
        _ => "trace",
    }
}
