use ::config::{Config, ConfigError, Environment, File, Map};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::consume::DEFAULT_MAX_ATTEMPTS;
use crate::error::{LedgerError, Result};

const DEFAULT_DB_PATH: &str = "parts-ledger.db";
const DEFAULT_LOG_LEVEL: &str = "info";
pub const ENV_PREFIX: &str = "PARTS_LEDGER";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Directory of the sled database
    pub db_path: PathBuf,
    /// Throw the database away on drop, for tests and demos
    pub temporary: bool,
    /// Conditional-write attempts before a consumption reports a conflict
    pub max_consume_attempts: u32,
    /// Put the local read cache in front of the stores
    pub cache: bool,
    pub log_level: String,
    /// Technician roster offered when attributing a consumption
    pub technicians: Vec<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            temporary: false,
            max_consume_attempts: DEFAULT_MAX_ATTEMPTS,
            cache: true,
            log_level: DEFAULT_LOG_LEVEL.to_owned(),
            technicians: vec![],
        }
    }
}

impl LedgerConfig {
    /// Defaults, then the optional file, then `PARTS_LEDGER_*` variables.
    /// The roster is comma separated in the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, None)
    }

    // `env` replaces the process environment when given
    fn load_from(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let mut config: LedgerConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("technicians")
                    .source(env),
            )
            .build()?
            .try_deserialize()?;

        config.technicians = config
            .technicians
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect();
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_consume_attempts == 0 {
            return Err(LedgerError::Config(ConfigError::Message(
                "max_consume_attempts must be at least 1".to_owned(),
            )));
        }
        if !self.temporary && self.db_path.as_os_str().is_empty() {
            return Err(LedgerError::Config(ConfigError::Message(
                "db_path must be set unless the database is temporary".to_owned(),
            )));
        }
        Ok(())
    }

    pub fn open_db(&self) -> Result<sled::Db> {
        let db = sled::Config::new()
            .path(&self.db_path)
            .temporary(self.temporary)
            .open()?;
        Ok(db)
    }

    /// `RUST_LOG` wins over the configured level. Safe to call twice.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.log_level.clone()));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }
}
