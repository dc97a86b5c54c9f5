use std::path::Path;

use config::{Config, Environment, File};
use rusqlite::Connection;
use serde::Deserialize;

use crate::error::Result;

pub const IN_MEMORY: &str = ":memory:";

/// Runtime settings, read from an optional `rowforge.toml` in the working
/// directory and `ROWFORGE_*` environment variables, in that order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// SQLite file, or `:memory:`.
    pub database: String,
    /// Authority part of content URIs.
    pub authority: String,
    /// `tracing_subscriber::EnvFilter` directives.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: String::from(IN_MEMORY),
            authority: String::from("rowforge"),
            log_filter: String::from("info"),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::build(File::with_name("rowforge").required(false))
    }
    /// Like [`Settings::load`] but with an explicit, required file.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::build(File::from(path).required(true))
    }

    fn build<S>(file: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = Settings::default();
        let settings = Config::builder()
            .set_default("database", defaults.database)?
            .set_default("authority", defaults.authority)?
            .set_default("log_filter", defaults.log_filter)?
            .add_source(file)
            .add_source(Environment::with_prefix("ROWFORGE"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn open_database(&self) -> Result<Connection> {
        if self.database == IN_MEMORY {
            Ok(Connection::open_in_memory()?)
        } else {
            Ok(Connection::open(&self.database)?)
        }
    }
}
