use std::path::PathBuf;
use std::str::FromStr;

use rocket::figment::Figment;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://games.db?mode=rwc";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings read from the environment (and a `.env` file, if any).
/// Everything else about the HTTP server comes from Rocket's own configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    /// Directory with `index.html` and other static assets.
    pub static_dir: PathBuf,
    /// Overrides Rocket's port when set.
    pub port: Option<u16>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_vars(|name| dotenv::var(name).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned()),
            max_connections: parse(&var, "DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            static_dir: var("STATIC_DIR")
                .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_owned())
                .into(),
            port: parse(&var, "PORT")?,
        })
    }

    pub fn figment(&self) -> Figment {
        let figment = rocket::Config::figment();
        match self.port {
            Some(port) => figment.merge(("port", port)),
            None => figment,
        }
    }
}

fn parse<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    var(name)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value })
        })
        .transpose()
}
