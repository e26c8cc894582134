use dotenv::dotenv;
use log::*;

use std::env;
use std::path::PathBuf;

const DEFAULT_DATABASE_URL: &str = "sqlite://polls.db";
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/**
 * Runtime configuration, read from the environment (and `.env` if present)
 */
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: String,
    pub template_dir: PathBuf,
    pub max_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            template_dir: default_template_dir(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

fn default_template_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates")
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /**
     * Build the configuration from an arbitrary key lookup, falling back to
     * the defaults for anything missing
     */
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(
                    "Ignoring invalid DATABASE_MAX_CONNECTIONS {:?}, using {}",
                    raw, defaults.max_connections
                );
                defaults.max_connections
            }),
            None => defaults.max_connections,
        };

        Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            listen_addr: lookup("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            template_dir: lookup("TEMPLATE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.template_dir),
            max_connections,
        }
    }
}
