//! Application configuration management.
//!
//! Configuration is read once at startup from environment variables using
//! `envy`, after loading an optional `.env` file.

use std::path::PathBuf;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `ADMIN_SECRET` (required): secret gating the block toggle
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DATABASE_URL` (optional): PostgreSQL connection string; when set,
///   licenses are stored in PostgreSQL instead of the JSON file
/// - `LICENSE_DB_PATH` (optional): JSON snapshot file, defaults to `licenses.json`
/// - `CORS_ALLOWED_ORIGINS` (optional): comma-separated browser origins
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_secret")]
    pub admin_secret: SecretString,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_license_db_path")]
    pub license_db_path: PathBuf,

    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

/// Wrap the raw secret immediately so it never sits in a plain `String`
/// field that `Debug` could print.
fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_license_db_path() -> PathBuf {
    PathBuf::from("licenses.json")
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `ADMIN_SECRET` is missing or a value cannot be
    /// parsed into its expected type.
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names map to upper case: admin_secret -> ADMIN_SECRET
        envy::from_env::<Config>()
    }

    /// Parse configuration from explicit key/value pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }
}
