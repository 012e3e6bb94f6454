//! Configuration for keiba-db.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DATABASE_FILE: &str = "race.db";
const RACE_LIST_FILE: &str = "race_list.txt";

/// Site endpoints and member credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetkeibaConfig {
    #[serde(default = "default_db_url")]
    pub db_url: String,
    #[serde(default = "default_login_url")]
    pub login_url: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

fn default_db_url() -> String {
    crate::scraper::DB_URL.to_string()
}

fn default_login_url() -> String {
    "https://regist.netkeiba.com/account/".to_string()
}

impl Default for NetkeibaConfig {
    fn default() -> Self {
        Self {
            db_url: default_db_url(),
            login_url: default_login_url(),
            email: String::new(),
            password: String::new(),
        }
    }
}

/// Where the database, race list and page dumps live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl PathConfig {
    pub fn database(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn race_list(&self) -> PathBuf {
        self.data_dir.join(RACE_LIST_FILE)
    }
}

/// Request pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Seconds between calendar / race list requests
    #[serde(default = "default_request_interval")]
    pub request_interval_secs: f64,
    /// Seconds between page downloads
    #[serde(default = "default_dump_interval")]
    pub dump_interval_secs: f64,
    #[serde(default = "default_jitter")]
    pub jitter_secs: f64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_request_interval() -> f64 {
    1.0
}

fn default_dump_interval() -> f64 {
    5.0
}

fn default_jitter() -> f64 {
    0.5
}

fn default_user_agent() -> String {
    format!("keiba-db/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            request_interval_secs: default_request_interval(),
            dump_interval_secs: default_dump_interval(),
            jitter_secs: default_jitter(),
            user_agent: default_user_agent(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub netkeiba: NetkeibaConfig,
    #[serde(default)]
    pub path: PathConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
}

impl AppConfig {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(config::File::with_name("config").required(false))
    }

    fn load_from<S>(file: S) -> anyhow::Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(file)
            // Override with environment variables (KEIBA__NETKEIBA__EMAIL, etc.)
            .add_source(
                config::Environment::with_prefix("KEIBA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    #[test]
    fn test_defaults() {
        let config = AppConfig::load_from(File::from_str("", FileFormat::Toml)).unwrap();

        assert_eq!(config.netkeiba.db_url, "https://db.netkeiba.com");
        assert_eq!(config.netkeiba.login_url, "https://regist.netkeiba.com/account/");
        assert_eq!(config.path.database(), PathBuf::from("data/race.db"));
        assert_eq!(config.path.race_list(), PathBuf::from("data/race_list.txt"));
        assert_eq!(config.crawl.request_interval_secs, 1.0);
        assert_eq!(config.crawl.dump_interval_secs, 5.0);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let toml = r#"
            [netkeiba]
            email = "someone@example.com"
            password = "secret"

            [path]
            data_dir = "/var/lib/keiba"

            [crawl]
            dump_interval_secs = 10.0
        "#;
        let config = AppConfig::load_from(File::from_str(toml, FileFormat::Toml)).unwrap();

        assert_eq!(config.netkeiba.email, "someone@example.com");
        assert_eq!(config.netkeiba.db_url, "https://db.netkeiba.com");
        assert_eq!(config.path.database(), PathBuf::from("/var/lib/keiba/race.db"));
        assert_eq!(config.crawl.dump_interval_secs, 10.0);
        assert_eq!(config.crawl.request_interval_secs, 1.0);
    }
}
