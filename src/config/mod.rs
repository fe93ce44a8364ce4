use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::errors::{RelayError, RelayResult};

const DEFAULT_POLL_SECS: u64 = 60;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SEND_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub proxy_url: String,
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    pub send_timeout: Duration,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Load `.env` from the executable's directory, then the current directory.
    /// Variables that are already set are never overridden.
    pub fn load_dotenv() {
        if let Some(dir) = Self::exe_dir() {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        dotenvy::dotenv().ok();
    }

    pub fn from_env() -> RelayResult<Self> {
        Self::load_dotenv();

        let token = required("TOKEN")?;

        let proxy_url = required("HTTP_PROXY")?;
        Url::parse(&proxy_url)
            .map_err(|e| RelayError::Config(format!("Invalid HTTP proxy URL {}: {}", proxy_url, e)))?;

        Ok(Self {
            token,
            proxy_url,
            poll_interval: seconds("FEEDRELAY_POLL_SECS", DEFAULT_POLL_SECS)?,
            fetch_timeout: seconds("FEEDRELAY_FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?,
            send_timeout: seconds("FEEDRELAY_SEND_TIMEOUT_SECS", DEFAULT_SEND_TIMEOUT_SECS)?,
        })
    }
}

fn required(name: &str) -> RelayResult<String> {
    std::env::var(name).map_err(|_| RelayError::MissingEnvVar(name.to_string()))
}

fn seconds(name: &str, default: u64) -> RelayResult<Duration> {
    match std::env::var(name) {
        Ok(raw) => parse_seconds(name, &raw),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

fn parse_seconds(name: &str, raw: &str) -> RelayResult<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(RelayError::Config(format!("{} must be greater than zero", name))),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => Err(RelayError::Config(format!(
            "{} must be a whole number of seconds, got {:?}",
            name, raw
        ))),
    }
}
