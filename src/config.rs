use std::env;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, ensure};

use crate::hovercard::HoverCardConfig;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CATALOG_PATH: &str = "catalog.yaml";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_ACTIVATE_DELAY_MS: u64 = 250;
pub const DEFAULT_DEACTIVATE_DELAY_MS: u64 = 100;
pub const DEFAULT_FILE_LOG_FILTER: &str = "debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl Display for Protocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(anyhow!(
                "invalid MARQUEE_PROTOCOL `{other}`; expected `http` or `https`"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLogSettings {
    pub dir: PathBuf,
    pub filter: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub protocol: Protocol,
    pub catalog_path: PathBuf,
    pub api_base_url: String,
    pub activate_delay_ms: u64,
    pub deactivate_delay_ms: u64,
    pub file_log: Option<FileLogSettings>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        // Load .env if present, but do not fail if file does not exist.
        let _ = dotenvy::dotenv();

        let host = env::var("MARQUEE_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_owned());
        ensure!(!host.trim().is_empty(), "MARQUEE_HOST cannot be empty");

        let port = parse_env("MARQUEE_PORT", DEFAULT_PORT)?;

        let protocol = env::var("MARQUEE_PROTOCOL")
            .unwrap_or_else(|_| Protocol::Http.as_str().to_owned())
            .parse::<Protocol>()
            .context("failed to parse MARQUEE_PROTOCOL")?;

        let catalog_path = PathBuf::from(
            env::var("MARQUEE_CATALOG").unwrap_or_else(|_| DEFAULT_CATALOG_PATH.to_owned()),
        );
        ensure!(
            !catalog_path.as_os_str().is_empty(),
            "MARQUEE_CATALOG cannot be empty"
        );

        let api_base_url =
            env::var("MARQUEE_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_owned());
        ensure!(
            !api_base_url.trim().is_empty(),
            "MARQUEE_API_BASE_URL cannot be empty"
        );

        let activate_delay_ms =
            parse_env("HOVERCARD_ACTIVATE_DELAY_MS", DEFAULT_ACTIVATE_DELAY_MS)?;
        let deactivate_delay_ms =
            parse_env("HOVERCARD_DEACTIVATE_DELAY_MS", DEFAULT_DEACTIVATE_DELAY_MS)?;

        let file_log = read_optional_env("MARQUEE_LOG_DIR").map(|dir| FileLogSettings {
            dir: PathBuf::from(dir),
            filter: read_optional_env("MARQUEE_FILE_LOG")
                .unwrap_or_else(|| DEFAULT_FILE_LOG_FILTER.to_owned()),
        });

        Ok(Self {
            host,
            port,
            protocol,
            catalog_path,
            api_base_url,
            activate_delay_ms,
            deactivate_delay_ms,
            file_log,
        })
    }

    pub fn hover_card_config(&self) -> HoverCardConfig {
        HoverCardConfig {
            activate_delay: Duration::from_millis(self.activate_delay_ms),
            deactivate_delay: Duration::from_millis(self.deactivate_delay_ms),
        }
    }

    pub fn bind_address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

fn read_optional_env(name: &str) -> Option<String> {
    env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    })
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("failed to parse {name}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{DEFAULT_PORT, Protocol, Settings};

    #[test]
    fn protocol_parses_case_insensitively() {
        assert_eq!(" HTTPS ".parse::<Protocol>().ok(), Some(Protocol::Https));
        assert_eq!("http".parse::<Protocol>().ok(), Some(Protocol::Http));
        let error = "ftp".parse::<Protocol>().expect_err("ftp is not supported");
        assert!(error.to_string().contains("MARQUEE_PROTOCOL"));
    }

    fn settings(host: &str) -> Settings {
        Settings {
            host: host.to_owned(),
            port: DEFAULT_PORT,
            protocol: Protocol::Http,
            catalog_path: "catalog.yaml".into(),
            api_base_url: "http://localhost:3000".to_owned(),
            activate_delay_ms: 300,
            deactivate_delay_ms: 50,
            file_log: None,
        }
    }

    #[test]
    fn bind_address_brackets_ipv6_hosts() {
        assert_eq!(settings("0.0.0.0").bind_address(), "0.0.0.0:3000");
        assert_eq!(settings("::").bind_address(), "[::]:3000");
    }

    #[test]
    fn hover_card_config_uses_configured_delays() {
        let config = settings("0.0.0.0").hover_card_config();
        assert_eq!(config.activate_delay, Duration::from_millis(300));
        assert_eq!(config.deactivate_delay, Duration::from_millis(50));
    }
}
