//! Proxy configuration.
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use reqwest::Client;
use url::Url;

use crate::errors::ConfigError;

pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3/";
pub const DEFAULT_ROOT_KEY: &str = "result";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Address to listen on
    pub bind: IpAddr,

    /// Port to listen on
    pub port: u16,

    /// Base URL that `/coingecko/` routes are appended to
    pub coingecko_url: String,

    /// Tag of the XML root element
    pub root_key: String,

    /// Timeout for upstream requests (None for no timeout)
    pub upstream_timeout: Option<Duration>,

    pub logging: LoggingConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            coingecko_url: DEFAULT_COINGECKO_URL.to_string(),
            root_key: DEFAULT_ROOT_KEY.to_string(),
            upstream_timeout: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl ProxyConfig {
    /// Check the configuration, normalizing the CoinGecko base URL so it
    /// ends with a slash.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        self.coingecko_url = self.coingecko_base()?.to_string();

        if self.root_key.trim().is_empty() {
            return Err(ConfigError::EmptyRootKey);
        }

        Ok(self)
    }

    pub fn coingecko_base(&self) -> Result<Url, ConfigError> {
        let mut raw = self.coingecko_url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }

        Url::parse(&raw).map_err(|source| ConfigError::BaseUrl { url: raw, source })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// The HTTP client shared by all upstream requests.
    pub fn build_client(&self) -> Result<Client, ConfigError> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));

        if let Some(timeout) = self.upstream_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(builder.build()?)
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable format
    #[default]
    Pretty,

    /// JSON format
    Json,
}
