//! crypto-sheets-api server entry point.
use std::{net::IpAddr, process::ExitCode, time::Duration};

use clap::Parser;
use crypto_sheets_api::{
    config::{LogFormat, ProxyConfig, DEFAULT_COINGECKO_URL, DEFAULT_PORT, DEFAULT_ROOT_KEY},
    router, AppState,
};
use tokio::net::TcpListener;
use tracing::{error, info};

/// Serve JSON APIs as XML or plain text for spreadsheet import functions.
#[derive(Parser, Debug)]
#[command(name = "crypto-sheets-api")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to bind to
    #[arg(
        short = 'b',
        long = "bind",
        value_name = "ADDR",
        env = "PROXY_BIND",
        default_value = "0.0.0.0"
    )]
    bind: IpAddr,

    /// Port to listen on
    #[arg(
        short = 'p',
        long = "port",
        value_name = "PORT",
        env = "PORT",
        default_value_t = DEFAULT_PORT
    )]
    port: u16,

    /// Base URL for /coingecko/ routes
    #[arg(
        long = "coingecko-url",
        value_name = "URL",
        env = "COINGECKO_URL",
        default_value = DEFAULT_COINGECKO_URL
    )]
    coingecko_url: String,

    /// Tag of the XML root element
    #[arg(
        long = "root-key",
        value_name = "TAG",
        env = "PROXY_ROOT_KEY",
        default_value = DEFAULT_ROOT_KEY
    )]
    root_key: String,

    /// Upstream request timeout in seconds
    #[arg(
        long = "timeout-secs",
        value_name = "SECS",
        env = "PROXY_UPSTREAM_TIMEOUT"
    )]
    timeout_secs: Option<u64>,

    /// Log level: trace, debug, info, warn, error
    #[arg(
        short = 'l',
        long = "log-level",
        value_name = "LEVEL",
        env = "PROXY_LOG_LEVEL",
        default_value = "info"
    )]
    log_level: String,

    /// Log format
    #[arg(
        long = "log-format",
        value_name = "FORMAT",
        env = "PROXY_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty
    )]
    log_format: LogFormat,
}

impl Cli {
    fn into_config(self) -> ProxyConfig {
        let mut config = ProxyConfig {
            bind: self.bind,
            port: self.port,
            coingecko_url: self.coingecko_url,
            root_key: self.root_key,
            upstream_timeout: self.timeout_secs.map(Duration::from_secs),
            ..Default::default()
        };
        config.logging.level = self.log_level;
        config.logging.format = self.log_format;
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Cli::parse().into_config();
    init_logging(&config);

    let state = match AppState::new(config) {
        Ok(state) => state,
        Err(err) => {
            error!("invalid configuration: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let addr = state.config.listen_addr();
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(%addr, "failed to bind: {}", err);
            return ExitCode::FAILURE;
        }
    };

    info!(
        %addr,
        coingecko_url = %state.coingecko_url,
        root_key = %state.config.root_key,
        "crypto-sheets-api listening"
    );

    if let Err(err) = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("server error: {}", err);
        return ExitCode::FAILURE;
    }

    info!("shut down");
    ExitCode::SUCCESS
}

fn init_logging(config: &ProxyConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}
