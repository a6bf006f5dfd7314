use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ratewarden::config::{ConfigOverrides, RateWardenConfig};
use ratewarden::http::HttpServer;
use ratewarden::ratelimit::{spawn_sweeper, LimitConfig, RateLimiter};

/// Per-client sliding-window rate limiting in front of an HTTP pipeline.
#[derive(Parser, Debug)]
#[command(name = "ratewarden", version, about)]
struct Args {
    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Sliding window length in seconds
    #[arg(long)]
    window_secs: Option<u64>,

    /// Maximum requests per client within one window
    #[arg(long)]
    max_requests: Option<usize>,

    /// Idle key sweep interval in seconds (0 disables sweeping)
    #[arg(long)]
    sweep_interval_secs: Option<u64>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);

    info!("Starting Ratewarden");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let overrides = ConfigOverrides {
        listen_addr: args.listen,
        window_secs: args.window_secs,
        max_requests: args.max_requests,
        sweep_interval_secs: args.sweep_interval_secs,
    };
    let config = RateWardenConfig::load(args.config.as_deref(), &overrides)?;
    info!(
        listen_addr = %config.server.listen_addr,
        window_secs = config.rate_limiting.window_secs,
        max_requests = config.rate_limiting.max_requests,
        "Configuration loaded"
    );

    let rate_limiter = Arc::new(RateLimiter::with_config(LimitConfig::from(
        &config.rate_limiting,
    )));
    info!("Rate limiter initialized");

    let sweeper = match config.rate_limiting.sweep_interval_secs {
        0 => None,
        secs => Some(spawn_sweeper(
            Arc::clone(&rate_limiter),
            Duration::from_secs(secs),
        )),
    };

    let server = HttpServer::new(config.server.listen_addr, rate_limiter);
    server.serve_with_shutdown(shutdown_signal()).await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }

    info!("Ratewarden stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Resolves once the process is asked to stop, letting in-flight requests
/// finish before the listener closes.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(signal = "SIGINT", "Shutting down HTTP server"),
        _ = terminate => info!(signal = "SIGTERM", "Shutting down HTTP server"),
    }
}
