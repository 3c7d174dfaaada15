// AirQ Publisher - MQTT publisher for simulated sensors
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # AirQ Publisher
//!
//! Streams simulated CO2, PM2.5, temperature and humidity readings to an
//! MQTT broker, one message per sensor per tick.
//!
//! ## Usage
//!
//! ```bash
//! # Publish to a local broker every 20 seconds
//! airq-publisher
//!
//! # Faster ticks on a remote broker, with a Prometheus endpoint
//! airq-publisher --host broker.lan --tick-interval-ms 2000 --metrics-port 9100
//!
//! # Reproducible run from a config file
//! airq-publisher --config airq.json --seed 42
//! ```

mod config;
mod error;
mod metrics;
mod mqtt;
mod publisher;

use airq_sim::Simulator;
use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use clap::Parser;
use config::PublisherConfig;
use error::Result;
use metrics::encode_metrics;
use mqtt::MqttTransport;
use publisher::{LoopSettings, RunSummary};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Grace period for the DISCONNECT packet to leave on shutdown.
const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

/// AirQ sensor simulator publishing over MQTT
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long, env = "AIRQ_CONFIG")]
    config: Option<PathBuf>,

    /// Broker host
    #[arg(long, env = "AIRQ_HOST")]
    host: Option<String>,

    /// Broker port
    #[arg(short, long, env = "AIRQ_PORT")]
    port: Option<u16>,

    /// Topic prefix (topics are <prefix>/<sensor>)
    #[arg(short, long, env = "AIRQ_TOPIC_PREFIX")]
    topic_prefix: Option<String>,

    /// MQTT client identifier
    #[arg(long, env = "AIRQ_CLIENT_ID")]
    client_id: Option<String>,

    /// Delay between ticks in milliseconds
    #[arg(long, env = "AIRQ_TICK_INTERVAL_MS")]
    tick_interval_ms: Option<u64>,

    /// Delay after each published reading in milliseconds
    #[arg(long, env = "AIRQ_PUBLISH_PACING_MS")]
    publish_pacing_ms: Option<u64>,

    /// Random seed for reproducible runs
    #[arg(long, env = "AIRQ_SEED")]
    seed: Option<u64>,

    /// Stop after this many ticks
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Retries per failed publish (0 = drop)
    #[arg(long, env = "AIRQ_RETRIES")]
    retries: Option<u32>,

    /// Serve Prometheus metrics on this port
    #[arg(long, env = "AIRQ_METRICS_PORT")]
    metrics_port: Option<u16>,

    /// Write the resolved configuration to this file and exit
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    /// Resolve the configuration: defaults, then file, then flags.
    fn resolve(&self) -> Result<PublisherConfig> {
        let mut config = match &self.config {
            Some(path) => PublisherConfig::from_json_file(path)?,
            None => PublisherConfig::default(),
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(prefix) = &self.topic_prefix {
            config.topic_prefix = prefix.clone();
        }
        if let Some(client_id) = &self.client_id {
            config.client_id = client_id.clone();
        }
        if let Some(ms) = self.tick_interval_ms {
            config.tick_interval_ms = ms;
        }
        if let Some(ms) = self.publish_pacing_ms {
            config.publish_pacing_ms = ms;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.max_ticks.is_some() {
            config.max_ticks = self.max_ticks;
        }
        if let Some(retries) = self.retries {
            config.retry.max_retries = retries;
        }
        if self.metrics_port.is_some() {
            config.metrics_port = self.metrics_port;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("AirQ Publisher v{}", env!("CARGO_PKG_VERSION"));

    match run(args).await {
        Ok(summary) => {
            info!(
                "Sensors stopped after {} ticks ({} published, {} dropped)",
                summary.ticks, summary.published, summary.failed
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<RunSummary> {
    let config = args.resolve()?;

    if let Some(path) = &args.save_config {
        config.to_json_file(path)?;
        info!("Configuration written to {}", path.display());
        return Ok(RunSummary::default());
    }

    if let Some(port) = config.metrics_port {
        serve_metrics(port).await?;
    }

    let mut transport = MqttTransport::connect(&config).await?;

    let mut sim = match config.seed {
        Some(seed) => {
            info!("Using seed {}", seed);
            Simulator::seeded(seed)
        }
        None => Simulator::from_entropy(),
    };

    let settings = LoopSettings {
        topic_prefix: config.topic_prefix.clone(),
        tick_interval: config.tick_interval(),
        publish_pacing: config.publish_pacing(),
        retry: config.retry.strategy(),
        max_ticks: config.max_ticks,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown requested, stopping sensors");
        shutdown_tx.send(true).ok();
    });

    let summary = publisher::run(&mut sim, &mut transport, &settings, shutdown_rx).await;

    let totals = transport.shutdown(DISCONNECT_GRACE).await;
    info!(
        "MQTT session: {} messages ({} bytes) handed to the client, {} refused",
        totals.messages_sent, totals.bytes_sent, totals.messages_failed
    );
    Ok(summary)
}

/// Bind the metrics endpoint and serve it in the background.
async fn serve_metrics(port: u16) -> Result<()> {
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("Metrics endpoint: http://{}/metrics", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            warn!("Metrics server stopped: {}", e);
        }
    });
    Ok(())
}

/// Metrics handler - returns Prometheus text format.
async fn metrics_handler() -> impl IntoResponse {
    let metrics = encode_metrics();
    (
        StatusCode::OK,
        [("Content-Type", "text/plain; charset=utf-8")],
        metrics,
    )
}

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
