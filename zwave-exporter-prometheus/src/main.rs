//! Prometheus exporter for Z-Wave JS readings.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};

use zwave_common::init_tracing;
use zwave_exporter_prometheus::{
    ConfigOverrides, ExporterConfig, HttpServer, MessageProcessor, MetricRegistry, MqttSubscriber,
};

/// Prometheus exporter for Z-Wave JS readings published over MQTT.
#[derive(Parser, Debug)]
#[command(name = "zwave-exporter-prometheus")]
#[command(about = "Export Z-Wave JS MQTT readings as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<String>,

    /// HTTP listen address (overrides config).
    #[arg(long)]
    listen: Option<String>,

    /// MQTT broker address, e.g. tcp://mosquitto:1883.
    #[arg(long, env = "MOSQUITTO_BROKER")]
    broker: Option<String>,

    /// MQTT client identifier.
    #[arg(long, env = "MOSQUITTO_CLIENT_ID")]
    client_id: Option<String>,

    /// MQTT username.
    #[arg(long, env = "MOSQUITTO_USERNAME")]
    username: Option<String>,

    /// MQTT password.
    #[arg(long, env = "MOSQUITTO_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            broker: self.broker.clone(),
            client_id: self.client_id.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            listen: self.listen.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

async fn wait_for_sigterm() {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Couldn't install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        ExporterConfig::read_file(config_path)?
    } else {
        ExporterConfig::default()
    };
    config.apply_overrides(args.overrides());

    init_tracing(&config.logging)?;

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    info!("Starting Z-Wave Prometheus Exporter");

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let registry = Arc::new(MetricRegistry::new());
    let processor = Arc::new(MessageProcessor::new(registry.clone()));

    let listen_addr = config
        .prometheus
        .listen
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

    // Create components
    let subscriber = MqttSubscriber::new(processor.clone(), config.mqtt.clone());
    let http_server = HttpServer::new(
        registry.clone(),
        subscriber.state(),
        listen_addr,
        config.prometheus.path.clone(),
    );

    // Start subscriber
    let subscriber_shutdown = shutdown_rx.clone();
    let subscriber_task = tokio::spawn(async move {
        if let Err(e) = subscriber.run(subscriber_shutdown).await {
            error!("Subscriber error: {:#}", e);
        }
    });

    // Start HTTP server
    let http_shutdown = shutdown_rx.clone();
    let mut http_task = tokio::spawn(async move {
        if let Err(e) = http_server.run(http_shutdown).await {
            error!("HTTP server error: {:#}", e);
            return Err(e);
        }
        Ok(())
    });

    // A failed subscriber leaves the endpoint up with a frozen heartbeat;
    // only a signal or the HTTP server going away stops the process.
    let mut failed = false;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = wait_for_sigterm() => {
            info!("Received SIGTERM, shutting down...");
        }
        result = &mut http_task => {
            failed = !matches!(result, Ok(Ok(())));
        }
    }

    // Receivers may already be gone if both tasks ended.
    let _ = shutdown_tx.send(true);

    // Wait for tasks to complete
    let _ = tokio::time::timeout(Duration::from_secs(5), async {
        let _ = subscriber_task.await;
        if !http_task.is_finished() {
            let _ = (&mut http_task).await;
        }
    })
    .await;

    let stats = processor.stats();
    info!(
        messages_received = stats.messages_received,
        readings_recorded = stats.readings_recorded,
        unknown_readings = stats.unknown_readings,
        unmatched_topics = stats.unmatched_topics,
        decode_errors = stats.decode_errors,
        series_count = registry.series_count(),
        "Final statistics"
    );

    info!("Exporter stopped");

    if failed {
        anyhow::bail!("exporter stopped after a component failure");
    }
    Ok(())
}
