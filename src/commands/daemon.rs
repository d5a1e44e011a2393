use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use hostprobe::config::Config;
use hostprobe::probe::Probe;
use hostprobe::telemetry::discovery::Device;
use hostprobe::telemetry::sink::{HttpPublisher, StdoutPublisher};
use hostprobe::telemetry::{self, Publication, Publisher, Topics};

pub fn run(
    config_path: Option<&Path>,
    interval: Option<u64>,
    sink_url: Option<String>,
    log_level: Option<String>,
) -> Result<()> {
    let mut config = super::load_config(config_path, log_level)?;

    // CLI flags override config values
    if let Some(secs) = interval {
        config.poll_interval_secs = secs;
    }
    if let Some(url) = sink_url {
        config.sink.url = Some(url);
    }
    config.validate()?;

    super::init_tracing(&config.log_level, true);

    // Build tokio runtime explicitly (no #[tokio::main] on fn main)
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(config))
}

async fn serve(config: Config) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "hostprobe daemon starting");

    let probe = Probe::from_config(&config)?;

    match &config.sink.url {
        Some(url) => {
            let publisher = HttpPublisher::new(url, Duration::from_secs(config.sink.timeout_secs))?;
            info!(sink_url = %url, "publishing to HTTP sink");
            publish(&config, &probe, &publisher).await
        }
        None => {
            info!("no sink configured, publishing to stdout");
            publish(&config, &probe, &StdoutPublisher).await
        }
    }
}

async fn publish<P: Publisher>(config: &Config, probe: &Probe, publisher: &P) -> Result<()> {
    let topics = Topics::new(&config.topic_prefix, &probe.facts.hostname);
    let device = Device::new(&probe.facts, &config.device);
    let publication = Publication::new(publisher, &topics, &device);

    tokio::select! {
        _ = telemetry::run_publish_loop(
            &probe.collector,
            publication,
            Duration::from_secs(config.poll_interval_secs),
            Duration::from_secs(config.collect_timeout_secs),
        ) => {},
        _ = shutdown_signal() => {},
    }

    info!("hostprobe daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("Received Ctrl+C, shutting down"); },
        _ = terminate => { info!("Received SIGTERM, shutting down"); },
    }
}
