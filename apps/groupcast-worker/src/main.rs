//! Groupcast worker: mirrors directory group membership into the downstream
//! access-control service, driven by Kafka events.

mod config;
mod handler;
mod logging;
mod sink;

use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

use groupcast_core::ports::DirectoryPort;
use groupcast_core::{Crawler, MirrorPort, Propagator};
use groupcast_directory::DirectoryClient;
use groupcast_events::{Dispatcher, EventConsumer, EventProducer};
use groupcast_mirror::MirrorClient;

use config::{Config, ExemptGroup};
use handler::{PropagateGroupHandler, RefreshAllHandler};
use sink::ProducerSink;

const SERVICE_NAME: &str = "groupcast-worker";

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.worker.log_filter);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        namespace = %config.worker.directory_namespace,
        "Starting groupcast worker"
    );

    let http = match reqwest::Client::builder()
        .timeout(config.worker.http_timeout)
        .user_agent(concat!("groupcast-worker/", env!("CARGO_PKG_VERSION")))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Failed to build HTTP client");
            std::process::exit(1);
        }
    };

    let directory = Arc::new(DirectoryClient::new(
        http.clone(),
        config.worker.directory_base_url.clone(),
        config.worker.directory_user.clone(),
    ));
    let mirror = Arc::new(MirrorClient::new(
        http,
        config.worker.mirror_base_url.clone(),
        config.worker.mirror_user.clone(),
    ));

    // Fail fast when either side is unreachable; a worker that cannot talk
    // to both services would only churn through redeliveries.
    if let Err(e) = directory.check().await {
        error!(error = %e, "Directory service status check failed");
        std::process::exit(1);
    }
    info!("Directory service reachable");

    if let Err(e) = mirror.check().await {
        error!(error = %e, "Mirror service status check failed");
        std::process::exit(1);
    }
    info!("Mirror service reachable");

    let exempt_group_id = match &config.worker.exempt_group {
        ExemptGroup::Id(id) => id.clone(),
        ExemptGroup::Name(name) => match directory.group_by_name(name).await {
            Ok(group) => {
                info!(name = %name, id = %group.id, "Resolved exempt group id");
                group.id
            }
            Err(e) => {
                error!(name = %name, error = %e, "Failed resolving exempt group");
                std::process::exit(1);
            }
        },
    };

    let producer = match EventProducer::new(&config.kafka) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            error!(error = %e, "Failed to create event producer");
            std::process::exit(1);
        }
    };

    match producer.health_check() {
        Ok(status) if status.is_healthy() => {
            info!(brokers = status.brokers, "Broker reachable");
        }
        Ok(status) => {
            error!(brokers = status.brokers, "Broker metadata reports no brokers");
            std::process::exit(1);
        }
        Err(e) => {
            error!(error = %e, "Broker health check failed");
            std::process::exit(1);
        }
    }

    let propagator = Arc::new(Propagator::new(
        directory.clone(),
        mirror.clone(),
        config.worker.mirror_group_prefix.clone(),
        exempt_group_id.clone(),
    ));
    let crawler = Arc::new(Crawler::new(
        directory,
        Arc::new(ProducerSink::new(producer.clone())),
        config.worker.directory_namespace.clone(),
        exempt_group_id,
    ));

    let dispatcher = Dispatcher::new()
        .on(PropagateGroupHandler::new(propagator))
        .on(RefreshAllHandler::new(crawler));

    let consumer = match EventConsumer::new(&config.kafka, SERVICE_NAME) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Failed to create event consumer");
            std::process::exit(1);
        }
    };

    tokio::select! {
        result = consumer.run(dispatcher) => {
            match result {
                Ok(()) => info!("Consumer stopped"),
                Err(e) => error!(error = %e, "Consumer failed"),
            }
        }
        () = shutdown_signal() => {
            info!("Shutdown signal received, stopping");
        }
    }

    if let Err(e) = producer.flush(Duration::from_secs(5)) {
        error!(error = %e, "Failed flushing producer during shutdown");
    }
    info!("Groupcast worker stopped");
}

/// Completes on SIGINT or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
