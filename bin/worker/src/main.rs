use greenhouse_actuation::NatsPublisher;
use greenhouse_core::CropState;
use greenhouse_engine::{EngineClient, Processor};
use greenhouse_telemetry::InfluxSensorStore;
use greenhouse_worker::config::WorkerConfig;
use greenhouse_worker::error::WorkerError;
use greenhouse_worker::handlers::{HandlerDeps, register_handlers};
use greenhouse_worker::http;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,greenhouse=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "worker stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), WorkerError> {
    // Load configuration from file and environment
    let config = WorkerConfig::load()?;
    tracing::info!(
        engine = %config.engine.url,
        worker_id = %config.engine.worker_id,
        "Loaded configuration"
    );

    let engine = EngineClient::new(config.engine.client_config()).map_err(|e| {
        WorkerError::EngineSetup {
            details: e.to_string(),
        }
    })?;

    let store = InfluxSensorStore::new(&config.telemetry.influx_config());

    // A broker that cannot be reached at startup is fatal
    let publisher = Arc::new(
        NatsPublisher::connect(&config.broker.nats_config())
            .await
            .map_err(|e| WorkerError::BrokerConnect {
                details: e.to_string(),
            })?,
    );

    let state = CropState::default();
    let deps = HandlerDeps {
        store: Arc::new(store),
        publisher: publisher.clone(),
        state: state.clone(),
        template: config.telemetry.query_template(),
        subject: config.broker.subject.clone(),
        pump: config.pump.clone(),
    };

    let mut processor = Processor::new(Arc::new(engine), config.engine.processor_options());
    register_handlers(&mut processor, &deps);
    tracing::info!(topics = ?processor.topics(), "Processor started");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let signal_tx = Arc::clone(&shutdown_tx);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown requested"),
            Err(e) => tracing::warn!(error = %e, "Failed to listen for ctrl-c, shutting down"),
        }
        let _ = signal_tx.send(true);
    });

    // A failed HTTP server takes the processor down with it
    let http_tx = Arc::clone(&shutdown_tx);
    let http_rx = shutdown_rx.clone();
    let serving = async move {
        let result = http::serve(config.http.port, &config.http.static_dir, http_rx).await;
        if result.is_err() {
            let _ = http_tx.send(true);
        }
        result
    };

    let (_, served) = tokio::join!(processor.run(shutdown_rx), serving);

    if let Err(e) = publisher.close().await {
        tracing::warn!(error = %e, "Failed to flush broker connection");
    }
    tracing::info!(snapshot = ?state.snapshot(), "Worker stopped");

    served?;
    Ok(())
}
