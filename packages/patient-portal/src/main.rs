use clap::Parser;
use patient_portal::error::Error;
use patient_portal::{cli, connect, http, log, prometheus, Args, Portal, PortalConfig, VERSION};
use std::future::IntoFuture;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match PortalConfig::load(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration Error: {}", err);
            std::process::exit(exitcode::CONFIG);
        }
    };

    log::init(config.log.clone());

    info!(msg = "Patient Portal", version = VERSION);

    match cli::run(&args, &config).await {
        Ok(true) => std::process::exit(exitcode::OK),
        Ok(false) => (),
        Err(err) => {
            error!(msg = "Command failed", error = err.to_string());
            std::process::exit(exitcode::SOFTWARE);
        }
    }

    if config.prometheus_enabled() {
        if let Err(err) = prometheus::start(&config.server.host, config.prometheus.port) {
            error!(
                msg = "Could not start Prometheus exporter",
                error = err.to_string()
            );
            std::process::exit(exitcode::CONFIG);
        }
    }

    let shutdown_timeout = config.server.shutdown_timeout();

    let portal = init(config).await;

    let listener = match connect::bind_with_retry(&portal.config.server).await {
        Ok(listener) => listener,
        Err(_) => std::process::exit(exitcode::CONFIG),
    };

    info!(
        msg = "Patient records available",
        base_url = portal.config.server.base_url()
    );

    let shutdown = CancellationToken::new();
    let server = axum::serve(listener, http::router(portal))
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .into_future();
    let mut server = tokio::spawn(server);

    tokio::select! {
        _ = sigint() => {
            info!(msg = "Received SIGINT");
        },
        _ = sigterm() => {
            info!(msg = "Received SIGTERM");
        },
        result = &mut server => {
            error!(msg = "Server stopped unexpectedly", result = ?result);
            std::process::exit(exitcode::SOFTWARE);
        },
    }

    info!(msg = "Shutting down Patient Portal");

    shutdown.cancel();

    info!(msg = "Waiting for open requests");

    if tokio::time::timeout(shutdown_timeout, server).await.is_err() {
        warn!(msg = "Terminated open requests");
    }
}

///
/// Connect the record store and build the shared portal state
///
async fn init(config: PortalConfig) -> Portal {
    match Portal::init(config).await {
        Ok(portal) => portal,
        Err(err) => {
            error!(
                msg = "Could not start Patient Portal",
                error = err.to_string()
            );
            let code = match err {
                Error::Config(_) | Error::Template(_) => exitcode::CONFIG,
                _ => exitcode::UNAVAILABLE,
            };
            std::process::exit(code);
        }
    }
}

async fn sigint() -> std::io::Result<()> {
    signal(SignalKind::interrupt())?.recv().await;
    Ok(())
}

async fn sigterm() -> std::io::Result<()> {
    signal(SignalKind::terminate())?.recv().await;
    Ok(())
}
