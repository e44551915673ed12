mod config;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wanaku_discovery::{
    HttpRegistryTransport, LoggingCallback, RegistrationManager, TokenSource,
};

use crate::config::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let target = cli.target();
    tracing::info!(service = %target.service_name, address = %target.address(), "starting wanaku agent");

    let client = reqwest::Client::new();
    let tokens = Arc::new(TokenSource::connect(&cli.auth(), client.clone()).await?);
    let transport = HttpRegistryTransport::new(client, &cli.discovery(), tokens);

    let manager = RegistrationManager::new(target, cli.registration(), Arc::new(transport))?;
    manager.add_callback(Arc::new(LoggingCallback));
    manager.start().await?;

    let outcome = tokio::select! {
        _ = shutdown_signal() => Ok(()),
        result = manager.stopped() => result,
    };

    manager.deregister().await;
    if let Err(e) = outcome {
        tracing::error!(error = %e, "registration stopped, exiting");
        return Err(e.into());
    }
    tracing::info!("wanaku agent stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("signal received, deregistering");
}
