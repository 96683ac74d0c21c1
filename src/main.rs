use std::{error::Error, process::ExitCode, sync::Arc};

use clap::Parser;
use libtech::{
    api::{self, AppState},
    cli,
    config::{CliArgs, Command, Config, LoggingConfig},
    Dashboard,
};
use libtech_postgres::PostgresBackend;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Opens the connection up front so a bad configuration shows in the log at
/// startup; the backend still retries on every call.
fn open_backend(config: &Config) -> PostgresBackend {
    let connection_string = config.database.connection_string();
    match PostgresBackend::connect(&connection_string) {
        Ok(backend) => backend,
        Err(e) => {
            tracing::warn!(error = %e, "Starting without a database connection");
            PostgresBackend::new(&connection_string)
        }
    }
}

fn serve(config: Config, dashboard: Arc<Dashboard>) -> Result<(), Box<dyn Error>> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    let addr = config.listen_addr()?;
    let state = Arc::new(AppState {
        dashboard,
        metrics: Some(handle),
    });
    let app = api::router(state, Arc::new(config.auth.clone()));

    if config.auth.enabled {
        tracing::info!(keys = config.auth.api_keys.len(), "API key authentication enabled");
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        tracing::info!(%addr, "LibTech dashboard listening");
        axum::Server::try_bind(&addr)?
            .serve(app.into_make_service())
            .with_graceful_shutdown(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Failed to listen for shutdown signal");
                }
                tracing::info!("Shutting down");
            })
            .await
    })?;
    Ok(())
}

fn run(cli: CliArgs) -> Result<(), Box<dyn Error>> {
    let config = Config::load(&cli);
    init_tracing(&config.logging);

    if config.security.encryption_key.is_empty() {
        tracing::warn!("No encryption key configured; passcodes will be encrypted with an empty key");
    }

    let backend = Arc::new(open_backend(&config));
    let dashboard = Arc::new(Dashboard::new(backend, config.security.encryption_key.clone()));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, dashboard),
        command => {
            print!("{}", cli::execute(command, &dashboard)?);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    match run(CliArgs::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "libtech failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
