use std::sync::Arc;

use falta_uno_app::{build_application, ports::sweep_observer::LogSweepObserver};
use falta_uno_persistence_sqlite::{create_db_pool, matches::SqliteUnitOfWork};
use log::info;

use crate::config::AppConfig;

mod config;
mod logs;

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received. Preparing graceful exit...");
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    logs::init_logger(&config.log_file_path, &config.log_archive_pattern);

    let unit_of_work = Arc::new(SqliteUnitOfWork::with_pool(create_db_pool(
        &config.database_path,
    )));
    let sweep_observer = Arc::new(LogSweepObserver);

    info!("Starting application");

    let app = build_application(unit_of_work, sweep_observer, config.lifecycle.clone());

    shutdown_signal().await;

    app.shutdown().await;
    info!("Application stopped");
}
