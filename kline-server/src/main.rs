//! Точка входа `kline-server`.
//!
//! Жизненный цикл:
//! - парсинг CLI
//! - однократное открытие хранилища (каталог JSON или снапшот кэша)
//! - HTTP: `GET /api/stocks`, `GET /api/stock/{code}`, `GET /api/stock?code=`
//! - корректная остановка по `Ctrl+C`

mod api;
mod cli;
mod config;
mod routes;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Логи через RUST_LOG, по умолчанию info
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Args::parse();
    args.validate()?;

    let store = config::open_store(&args)?;
    let app = routes::router(store);

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("bind HTTP listener {}", args.bind))?;

    info!("kline-server listening on http://{}", args.bind);
    info!("- GET http://{}/api/stocks", args.bind);
    info!("- GET http://{}/api/stock/{{code}}", args.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("kline-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl+C: {e}");
        // без сигнала работаем до убийства процесса
        std::future::pending::<()>().await;
    }
    info!("shutting down...");
}
