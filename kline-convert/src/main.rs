//! Точка входа `kline-convert`.
//!
//! Жизненный цикл:
//! - парсинг CLI и проверка кодировки
//! - поиск `*.txt` в исходном каталоге
//! - параллельное декодирование пулом потоков (файлы независимы)
//! - запись `{code}.json` и `stocks.json`, опционально снапшот кэша
//! - итоговый отчёт; `Ctrl+C` останавливает выдачу новых файлов

mod batch;
mod cli;
mod report;

use std::sync::{Arc, atomic::AtomicBool, atomic::Ordering};

use anyhow::Context;
use clap::Parser;
use kline_core::{CacheStore, JsonDirStore};
use log::{info, warn};

fn main() -> anyhow::Result<()> {
    // Логи через RUST_LOG, по умолчанию info
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let shutdown = Arc::new(AtomicBool::new(false));

    // Ctrl+C => ставим shutdown=true
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Relaxed);
            info!("shutting down, finishing files in progress...");
        })?;
    }

    let args = cli::Args::parse();
    args.validate()?;

    let opts = args.parse_options();
    let workers = args.worker_count();

    let files = batch::collect_source_files(&args.source)
        .with_context(|| format!("read source directory {:?}", args.source))?;

    info!(
        "Starting kline-convert: source={:?}, target={:?}, files={}, encoding={}, header_layout={}, row_policy={}, workers={}",
        args.source,
        args.target,
        files.len(),
        opts.encoding,
        opts.header_layout,
        opts.row_policy,
        workers
    );

    let store = JsonDirStore::create(&args.target)
        .with_context(|| format!("create target directory {:?}", args.target))?;

    let total = files.len();
    let decoded = batch::decode_all(files, &opts, workers, &shutdown);

    let report = report::write_outputs(&store, decoded, total)
        .with_context(|| format!("write {:?}", store.list_path()))?;

    if let Some(path) = &args.snapshot {
        let cache = CacheStore::open(path)
            .with_context(|| format!("open cache snapshot {:?}", path))?;
        cache
            .save_many(report.converted.iter().cloned())
            .with_context(|| format!("write cache snapshot {:?}", path))?;
        info!("cache snapshot: {} ({} stocks)", path.display(), cache.stats().stock_count);
    }

    info!("conversion finished: {report}");
    for f in &report.failures {
        info!("  failed: {} ({})", f.file.display(), f.error);
    }
    info!("stock list: {}", store.list_path().display());
    info!("data directory: {}", store.root().display());

    match report::dir_size(store.root()) {
        Ok(bytes) => info!("total size: {:.2} MB", bytes as f64 / 1024.0 / 1024.0),
        Err(e) => warn!("failed to compute output size: {e}"),
    }

    Ok(())
}
