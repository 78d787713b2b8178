use std::sync::Arc;

use anyhow::Context;
use kline_core::{CacheStore, InstrumentStore, JsonDirStore};
use log::{info, warn};

use crate::cli::Args;

pub(crate) const BIND_ADDR: &str = "0.0.0.0:3001";
pub(crate) const DATA_DIR: &str = "public/export";

/// Хранилище, общее для всех обработчиков
pub(crate) type SharedStore = Arc<dyn InstrumentStore>;

/// Открывает хранилище один раз при старте: снапшот кэша или каталог JSON
pub(crate) fn open_store(args: &Args) -> anyhow::Result<SharedStore> {
    match &args.snapshot {
        Some(path) => {
            let cache = CacheStore::open(path)
                .with_context(|| format!("open cache snapshot {:?}", path))?;
            let stats = cache.stats();
            info!(
                "serving from cache snapshot {}: stocks={}, data_points={}",
                path.display(),
                stats.stock_count,
                stats.total_data_points
            );
            Ok(Arc::new(cache))
        }
        None => {
            if !args.data_dir.is_dir() {
                warn!(
                    "data directory {} does not exist yet; requests will return 404",
                    args.data_dir.display()
                );
            }
            info!("serving from data directory {}", args.data_dir.display());
            Ok(Arc::new(JsonDirStore::new(&args.data_dir)))
        }
    }
}
