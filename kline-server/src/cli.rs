use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config;

/// kline-server - отдаёт нормализованные котировки по HTTP (только GET).
#[derive(Parser, Debug, Clone)]
#[command(name = "kline-server", version, about)]
pub(crate) struct Args {
    /// HTTP bind address, например 0.0.0.0:3001
    #[arg(long, default_value = config::BIND_ADDR)]
    pub(crate) bind: SocketAddr,

    /// Каталог с `{code}.json` и `stocks.json` (результат kline-convert)
    #[arg(long, default_value = config::DATA_DIR)]
    pub(crate) data_dir: PathBuf,

    /// Отдавать данные из снапшота кэша вместо каталога
    #[arg(long, conflicts_with = "data_dir")]
    pub(crate) snapshot: Option<PathBuf>,
}

impl Args {
    pub(crate) fn validate(&self) -> anyhow::Result<()> {
        if let Some(path) = &self.snapshot {
            if path.is_dir() {
                anyhow::bail!("--snapshot must point to a file: {:?}", path);
            }
        }
        Ok(())
    }
}
