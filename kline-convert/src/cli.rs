use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use kline_core::decode::resolve_encoding;
use kline_core::{DEFAULT_ENCODING, HeaderLayout, ParseOptions, RowPolicy};

/// kline-convert - переводит выгрузки котировок (*.txt, GBK) в JSON-каталог.
///
/// На выходе: `{code}.json` на каждый инструмент и общий `stocks.json`.
/// Битые файлы пропускаются и попадают в итоговый отчёт.
#[derive(Parser, Debug, Clone)]
#[command(name = "kline-convert", version, about)]
pub(crate) struct Args {
    /// Каталог с исходными *.txt
    #[arg(long)]
    pub(crate) source: PathBuf,

    /// Каталог для JSON (создаётся при необходимости)
    #[arg(long, default_value = "public/export")]
    pub(crate) target: PathBuf,

    /// Кодировка исходных файлов (метка WHATWG: gbk, gb18030, utf-8, ...)
    #[arg(long, default_value = DEFAULT_ENCODING)]
    pub(crate) encoding: String,

    /// Раскладка первой строки: code-name или three-token
    #[arg(long, default_value = "code-name")]
    pub(crate) header_layout: HeaderLayout,

    /// Политика отбраковки строк: lenient или strict
    #[arg(long, default_value = "lenient")]
    pub(crate) row_policy: RowPolicy,

    /// Число рабочих потоков (по умолчанию — число ядер)
    #[arg(long)]
    pub(crate) workers: Option<NonZeroUsize>,

    /// Дополнительно сохранить результат в бинарный снапшот кэша
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
}

impl Args {
    /// Валидация аргументов (каталоги/файлы существуют и т.д.)
    pub(crate) fn validate(&self) -> Result<()> {
        let md = std::fs::metadata(&self.source)
            .with_context(|| format!("source directory not found: {:?}", self.source))?;
        if !md.is_dir() {
            bail!("--source must point to a directory: {:?}", self.source);
        }

        if self.target.exists() && !self.target.is_dir() {
            bail!("--target exists and is not a directory: {:?}", self.target);
        }

        resolve_encoding(&self.encoding).context("--encoding")?;

        if let Some(path) = &self.snapshot {
            if path.is_dir() {
                bail!("--snapshot must point to a file: {:?}", path);
            }
        }

        Ok(())
    }

    pub(crate) fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            encoding: self.encoding.trim().to_string(),
            header_layout: self.header_layout,
            row_policy: self.row_policy,
        }
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.workers
            .or_else(|| std::thread::available_parallelism().ok())
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_converter() {
        let args = Args::try_parse_from(["kline-convert", "--source", "in"]).unwrap();
        assert_eq!(args.target, PathBuf::from("public/export"));
        assert_eq!(args.parse_options(), ParseOptions::default());
        assert!(args.worker_count() >= 1);
    }

    #[test]
    fn layout_and_policy_are_parsed() {
        let args = Args::try_parse_from([
            "kline-convert",
            "--source",
            "in",
            "--header-layout",
            "three-token",
            "--row-policy",
            "strict",
            "--workers",
            "3",
        ])
        .unwrap();

        let opts = args.parse_options();
        assert_eq!(opts.header_layout, HeaderLayout::ThreeToken);
        assert_eq!(opts.row_policy, RowPolicy::Strict);
        assert_eq!(args.worker_count(), 3);
    }

    #[test]
    fn bad_layout_and_zero_workers_are_rejected() {
        assert!(
            Args::try_parse_from(["kline-convert", "--source", "in", "--header-layout", "regex"])
                .is_err()
        );
        assert!(Args::try_parse_from(["kline-convert", "--source", "in", "--workers", "0"]).is_err());
    }

    #[test]
    fn validate_rejects_unknown_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().to_str().unwrap();

        let args =
            Args::try_parse_from(["kline-convert", "--source", src, "--encoding", "klingon"]).unwrap();
        let err = args.validate().unwrap_err();
        assert!(format!("{err:#}").contains("klingon"), "{err:#}");

        let args =
            Args::try_parse_from(["kline-convert", "--source", src, "--encoding", "GB18030"]).unwrap();
        assert!(args.validate().is_ok());
    }

    #[test]
    fn validate_requires_existing_source_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let args = Args::try_parse_from(["kline-convert", "--source", missing.to_str().unwrap()])
            .unwrap();
        assert!(args.validate().is_err());

        let args = Args::try_parse_from([
            "kline-convert",
            "--source",
            dir.path().to_str().unwrap(),
            "--target",
            dir.path().join("out").to_str().unwrap(),
        ])
        .unwrap();
        assert!(args.validate().is_ok());
    }
}
