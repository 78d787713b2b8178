use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use kline_core::{ConvertError, InstrumentRecord, ParseOptions, SOURCE_EXTENSION, decode_file};
use log::{debug, warn};

/// Результат обработки одного файла
pub(crate) type Decoded = (PathBuf, Result<InstrumentRecord, ConvertError>);

/// Все `*.txt` в каталоге (без рекурсии), отсортированные по имени
pub(crate) fn collect_source_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Декодирует файлы пулом из `workers` потоков.
///
/// Файлы независимы, порядок завершения произвольный, поэтому результат
/// сортируется по пути. После `shutdown` новые файлы не берутся; уже
/// обработанные возвращаются.
pub(crate) fn decode_all(
    files: Vec<PathBuf>,
    opts: &ParseOptions,
    workers: usize,
    shutdown: &AtomicBool,
) -> Vec<Decoded> {
    let workers = workers.max(1);
    let (job_tx, job_rx): (Sender<PathBuf>, Receiver<PathBuf>) =
        crossbeam_channel::bounded(workers * 4);
    let (res_tx, res_rx) = crossbeam_channel::unbounded::<Decoded>();

    let mut out = thread::scope(|s| {
        s.spawn(move || {
            for path in files {
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
                if job_tx.send(path).is_err() {
                    // все воркеры уже вышли
                    break;
                }
            }
        });

        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let res_tx = res_tx.clone();
            s.spawn(move || run_worker(job_rx, res_tx, opts, shutdown));
        }
        drop(job_rx);
        drop(res_tx);

        res_rx.iter().collect::<Vec<_>>()
    });

    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

fn run_worker(
    jobs: Receiver<PathBuf>,
    results: Sender<Decoded>,
    opts: &ParseOptions,
    shutdown: &AtomicBool,
) {
    for path in jobs.iter() {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        debug!("processing {}", path.display());
        let res = decode_file(&path, opts);
        if let Err(e) = &res {
            warn!("skipped {}: {e}", path.display());
        }

        if results.send((path, res)).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kline_core::MalformedFileError;

    fn write_gbk(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        let (bytes, _, _) = encoding_rs::GBK.encode(text);
        std::fs::write(&path, &bytes).unwrap();
        path
    }

    fn good(code: &str) -> String {
        format!(
            "{code} 名称 日线\n日期,开盘,最高,最低,收盘,成交量,成交额\n2024-01-02,10.1,10.5,10.0,10.3,15000,1.0\n2024-01-03,10.3,10.6,10.2,10.4,16000,1.0\n"
        )
    }

    #[test]
    fn collect_source_files_keeps_only_txt_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write_gbk(dir.path(), "SZ000001.txt", "x");
        write_gbk(dir.path(), "SH600000.txt", "x");
        write_gbk(dir.path(), "notes.md", "x");
        write_gbk(dir.path(), "SH600001.TXT.bak", "x");
        std::fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let files = collect_source_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["SH600000.txt", "SZ000001.txt"]);
    }

    #[test]
    fn decode_all_is_per_file_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = vec![
            write_gbk(dir.path(), "SZ000001.txt", &good("SZ000001")),
            write_gbk(dir.path(), "SH600000.txt", &good("SH600000")),
            write_gbk(dir.path(), "SH600001.txt", "SH600001 名称\n日期,开盘\n"),
        ];
        for i in 0..20 {
            let code = format!("SZ3000{i:02}");
            files.push(write_gbk(dir.path(), &format!("{code}.txt"), &good(&code)));
        }

        let shutdown = AtomicBool::new(false);
        let out = decode_all(files, &ParseOptions::default(), 4, &shutdown);

        assert_eq!(out.len(), 23);
        assert!(out.windows(2).all(|w| w[0].0 <= w[1].0));

        let failed: Vec<_> = out.iter().filter(|(_, r)| r.is_err()).collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].0.ends_with("SH600001.txt"));
        assert!(matches!(
            failed[0].1,
            Err(ConvertError::Malformed(MalformedFileError::TooFewLines { .. }))
        ));

        let first_ok = out.iter().find(|(p, _)| p.ends_with("SH600000.txt")).unwrap();
        let rec = first_ok.1.as_ref().unwrap();
        assert_eq!(rec.code, "600000");
        assert_eq!(rec.series.len(), 2);
    }

    #[test]
    fn decode_all_stops_taking_files_after_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![write_gbk(dir.path(), "SH600000.txt", &good("SH600000"))];

        let shutdown = AtomicBool::new(true);
        let out = decode_all(files, &ParseOptions::default(), 2, &shutdown);
        assert!(out.is_empty());
    }

    #[test]
    fn decode_all_with_no_files() {
        let shutdown = AtomicBool::new(false);
        assert!(decode_all(Vec::new(), &ParseOptions::default(), 3, &shutdown).is_empty());
    }
}
