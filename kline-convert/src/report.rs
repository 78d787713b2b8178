use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use kline_core::{InstrumentListEntry, InstrumentRecord, JsonDirStore, KlineCoreError, StoreError};
use log::warn;
use thiserror::Error;

use crate::batch::Decoded;

/// Почему файл не попал в каталог
#[derive(Debug, Error)]
pub(crate) enum FileError {
    #[error(transparent)]
    Core(#[from] KlineCoreError),

    /// Два файла дали один и тот же код (например SH000001 и SZ000001)
    #[error("duplicate code {code}, already taken by {first:?}")]
    DuplicateCode { code: String, first: PathBuf },
}

#[derive(Debug)]
pub(crate) struct FileFailure {
    pub(crate) file: PathBuf,
    pub(crate) error: FileError,
}

/// Итог пакетной конвертации
#[derive(Debug, Default)]
pub(crate) struct BatchReport {
    pub(crate) converted: Vec<InstrumentRecord>,
    pub(crate) failures: Vec<FileFailure>,
    /// не обработаны из-за Ctrl+C
    pub(crate) interrupted: usize,
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "converted={} failed={} interrupted={}",
            self.converted.len(),
            self.failures.len(),
            self.interrupted
        )
    }
}

impl BatchReport {
    pub(crate) fn entries(&self) -> Vec<InstrumentListEntry> {
        self.converted.iter().map(InstrumentRecord::list_entry).collect()
    }

    fn fail(&mut self, file: PathBuf, error: FileError) {
        warn!("skipped {}: {error}", file.display());
        self.failures.push(FileFailure { file, error });
    }
}

/// Пишет `{code}.json` для каждого удачного файла (в порядке файлов) и `stocks.json`.
///
/// Ошибки отдельных файлов уходят в отчёт; ошибка записи `stocks.json` фатальна.
pub(crate) fn write_outputs(
    store: &JsonDirStore,
    decoded: Vec<Decoded>,
    total_files: usize,
) -> Result<BatchReport, StoreError> {
    let mut report = BatchReport {
        interrupted: total_files.saturating_sub(decoded.len()),
        ..BatchReport::default()
    };
    let mut taken: HashMap<String, PathBuf> = HashMap::new();

    for (file, res) in decoded {
        let rec = match res {
            Ok(rec) => rec,
            Err(e) => {
                report.failures.push(FileFailure {
                    file,
                    error: KlineCoreError::from(e).into(),
                });
                continue;
            }
        };

        if let Some(first) = taken.get(&rec.code) {
            let error = FileError::DuplicateCode {
                code: rec.code.clone(),
                first: first.clone(),
            };
            report.fail(file, error);
            continue;
        }

        if let Err(e) = store.write_record(&rec) {
            report.fail(file, KlineCoreError::from(e).into());
            continue;
        }

        taken.insert(rec.code.clone(), file);
        report.converted.push(rec);
    }

    store.write_list(&report.entries())?;
    Ok(report)
}

/// Суммарный размер файлов в каталоге (рекурсивно)
pub(crate) fn dir_size(path: &Path) -> io::Result<u64> {
    let mut total = 0;
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let md = entry.metadata()?;
        total += if md.is_dir() {
            dir_size(&entry.path())?
        } else {
            md.len()
        };
    }
    Ok(total)
}
