use std::path::PathBuf;

use thiserror::Error;

/// Верхнеуровневый тип ошибок крейта
#[derive(Debug, Error)]
pub enum KlineCoreError {
    /// Ошибки конвертации одного файла
    #[error(transparent)]
    Convert(#[from] ConvertError),

    /// Ошибки хранилища
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Ошибки декодирования байтов в текст
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Неизвестная метка кодировки
    #[error("unknown encoding label: {0}")]
    UnknownEncoding(String),

    /// Байты не валидны в заявленной кодировке
    #[error("malformed byte sequence for encoding {encoding}")]
    Malformed { encoding: &'static str },
}

/// Файл прочитан, но по структуре не годится
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedFileError {
    /// Меньше трёх непустых строк
    #[error("expected at least {expected} non-blank lines, got {got}")]
    TooFewLines { expected: usize, got: usize },

    /// После фильтрации не осталось ни одной строки данных
    #[error("no valid data rows")]
    NoValidRows,

    /// Код из шапки (или имени файла) не годится как имя файла
    #[error("invalid instrument code: {0:?}")]
    InvalidCode(String),
}

/// Ошибка обработки одного исходного файла
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Не удалось прочитать файл
    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Malformed(#[from] MalformedFileError),
}

/// Ошибки бинарного снапшота кэша
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Пустой буфер
    #[error("snapshot too short")]
    TooShort,

    /// Неверная версия формата
    #[error("unsupported snapshot version: {0}")]
    UnsupportedVersion(u8),

    /// Ошибка сериализации/десериализации
    #[error("postcard encode/decode error: {0}")]
    Postcard(#[from] postcard::Error),
}

/// Ошибки хранилища нормализованных данных
#[derive(Debug, Error)]
pub enum StoreError {
    /// Инструмент с таким кодом отсутствует
    #[error("Stock {0} not found")]
    NotFound(String),

    /// Нет файла со списком инструментов
    #[error("Stock data not found")]
    ListMissing,

    #[error("io error on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid json in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
