//! # kline-core
//!
//! Базовые типы и конвейер нормализации для kline-convert / kline-server.
//!
//! Этот крейт содержит:
//!
//! - [`decode`] — декодирование выгрузки (GBK и др.) в строки
//! - [`parser`] — разбор заголовка и строк данных в [`InstrumentRecord`]
//! - [`format`] — JSON-формат каталога (`{code}.json`, `stocks.json`)
//! - [`snapshot`] — бинарный снапшот локального кэша (версия + postcard payload)
//! - [`store`] — хранилища: каталог JSON и локальный кэш
//! - [`types`] — доменные типы
//! - [`error`] — типы ошибок `kline-core`
//!
//! ## Быстрый пример: разбор выгрузки
//!
//! ```rust
//! use kline_core::parser::{parse_record, ParseOptions};
//!
//! let lines = [
//!     "SH600000 PUFA_BANK X",
//!     "date,open,high,low,close,volume",
//!     "2024-01-02,10.1,10.5,10.0,10.3,15000",
//! ];
//! let rec = parse_record(&lines, &ParseOptions::default(), None).unwrap();
//! assert_eq!(rec.code, "600000");
//! assert_eq!(rec.name, "PUFA_BANK");
//! assert_eq!(rec.series[0].volume, 15000);
//! ```
//!
//! ## Пример: JSON-формат
//!
//! ```rust
//! use kline_core::format::{record_from_json, record_to_json};
//! use kline_core::{Bar, InstrumentRecord};
//!
//! let rec = InstrumentRecord {
//!     code: "600000".to_string(),
//!     name: "PUFA_BANK".to_string(),
//!     series: vec![Bar {
//!         date: "2024-01-02".to_string(),
//!         open: 10.1,
//!         high: 10.5,
//!         low: 10.0,
//!         close: 10.3,
//!         volume: 15000,
//!     }],
//! };
//!
//! let json = record_to_json(&rec).unwrap();
//! assert!(json.contains(r#"["2024-01-02",10.1,10.5,10.0,10.3,15000]"#));
//! assert_eq!(record_from_json(&json).unwrap(), rec);
//! ```
//!
//! ## Дизайн
//!
//! `kline-core` не знает ни про HTTP, ни про потоки: только чистые типы,
//! разбор/сериализация и файловые хранилища. Каждый файл выгрузки
//! обрабатывается независимо, общего изменяемого состояния нет.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Декодирование байтов выгрузки в строки.
pub mod decode;

/// Разбор и нормализация выгрузки.
pub mod parser;

/// JSON-формат каталога.
pub mod format;

/// Бинарный снапшот кэша.
pub mod snapshot;

/// Хранилища записей.
pub mod store;

/// Доменные типы (бар, инструмент).
pub mod types;

/// Ошибки `kline-core`.
pub mod error;

/// Общие константы
mod constants;
pub use constants::{DEFAULT_ENCODING, LIST_FILE_NAME, MARKET_PREFIXES, MIN_LINES, SOURCE_EXTENSION};

// --- Re-exports (публичный фасад API) ---

pub use crate::error::{
    ConvertError, DecodeError, KlineCoreError, MalformedFileError, SnapshotError, StoreError,
};
pub use crate::parser::{HeaderLayout, ParseOptions, RowPolicy, decode_file};
pub use crate::store::{CacheStore, InstrumentStore, JsonDirStore};
pub use crate::types::{Bar, CacheStats, InstrumentListEntry, InstrumentRecord};
