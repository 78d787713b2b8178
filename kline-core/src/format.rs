//! JSON-формат каталога: `{code}.json` и `stocks.json`.
//!
//! Бары в файле лежат позиционными массивами, чтобы файлы были компактнее:
//! `[date, open, high, low, close, volume]` (0=date, 1=open, 2=high, 3=low, 4=close, 5=volume).

use serde::{Deserialize, Serialize};

use crate::types::{Bar, InstrumentListEntry, InstrumentRecord};

/// Бар в позиционном виде
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarRow(pub String, pub f64, pub f64, pub f64, pub f64, pub u64);

/// Содержимое `{code}.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentFile {
    pub code: String,
    pub name: String,
    pub data: Vec<BarRow>,
}

impl From<&Bar> for BarRow {
    fn from(b: &Bar) -> Self {
        BarRow(b.date.clone(), b.open, b.high, b.low, b.close, b.volume)
    }
}

impl From<BarRow> for Bar {
    fn from(BarRow(date, open, high, low, close, volume): BarRow) -> Self {
        Bar {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl From<&InstrumentRecord> for InstrumentFile {
    fn from(r: &InstrumentRecord) -> Self {
        InstrumentFile {
            code: r.code.clone(),
            name: r.name.clone(),
            data: r.series.iter().map(BarRow::from).collect(),
        }
    }
}

impl From<InstrumentFile> for InstrumentRecord {
    fn from(f: InstrumentFile) -> Self {
        InstrumentRecord {
            code: f.code,
            name: f.name,
            series: f.data.into_iter().map(Bar::from).collect(),
        }
    }
}

/// Компактный JSON для `{code}.json`
pub fn record_to_json(record: &InstrumentRecord) -> serde_json::Result<String> {
    serde_json::to_string(&InstrumentFile::from(record))
}

pub fn record_from_json(s: &str) -> serde_json::Result<InstrumentRecord> {
    let file: InstrumentFile = serde_json::from_str(s)?;
    Ok(file.into())
}

pub fn list_to_json(entries: &[InstrumentListEntry]) -> serde_json::Result<String> {
    serde_json::to_string(entries)
}

pub fn list_from_json(s: &str) -> serde_json::Result<Vec<InstrumentListEntry>> {
    serde_json::from_str(s)
}
