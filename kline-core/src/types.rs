use std::fmt;

use serde::{Deserialize, Serialize};

/// Один торговый период (OHLCV).
///
/// `date` хранится как есть, без разбора в календарный тип.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl fmt::Display for Bar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} O={} H={} L={} C={} V={}",
            self.date, self.open, self.high, self.low, self.close, self.volume
        )
    }
}

/// Нормализованный инструмент: код, имя и ряд баров в порядке файла
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRecord {
    pub code: String,
    pub name: String,
    pub series: Vec<Bar>,
}

impl InstrumentRecord {
    /// Имя файла, под которым запись лежит в каталоге
    pub fn file_name(&self) -> String {
        format!("{}.json", self.code)
    }

    /// Строка вида "600000 PUFA_BANK"
    pub fn display_name(&self) -> String {
        format!("{} {}", self.code, self.name)
    }

    pub fn list_entry(&self) -> InstrumentListEntry {
        InstrumentListEntry {
            code: self.code.clone(),
            name: self.name.clone(),
            file: self.file_name(),
        }
    }
}

/// Элемент `stocks.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentListEntry {
    pub code: String,
    pub name: String,
    pub file: String,
}

/// Сводка по содержимому кэша
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub stock_count: usize,
    pub total_data_points: usize,
}

/// Проверка ряда: не пустой, у каждого бара есть дата и конечные цены
pub fn validate_series(series: &[Bar]) -> bool {
    !series.is_empty()
        && series.iter().all(|b| {
            !b.date.is_empty()
                && [b.open, b.high, b.low, b.close]
                    .iter()
                    .all(|p| p.is_finite())
        })
}
