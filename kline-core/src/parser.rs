use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::debug;

use crate::constants::{DEFAULT_ENCODING, MARKET_PREFIXES, MIN_LINES, SOURCE_EXTENSION};
use crate::decode::decode_lines;
use crate::error::{ConvertError, MalformedFileError};
use crate::store::is_valid_code;
use crate::types::{Bar, InstrumentRecord};

/// Раскладка первой (служебной) строки файла.
///
/// В выгрузках встречаются два варианта, поэтому раскладка задаётся явно:
/// - `CodeName`: `SH600000 浦发银行 ...` — токен 0 это код, токен 1 это имя
/// - `ThreeToken`: имя берётся из токена 1, только если токенов не меньше трёх;
///   код всегда берётся из имени файла
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderLayout {
    #[default]
    CodeName,
    ThreeToken,
}

/// Политика отбраковки строк данных.
///
/// Строка без даты или с нечисловыми `open`/`close` отбрасывается всегда.
/// - `Lenient`: нечисловые `high`/`low` заменяются огибающей open/close;
///   такие значения синтетические и в `Bar` неотличимы от настоящих цен
/// - `Strict`: нечисловые `high`/`low` тоже отбрасывают строку
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowPolicy {
    #[default]
    Lenient,
    Strict,
}

impl FromStr for HeaderLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "code-name" => Ok(Self::CodeName),
            "three-token" => Ok(Self::ThreeToken),
            other => Err(format!(
                "unknown header layout: {other} (expected code-name or three-token)"
            )),
        }
    }
}

impl fmt::Display for HeaderLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CodeName => f.write_str("code-name"),
            Self::ThreeToken => f.write_str("three-token"),
        }
    }
}

impl FromStr for RowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "unknown row policy: {other} (expected lenient or strict)"
            )),
        }
    }
}

impl fmt::Display for RowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lenient => f.write_str("lenient"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

/// Настройки разбора одного файла
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub encoding: String,
    pub header_layout: HeaderLayout,
    pub row_policy: RowPolicy,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            encoding: DEFAULT_ENCODING.to_string(),
            header_layout: HeaderLayout::default(),
            row_policy: RowPolicy::default(),
        }
    }
}

/// Срезает биржевой префикс (`SH`/`SZ`) ровно один раз, с учётом регистра
pub fn strip_market_prefix(code: &str) -> &str {
    MARKET_PREFIXES
        .iter()
        .find_map(|p| code.strip_prefix(p))
        .unwrap_or(code)
}

/// Код из имени файла: `SH600000.txt` -> `SH600000`
fn file_stem(file_name: &str) -> &str {
    let suffix = format!(".{SOURCE_EXTENSION}");
    file_name.strip_suffix(suffix.as_str()).unwrap_or(file_name)
}

/// Разбор одной строки данных `date,open,high,low,close,volume[,amount]`.
///
/// Возвращает `None`, если строка должна быть отброшена.
pub fn parse_row(line: &str, policy: RowPolicy) -> Option<Bar> {
    let fields: Vec<&str> = line.trim().split(',').map(str::trim).collect();
    if !(6..=7).contains(&fields.len()) {
        return None;
    }

    let date = fields[0];
    if date.is_empty() {
        return None;
    }

    let open = parse_price(fields[1])?;
    let close = parse_price(fields[4])?;

    let (high, low) = match policy {
        RowPolicy::Strict => (parse_price(fields[2])?, parse_price(fields[3])?),
        RowPolicy::Lenient => (
            parse_price(fields[2]).unwrap_or(open.max(close)),
            parse_price(fields[3]).unwrap_or(open.min(close)),
        ),
    };

    Some(Bar {
        date: date.to_string(),
        open,
        high,
        low,
        close,
        volume: parse_volume(fields[5]),
    })
}

fn parse_price(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

// "15000" -> 15000, "15000.7" -> 15000, мусор -> 0
fn parse_volume(s: &str) -> u64 {
    s.parse::<u64>()
        .ok()
        .or_else(|| {
            s.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v as u64)
        })
        .unwrap_or(0)
}

/// Собирает `InstrumentRecord` из декодированных строк.
///
/// `file_name` нужен для раскладки `ThreeToken` (код берётся из имени файла).
/// Пустой ряд после фильтрации считается ошибкой: пустых записей не бывает.
/// Код после срезания префикса обязан быть непустым ASCII `[A-Za-z0-9]+`,
/// иначе `MalformedFileError::InvalidCode`: из кода строится имя файла.
pub fn parse_record<S: AsRef<str>>(
    lines: &[S],
    opts: &ParseOptions,
    file_name: Option<&str>,
) -> Result<InstrumentRecord, MalformedFileError> {
    if lines.len() < MIN_LINES {
        return Err(MalformedFileError::TooFewLines {
            expected: MIN_LINES,
            got: lines.len(),
        });
    }

    let tokens: Vec<&str> = lines[0].as_ref().split_whitespace().collect();

    let (raw_code, name) = match opts.header_layout {
        HeaderLayout::CodeName => (
            tokens.first().copied().unwrap_or_default(),
            tokens.get(1).copied().unwrap_or_default(),
        ),
        HeaderLayout::ThreeToken => {
            let name = if tokens.len() >= 3 { tokens[1] } else { "" };
            let code = match file_name {
                Some(f) => file_stem(f),
                None => tokens.first().copied().unwrap_or_default(),
            };
            (code, name)
        }
    };

    let code = strip_market_prefix(raw_code);
    if !is_valid_code(code) {
        return Err(MalformedFileError::InvalidCode(raw_code.to_string()));
    }

    // строка 1 — шапка колонок, пропускаем
    let data_lines = &lines[2..];
    let series: Vec<Bar> = data_lines
        .iter()
        .filter_map(|l| parse_row(l.as_ref(), opts.row_policy))
        .collect();

    let dropped = data_lines.len() - series.len();
    if dropped > 0 {
        debug!(
            "{}: dropped {dropped} of {} data rows",
            file_name.unwrap_or(raw_code),
            data_lines.len()
        );
    }

    if series.is_empty() {
        return Err(MalformedFileError::NoValidRows);
    }

    Ok(InstrumentRecord {
        code: code.to_string(),
        name: name.to_string(),
        series,
    })
}

/// Читает, декодирует и разбирает один файл выгрузки
pub fn decode_file(path: impl AsRef<Path>, opts: &ParseOptions) -> Result<InstrumentRecord, ConvertError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| ConvertError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let lines = decode_lines(&bytes, &opts.encoding)?;
    let file_name = path.file_name().and_then(|f| f.to_str());

    Ok(parse_record(&lines, opts, file_name)?)
}
