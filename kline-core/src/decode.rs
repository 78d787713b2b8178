use encoding_rs::Encoding;

use crate::error::DecodeError;

/// Декодирует байты в заявленной кодировке и режет на строки.
///
/// Правила:
/// - метка кодировки по WHATWG (`gbk`, `gb18030`, `utf-8`, ...), без автоопределения
/// - декодирование строгое: битая последовательность => `DecodeError::Malformed`
/// - ведущий BOM (`U+FEFF`) срезается
/// - разделитель строк `\n`, хвостовой `\r` срезается
/// - пустые и пробельные строки выбрасываются
pub fn decode_lines(bytes: &[u8], encoding_label: &str) -> Result<Vec<String>, DecodeError> {
    let encoding = resolve_encoding(encoding_label)?;

    let decoded = encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or(DecodeError::Malformed {
            encoding: encoding.name(),
        })?;

    let text = decoded.strip_prefix('\u{FEFF}').unwrap_or(&*decoded);
    Ok(split_lines(text))
}

/// Находит кодировку по метке WHATWG (регистр и пробелы по краям не важны)
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, DecodeError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| DecodeError::UnknownEncoding(label.to_string()))
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect()
}
