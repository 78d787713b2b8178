/// Кодировка выгрузок по умолчанию
pub const DEFAULT_ENCODING: &str = "gbk";

/// Минимальное число непустых строк: заголовок, шапка колонок, хотя бы одна строка данных
pub const MIN_LINES: usize = 3;

/// Префиксы биржи, которые срезаются с кода инструмента
pub const MARKET_PREFIXES: [&str; 2] = ["SH", "SZ"];

/// Имя файла со списком инструментов
pub const LIST_FILE_NAME: &str = "stocks.json";

/// Расширение исходных файлов выгрузки
pub const SOURCE_EXTENSION: &str = "txt";
