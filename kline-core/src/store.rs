//! Хранилища нормализованных записей.
//!
//! [`InstrumentStore`] — то, что нужно HTTP-слою: список кодов и запись по коду.
//! Реализации:
//! - [`JsonDirStore`] — каталог с `{code}.json` и `stocks.json` (его пишет конвертер)
//! - [`CacheStore`] — локальный кэш в памяти с сохранением в бинарный снапшот

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, warn};

use crate::constants::LIST_FILE_NAME;
use crate::error::StoreError;
use crate::format::{list_from_json, list_to_json, record_from_json, record_to_json};
use crate::snapshot;
use crate::types::{CacheStats, InstrumentListEntry, InstrumentRecord};

/// Источник данных для чтения
pub trait InstrumentStore: Send + Sync {
    /// Все известные коды, в порядке хранилища
    fn codes(&self) -> Result<Vec<String>, StoreError>;

    /// Запись по коду; `StoreError::NotFound`, если такой нет
    fn get(&self, code: &str) -> Result<InstrumentRecord, StoreError>;
}

/// Код годится для имени файла: непустой, только ASCII буквы/цифры
pub fn is_valid_code(code: &str) -> bool {
    !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric())
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Каталог с JSON-файлами
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Как `new`, но создаёт каталог, если его нет
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(io_err(&root))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn list_path(&self) -> PathBuf {
        self.root.join(LIST_FILE_NAME)
    }

    /// Содержимое `stocks.json`
    pub fn list(&self) -> Result<Vec<InstrumentListEntry>, StoreError> {
        let path = self.list_path();
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(StoreError::ListMissing),
            Err(e) => return Err(io_err(&path)(e)),
        };

        list_from_json(&content).map_err(|source| StoreError::Json { path, source })
    }

    pub fn write_record(&self, record: &InstrumentRecord) -> Result<PathBuf, StoreError> {
        let path = self.root.join(record.file_name());
        let json = record_to_json(record).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(io_err(&path))?;
        debug!("wrote {}", path.display());
        Ok(path)
    }

    pub fn write_list(&self, entries: &[InstrumentListEntry]) -> Result<PathBuf, StoreError> {
        let path = self.list_path();
        let json = list_to_json(entries).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(io_err(&path))?;
        Ok(path)
    }
}

impl InstrumentStore for JsonDirStore {
    fn codes(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.list()?.into_iter().map(|e| e.code).collect())
    }

    fn get(&self, code: &str) -> Result<InstrumentRecord, StoreError> {
        if !is_valid_code(code) {
            return Err(StoreError::NotFound(code.to_string()));
        }

        let path = self.root.join(format!("{code}.json"));
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(code.to_string()));
            }
            Err(e) => return Err(io_err(&path)(e)),
        };

        record_from_json(&content).map_err(|source| StoreError::Json { path, source })
    }
}

/// Локальный кэш записей.
///
/// Ключ — код инструмента, порядок — по коду. Каждая запись (`save`, `save_many`,
/// `clear`) сразу сбрасывается в файл снапшота.
#[derive(Debug)]
pub struct CacheStore {
    path: PathBuf,
    records: RwLock<BTreeMap<String, InstrumentRecord>>,
}

impl CacheStore {
    /// Открывает кэш; если файла ещё нет — кэш пустой
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let records = match fs::read(&path) {
            Ok(bytes) => snapshot::decode(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("cache snapshot {} not found, starting empty", path.display());
                Vec::new()
            }
            Err(e) => return Err(io_err(&path)(e)),
        };

        let records = records
            .into_iter()
            .map(|r| (r.code.clone(), r))
            .collect::<BTreeMap<_, _>>();

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, InstrumentRecord>> {
        match self.records.read() {
            Ok(g) => g,
            Err(poisoned) => {
                warn!("cache lock poisoned; continuing");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, InstrumentRecord>> {
        match self.records.write() {
            Ok(g) => g,
            Err(poisoned) => {
                warn!("cache lock poisoned; continuing");
                poisoned.into_inner()
            }
        }
    }

    /// Кладёт (или заменяет) одну запись
    pub fn save(&self, record: InstrumentRecord) -> Result<(), StoreError> {
        self.save_many(std::iter::once(record))
    }

    /// Кладёт пачку записей одной записью снапшота.
    ///
    /// Память меняется только после успешной записи файла.
    pub fn save_many(
        &self,
        records: impl IntoIterator<Item = InstrumentRecord>,
    ) -> Result<(), StoreError> {
        let mut map = self.write();
        let mut next = map.clone();
        for r in records {
            next.insert(r.code.clone(), r);
        }
        self.persist_locked(&next)?;
        *map = next;
        Ok(())
    }

    pub fn has(&self, code: &str) -> bool {
        self.read().contains_key(code)
    }

    /// Список `code`/`name` без рядов
    pub fn list(&self) -> Vec<InstrumentListEntry> {
        self.read().values().map(InstrumentRecord::list_entry).collect()
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        let mut map = self.write();
        self.persist_locked(&BTreeMap::new())?;
        map.clear();
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        let map = self.read();
        CacheStats {
            stock_count: map.len(),
            total_data_points: map.values().map(|r| r.series.len()).sum(),
        }
    }

    fn persist_locked(&self, map: &BTreeMap<String, InstrumentRecord>) -> Result<(), StoreError> {
        let records: Vec<InstrumentRecord> = map.values().cloned().collect();
        let bytes = snapshot::encode_v1(&records)?;
        fs::write(&self.path, bytes).map_err(io_err(&self.path))
    }
}

impl InstrumentStore for CacheStore {
    fn codes(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.read().keys().cloned().collect())
    }

    fn get(&self, code: &str) -> Result<InstrumentRecord, StoreError> {
        self.read()
            .get(code)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(code.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bar;

    fn rec(code: &str, name: &str, bars: usize) -> InstrumentRecord {
        InstrumentRecord {
            code: code.to_string(),
            name: name.to_string(),
            series: (0..bars)
                .map(|i| Bar {
                    date: format!("2024-01-{:02}", i + 1),
                    open: 10.0,
                    high: 11.0,
                    low: 9.5,
                    close: 10.5,
                    volume: 100 * i as u64,
                })
                .collect(),
        }
    }

    #[test]
    fn is_valid_code_rejects_path_like_input() {
        assert!(is_valid_code("600000"));
        assert!(is_valid_code("SH600000"));
        assert!(!is_valid_code(""));
        assert!(!is_valid_code("../stocks"));
        assert!(!is_valid_code("600000.json"));
        assert!(!is_valid_code("60 0000"));
    }

    #[test]
    fn json_dir_store_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::create(dir.path().join("export")).unwrap();

        let a = rec("600000", "PUFA_BANK", 3);
        let b = rec("000001", "PING_AN", 1);
        store.write_record(&a).unwrap();
        store.write_record(&b).unwrap();
        store.write_list(&[a.list_entry(), b.list_entry()]).unwrap();

        assert_eq!(store.codes().unwrap(), vec!["600000", "000001"]);
        assert_eq!(store.get("600000").unwrap(), a);
        assert_eq!(store.list().unwrap()[1].file, "000001.json");
    }

    #[test]
    fn json_dir_store_unknown_code_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path());
        store.write_record(&rec("600000", "PUFA_BANK", 1)).unwrap();

        let err = store.get("999999").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref c) if c == "999999"));
        assert_eq!(err.to_string(), "Stock 999999 not found");

        assert!(matches!(store.get("../600000"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn json_dir_store_missing_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path());
        assert!(matches!(store.codes(), Err(StoreError::ListMissing)));
    }

    #[test]
    fn json_dir_store_broken_record_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("600000.json"), "{not json").unwrap();
        let store = JsonDirStore::new(dir.path());
        assert!(matches!(store.get("600000"), Err(StoreError::Json { .. })));
    }

    #[test]
    fn cache_store_save_get_has_list_stats() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStore::open(dir.path().join("cache.bin")).unwrap();
        assert_eq!(cache.stats(), CacheStats::default());

        cache.save(rec("600000", "PUFA_BANK", 3)).unwrap();
        cache
            .save_many(vec![rec("000001", "PING_AN", 2), rec("600519", "MOUTAI", 5)])
            .unwrap();

        assert!(cache.has("600000"));
        assert!(!cache.has("999999"));
        assert_eq!(cache.get("600519").unwrap().series.len(), 5);
        assert!(matches!(cache.get("999999"), Err(StoreError::NotFound(_))));

        let codes: Vec<String> = cache.list().into_iter().map(|e| e.code).collect();
        assert_eq!(codes, vec!["000001", "600000", "600519"]);
        assert_eq!(cache.codes().unwrap(), codes);

        assert_eq!(
            cache.stats(),
            CacheStats {
                stock_count: 3,
                total_data_points: 10
            }
        );
    }

    #[test]
    fn cache_store_save_replaces_same_code() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStore::open(dir.path().join("cache.bin")).unwrap();

        cache.save(rec("600000", "OLD", 1)).unwrap();
        cache.save(rec("600000", "NEW", 2)).unwrap();

        let got = cache.get("600000").unwrap();
        assert_eq!(got.name, "NEW");
        assert_eq!(cache.stats().stock_count, 1);
    }

    #[test]
    fn cache_store_persists_across_reopen_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.bin");

        {
            let cache = CacheStore::open(&path).unwrap();
            cache.save(rec("600000", "PUFA_BANK", 2)).unwrap();
        }

        let cache = CacheStore::open(&path).unwrap();
        assert_eq!(cache.get("600000").unwrap(), rec("600000", "PUFA_BANK", 2));

        cache.clear().unwrap();
        assert_eq!(cache.stats().stock_count, 0);

        let reopened = CacheStore::open(&path).unwrap();
        assert!(reopened.codes().unwrap().is_empty());
    }

    #[test]
    fn cache_store_failed_write_leaves_memory_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.bin");
        let cache = CacheStore::open(&path).unwrap();
        cache.save(rec("600000", "PUFA_BANK", 1)).unwrap();

        // на месте файла каталог: запись снапшота падает
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let err = cache.save(rec("000001", "PING_AN", 1)).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(!cache.has("000001"));

        assert!(cache.clear().is_err());
        assert!(cache.has("600000"));
        assert_eq!(cache.stats().stock_count, 1);
    }

    #[test]
    fn cache_store_rejects_foreign_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.bin");
        std::fs::write(&path, [7u8, 1, 2, 3]).unwrap();

        let err = CacheStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Snapshot(_)));
    }
}
