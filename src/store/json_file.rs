//! Whole-file JSON store.
//!
//! Every append reads the complete file, inserts one entry, and overwrites
//! the file. The overwrite is not atomic: an interrupted write can leave a
//! truncated file behind.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use super::{Document, DocumentStore, StoreError};

/// Document store backed by one pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for JsonFileStore {
    fn load(&self) -> Result<Document, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Document::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, document: &Document) -> Result<(), StoreError> {
        let mut buf = Vec::new();
        let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        document.serialize(&mut ser).map_err(StoreError::Encode)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(&self.path, buf).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::parse;
    use crate::store::Timestamp;
    use chrono::NaiveDate;

    fn stamp(micro: u32) -> Timestamp {
        let time = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_micro_opt(14, 5, 7, micro)
            .unwrap();
        Timestamp::from_naive(time)
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data.json"));
        assert!(store.load().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_first_append_creates_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("storage").join("data.json"));

        let appended = store.append(stamp(0), parse(b"name=Ann&city=Lviv").unwrap()).unwrap();
        assert_eq!(appended.total_entries, 1);

        let text = fs::read_to_string(store.path()).unwrap();
        assert_eq!(
            text,
            "{\n    \"2024-03-09 14:05:07.000000\": {\n        \"name\": \"Ann\",\n        \"city\": \"Lviv\"\n    }\n}"
        );
    }

    #[test]
    fn test_non_ascii_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data.json"));
        store.append(stamp(1), parse(b"city=%D0%9B%D1%8C%D0%B2%D1%96%D0%B2").unwrap()).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\"city\": \"Львів\""));
    }

    #[test]
    fn test_load_then_save_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data.json"));
        store.append(stamp(1), parse(b"a=1&b=2").unwrap()).unwrap();
        store.append(stamp(2), parse(b"c=3").unwrap()).unwrap();
        let before = fs::read(store.path()).unwrap();

        let doc = store.load().unwrap();
        store.save(&doc).unwrap();

        assert_eq!(fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn test_append_keeps_prior_entries_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(
            &path,
            r#"{"old": {"x": "1"}, "odd": [1, 2, {"deep": true}]}"#,
        )
        .unwrap();
        let store = JsonFileStore::new(&path);
        let before = store.load().unwrap();

        store.append(stamp(3), parse(b"x=2").unwrap()).unwrap();

        let after = store.load().unwrap();
        assert_eq!(after.len(), before.len() + 1);
        for key in before.keys() {
            assert_eq!(after.get(key), before.get(key));
        }
        let keys: Vec<_> = after.keys().collect();
        assert_eq!(keys, vec!["old", "odd", "2024-03-09 14:05:07.000003"]);
    }

    #[test]
    fn test_corrupt_file_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{\"half\": ").unwrap();
        let store = JsonFileStore::new(&path);

        let err = store.append(stamp(4), parse(b"a=1").unwrap()).unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"half\": ");
    }

    #[test]
    fn test_unwritable_location_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();
        let store = JsonFileStore::new(blocker.join("data.json"));

        let err = store.append(stamp(5), parse(b"a=1").unwrap()).unwrap_err();
        assert!(matches!(err, StoreError::Write { .. } | StoreError::Read { .. }));
    }
}
