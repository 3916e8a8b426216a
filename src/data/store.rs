use std::{
    fs::{File, OpenOptions},
    io::{BufReader, ErrorKind, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use fs2::FileExt;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{DashError, Result};

/// JSON files on shared storage, written by other processes.
///
/// Reads hold a shared advisory lock and updates an exclusive one, so a
/// reader never sees a half-written file.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute names are used as-is, relative names live under the root.
    pub fn path(&self, name: impl AsRef<Path>) -> PathBuf {
        let name = name.as_ref();
        if name.is_absolute() {
            name.to_path_buf()
        } else {
            self.root.join(name)
        }
    }

    pub fn read<T: DeserializeOwned>(&self, name: impl AsRef<Path>) -> Result<T> {
        let path = self.path(name);
        let file = File::open(&path).map_err(|source| DashError::DataUnavailable {
            path: path.clone(),
            source,
        })?;

        FileExt::lock_shared(&file)?;
        let parsed = serde_json::from_reader(BufReader::new(&file));
        let _ = FileExt::unlock(&file);

        parsed.map_err(|source| DashError::Json { path, source })
    }

    /// Like [`JsonStore::read`], but a missing file is `None` instead of an error.
    pub fn read_optional<T: DeserializeOwned>(&self, name: impl AsRef<Path>) -> Result<Option<T>> {
        match self.read(name) {
            Ok(value) => Ok(Some(value)),
            Err(DashError::DataUnavailable { source, .. })
                if source.kind() == ErrorKind::NotFound =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Read-modify-write under an exclusive lock. A missing or empty file
    /// starts from `T::default()`.
    pub fn update<T, F>(&self, name: impl AsRef<Path>, update: F) -> Result<()>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> Result<()>,
    {
        let path = self.path(name);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        FileExt::lock_exclusive(&file)?;
        let result = rewrite(&mut file, &path, update);
        let _ = FileExt::unlock(&file);

        result
    }
}

fn rewrite<T, F>(file: &mut File, path: &Path, update: F) -> Result<()>
where
    T: DeserializeOwned + Serialize + Default,
    F: FnOnce(&mut T) -> Result<()>,
{
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let mut data: T = if contents.trim().is_empty() {
        T::default()
    } else {
        serde_json::from_str(&contents).map_err(|source| DashError::Json {
            path: path.to_path_buf(),
            source,
        })?
    };

    update(&mut data)?;

    let bytes = serde_json::to_vec_pretty(&data)?;
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&bytes)?;
    file.sync_data()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_data_unavailable() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path());

        let err = store.read::<serde_json::Value>("missing.json").unwrap_err();
        assert!(matches!(err, DashError::DataUnavailable { .. }));
        assert!(store
            .read_optional::<serde_json::Value>("missing.json")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_malformed_file_is_not_optional() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let store = JsonStore::new(dir.path());

        let err = store
            .read_optional::<serde_json::Value>("bad.json")
            .unwrap_err();
        assert!(matches!(err, DashError::Json { .. }));
    }

    #[test]
    fn test_update_creates_and_shrinks_file() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path());

        store
            .update::<BTreeMap<String, String>, _>("m.json", |m| {
                m.insert("a".into(), "a long value that takes some space".into());
                Ok(())
            })
            .unwrap();
        store
            .update::<BTreeMap<String, String>, _>("m.json", |m| {
                m.insert("a".into(), "short".into());
                Ok(())
            })
            .unwrap();

        let map: BTreeMap<String, String> = store.read("m.json").unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["a"], "short");
    }

    #[test]
    fn test_absolute_names_bypass_root() {
        let dir = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let absolute = other.path().join("x.json");
        let store = JsonStore::new(dir.path());

        assert_eq!(store.path(&absolute), absolute);
        assert_eq!(store.path("x.json"), dir.path().join("x.json"));
    }
}
