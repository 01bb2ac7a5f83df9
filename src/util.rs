//! Internal utilities.

use crate::error::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io;
use std::path::Path;

/// Read a JSON cache file.
///
/// A missing file is `Ok(None)`; an unreadable or malformed file is an error.
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let data = match tokio::fs::read(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io(path, e)),
    };
    serde_json::from_slice(&data)
        .map(Some)
        .map_err(|e| Error::format(path, e))
}

/// Write a JSON cache file, creating parent directories as needed.
///
/// Writes go straight to the target file. Concurrent writers for the same
/// host race and the last one wins.
pub(crate) async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::io(parent, e))?;
    }
    let data = serde_json::to_vec(value).map_err(|e| Error::format(path, e))?;
    tokio::fs::write(path, data)
        .await
        .map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded: Option<BTreeMap<String, String>> =
            read_json(&dir.path().join("absent")).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_write_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("cache");
        let mut map = BTreeMap::new();
        map.insert("k".to_string(), "v".to_string());

        write_json(&path, &map).await.unwrap();
        let loaded: Option<BTreeMap<String, String>> = read_json(&path).await.unwrap();
        assert_eq!(loaded, Some(map));
    }

    #[tokio::test]
    async fn test_garbage_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache");
        std::fs::write(&path, b"not json").unwrap();
        let err = read_json::<BTreeMap<String, String>>(&path)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }
}
