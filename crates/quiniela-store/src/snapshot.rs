//! JSON snapshots of the whole store.
//!
//! A snapshot is the operator's offline copy of both collections:
//! `{"pools": [...], "entries": [...]}`. Documents are validated while
//! deserializing, so a malformed pool or entry fails the load instead of
//! reaching settlement.

use std::path::Path;

use serde::{Deserialize, Serialize};

use quiniela_types::{Entry, Pool, Result};

/// Every pool and entry document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub pools: Vec<Pool>,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

/// Read and parse a snapshot file.
pub async fn load_snapshot(path: impl AsRef<Path>) -> Result<StoreSnapshot> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path).await?;
    let snapshot: StoreSnapshot = serde_json::from_str(&raw)?;
    tracing::debug!(
        path = %path.display(),
        pools = snapshot.pools.len(),
        entries = snapshot.entries.len(),
        "Snapshot loaded"
    );
    Ok(snapshot)
}

/// Write a snapshot file, replacing the old one only once the new one is
/// fully written.
pub async fn save_snapshot(path: impl AsRef<Path>, snapshot: &StoreSnapshot) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_vec_pretty(snapshot)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &json).await?;
    tokio::fs::rename(&tmp, path).await?;
    tracing::debug!(
        path = %path.display(),
        pools = snapshot.pools.len(),
        entries = snapshot.entries.len(),
        "Snapshot saved"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiniela_types::QuinielaError;

    fn temp_path() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("quiniela-snapshot-{}.json", uuid::Uuid::now_v7()))
    }

    #[tokio::test]
    async fn save_then_load() {
        let path = temp_path();
        let snapshot = StoreSnapshot {
            pools: vec![Pool::dummy(3)],
            entries: Vec::new(),
        };
        save_snapshot(&path, &snapshot).await.unwrap();
        let back = load_snapshot(&path).await.unwrap();
        assert_eq!(back, snapshot);
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn malformed_document_fails_load() {
        let path = temp_path();
        tokio::fs::write(&path, r#"{"pools":[{"id":"x"}]}"#).await.unwrap();
        let err = load_snapshot(&path).await.unwrap_err();
        assert!(matches!(err, QuinielaError::Serialization(_)));
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = load_snapshot(temp_path()).await.unwrap_err();
        assert!(matches!(err, QuinielaError::Io(_)));
    }

    #[test]
    fn empty_document_is_empty_snapshot() {
        let snapshot: StoreSnapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.pools.is_empty());
        assert!(snapshot.entries.is_empty());
    }
}
