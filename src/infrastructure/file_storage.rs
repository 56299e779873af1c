use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

/// FileRecord は保存ファイルの論理的な位置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub component: String,
    pub file_area: String,
    pub item_id: i64,
    pub file_path: String,
    pub file_name: String,
}

impl FileRecord {
    /// 論理パスから一意なハッシュを算出する。
    pub fn path_name_hash(&self) -> String {
        let path = format!(
            "/{}/{}/{}{}{}",
            self.component, self.file_area, self.item_id, self.file_path, self.file_name
        );
        hex::encode(Sha256::digest(path.as_bytes()))
    }
}

/// StoredFile は保存済みファイルのメタデータ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub record: FileRecord,
    pub path_name_hash: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

impl StoredFile {
    fn new(record: &FileRecord, content: &str) -> Self {
        Self {
            path_name_hash: record.path_name_hash(),
            record: record.clone(),
            size_bytes: content.len() as u64,
            created_at: Utc::now(),
        }
    }
}

/// FileStorage は文字列をファイルとして保存・取得するストレージのトレイト。
/// 同じ論理パスへの保存は既存の内容を置き換える。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn create_file_from_string(
        &self,
        record: &FileRecord,
        content: &str,
    ) -> anyhow::Result<StoredFile>;

    async fn get_file_content(&self, record: &FileRecord) -> anyhow::Result<Option<String>>;
}

/// InMemoryFileStorage はインメモリのファイルストレージ（開発・テスト用）。
#[derive(Default)]
pub struct InMemoryFileStorage {
    files: RwLock<HashMap<String, String>>,
}

impl InMemoryFileStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FileStorage for InMemoryFileStorage {
    async fn create_file_from_string(
        &self,
        record: &FileRecord,
        content: &str,
    ) -> anyhow::Result<StoredFile> {
        let stored = StoredFile::new(record, content);
        self.files
            .write()
            .await
            .insert(stored.path_name_hash.clone(), content.to_string());
        Ok(stored)
    }

    async fn get_file_content(&self, record: &FileRecord) -> anyhow::Result<Option<String>> {
        let files = self.files.read().await;
        Ok(files.get(&record.path_name_hash()).cloned())
    }
}

/// LocalFsFileStorage はローカルディレクトリにファイルを保存する。
/// 保存先は `<root>/<hash 先頭2文字>/<hash>`。
pub struct LocalFsFileStorage {
    root: PathBuf,
}

impl LocalFsFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, hash: &str) -> PathBuf {
        self.root.join(&hash[..2]).join(hash)
    }
}

#[async_trait]
impl FileStorage for LocalFsFileStorage {
    async fn create_file_from_string(
        &self,
        record: &FileRecord,
        content: &str,
    ) -> anyhow::Result<StoredFile> {
        let stored = StoredFile::new(record, content);
        let path = self.path_for(&stored.path_name_hash);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                anyhow::anyhow!("failed to create storage directory {}: {}", dir.display(), e)
            })?;
        }
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| anyhow::anyhow!("failed to write file {}: {}", path.display(), e))?;
        tracing::debug!(path = %path.display(), size = stored.size_bytes, "file stored");
        Ok(stored)
    }

    async fn get_file_content(&self, record: &FileRecord) -> anyhow::Result<Option<String>> {
        let path = self.path_for(&record.path_name_hash());
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::anyhow!("failed to read file {}: {}", path.display(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(name: &str) -> FileRecord {
        FileRecord {
            component: "tool_modifycompletions".to_string(),
            file_area: "temp".to_string(),
            item_id: 0,
            file_path: "/".to_string(),
            file_name: name.to_string(),
        }
    }

    #[test]
    fn test_path_name_hash_is_stable_and_distinct() {
        let a = make_record("a.csv");
        assert_eq!(a.path_name_hash(), make_record("a.csv").path_name_hash());
        assert_ne!(a.path_name_hash(), make_record("b.csv").path_name_hash());
        assert_eq!(a.path_name_hash().len(), 64);
    }

    #[tokio::test]
    async fn test_in_memory_store_and_replace() {
        let storage = InMemoryFileStorage::new();
        let record = make_record("undo.csv");
        assert!(storage.get_file_content(&record).await.unwrap().is_none());

        let stored = storage
            .create_file_from_string(&record, "1,10,1600000000\n")
            .await
            .unwrap();
        assert_eq!(stored.size_bytes, 16);

        storage.create_file_from_string(&record, "").await.unwrap();
        assert_eq!(
            storage.get_file_content(&record).await.unwrap().as_deref(),
            Some("")
        );
    }

    #[tokio::test]
    async fn test_local_fs_store_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFsFileStorage::new(dir.path());
        let record = make_record("undo.csv");

        assert!(storage.get_file_content(&record).await.unwrap().is_none());
        storage
            .create_file_from_string(&record, "1,10,1600000000\n")
            .await
            .unwrap();
        assert_eq!(
            storage.get_file_content(&record).await.unwrap().as_deref(),
            Some("1,10,1600000000\n")
        );
    }
}
