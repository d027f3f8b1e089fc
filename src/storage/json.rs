//! Plain JSON-file storage backend.
//!
//! One JSON file per key under a store directory:
//!
//! - `library.json`: saved papers
//! - `interests.json`: user interests
//! - `feed.json`: last fetched feed snapshot
//! - `embeddings.json`: embedding records keyed by paper id
//! - `chats.json`: chat transcripts keyed by paper id
//! - `notes.json`: user notes
//!
//! Readers supply a default for missing or corrupt files, so a fresh or
//! damaged store directory behaves like an empty one. Writes go through a
//! temp file and a rename, so a crashed writer never leaves a torn file
//! behind. A single in-process write lock serializes read-modify-write
//! cycles on the map-shaped files; across processes the rename keeps each
//! whole-file write atomic (last-write-wins).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{EmbeddingCache, LibraryStore, StorageError, StorageResult};
use crate::models::{ChatTranscript, EmbeddingRecord, Interest, Note, Paper};

const LIBRARY_FILE: &str = "library.json";
const INTERESTS_FILE: &str = "interests.json";
const FEED_FILE: &str = "feed.json";
const EMBEDDINGS_FILE: &str = "embeddings.json";
const CHATS_FILE: &str = "chats.json";
const NOTES_FILE: &str = "notes.json";

/// JSON-file implementation of [`EmbeddingCache`] and [`LibraryStore`].
pub struct JsonFileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub async fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Read and deserialize a file, or hand back the default value.
    ///
    /// A missing file is the normal empty-store case; a corrupt file is
    /// logged and treated the same way rather than failing the reader.
    async fn read_or_default<T>(&self, file: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path(file);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(file, "store file missing, using default");
                return T::default();
            }
            Err(err) => {
                warn!(file, %err, "store file unreadable, using default");
                return T::default();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(err) => {
                warn!(file, %err, "store file corrupt, using default");
                T::default()
            }
        }
    }

    /// Serialize `value` and atomically replace `file` with it.
    async fn write_atomic<T>(&self, file: &str, value: &T) -> StorageResult<()>
    where
        T: Serialize,
    {
        let path = self.path(file);
        let tmp = self.path(&format!("{file}.tmp"));
        let bytes = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(file, bytes = bytes.len(), "store file written");
        Ok(())
    }

    /// Update one entry in a map-shaped file under the write lock.
    async fn upsert_map_entry<V>(&self, file: &str, key: String, value: V) -> StorageResult<()>
    where
        V: Serialize + DeserializeOwned,
    {
        let _guard = self.write_lock.lock().await;
        let mut map: HashMap<String, V> = self.read_or_default(file).await;
        map.insert(key, value);
        self.write_atomic(file, &map).await
    }

    /// Directory this store reads and writes.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl EmbeddingCache for JsonFileStore {
    async fn get(&self, paper_id: &str) -> StorageResult<Option<EmbeddingRecord>> {
        let map: HashMap<String, EmbeddingRecord> = self.read_or_default(EMBEDDINGS_FILE).await;
        Ok(map.get(paper_id).cloned())
    }

    async fn put(&self, record: EmbeddingRecord) -> StorageResult<()> {
        self.upsert_map_entry(EMBEDDINGS_FILE, record.paper_id.clone(), record)
            .await
    }
}

#[async_trait]
impl LibraryStore for JsonFileStore {
    async fn load_library(&self) -> StorageResult<Vec<Paper>> {
        Ok(self.read_or_default(LIBRARY_FILE).await)
    }

    async fn save_library(&self, papers: &[Paper]) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        self.write_atomic(LIBRARY_FILE, &papers).await
    }

    async fn load_interests(&self) -> StorageResult<Vec<Interest>> {
        Ok(self.read_or_default(INTERESTS_FILE).await)
    }

    async fn save_interests(&self, interests: &[Interest]) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        self.write_atomic(INTERESTS_FILE, &interests).await
    }

    async fn load_feed_snapshot(&self) -> StorageResult<Vec<Paper>> {
        Ok(self.read_or_default(FEED_FILE).await)
    }

    async fn save_feed_snapshot(&self, papers: &[Paper]) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        self.write_atomic(FEED_FILE, &papers).await
    }

    async fn load_transcript(&self, paper_id: &str) -> StorageResult<Option<ChatTranscript>> {
        let map: HashMap<String, ChatTranscript> = self.read_or_default(CHATS_FILE).await;
        Ok(map.get(paper_id).cloned())
    }

    async fn save_transcript(&self, transcript: &ChatTranscript) -> StorageResult<()> {
        self.upsert_map_entry(CHATS_FILE, transcript.paper_id.clone(), transcript.clone())
            .await
    }

    async fn load_notes(&self) -> StorageResult<Vec<Note>> {
        Ok(self.read_or_default(NOTES_FILE).await)
    }

    async fn save_notes(&self, notes: &[Note]) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        self.write_atomic(NOTES_FILE, &notes).await
    }
}
