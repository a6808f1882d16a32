//! Embedding-backed memory with optional on-disk snapshot
//!
//! Text is embedded as a hashed bag of words: every lower-cased token is
//! hashed with SHA-256 into one of [`EMBEDDING_DIM`] buckets and the vector is
//! L2-normalized. Recall ranks stored embeddings against the query embedding
//! with the configured [`DistanceMetric`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::backend::{MemoryBackend, MemoryRecord, QueryOptions, StoreOptions};
use crate::config::MemorySettings;
use crate::error::{FacilityError, Result};

/// Width of every embedding
pub const EMBEDDING_DIM: usize = 256;

const SNAPSHOT_FILE: &str = "memory.json";

/// Similarity metric used to rank memories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Cosine similarity
    #[default]
    Cosine,
    /// Negated Euclidean distance
    L2,
    /// Inner product
    Ip,
}

impl DistanceMetric {
    /// Higher is more similar for every metric.
    pub fn score(self, a: &[f32], b: &[f32]) -> f64 {
        match self {
            DistanceMetric::Cosine => {
                let (na, nb) = (norm(a), norm(b));
                if na == 0.0 || nb == 0.0 {
                    0.0
                } else {
                    dot(a, b) / (na * nb)
                }
            }
            DistanceMetric::Ip => dot(a, b),
            DistanceMetric::L2 => {
                let squared: f64 = a
                    .iter()
                    .zip(b)
                    .map(|(x, y)| {
                        let d = f64::from(*x) - f64::from(*y);
                        d * d
                    })
                    .sum();
                -squared.sqrt()
            }
        }
    }

    // Distances always rank; similarities only count when positive.
    fn keeps(self, score: f64) -> bool {
        match self {
            DistanceMetric::L2 => true,
            DistanceMetric::Cosine | DistanceMetric::Ip => score > 0.0,
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum()
}

fn norm(a: &[f32]) -> f64 {
    dot(a, a).sqrt()
}

/// Embed text as an L2-normalized hashed bag of words.
pub fn embed(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; EMBEDDING_DIM];
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
    {
        let digest = Sha256::digest(token.to_lowercase().as_bytes());
        let bucket = usize::from(u16::from_be_bytes([digest[0], digest[1]])) % EMBEDDING_DIM;
        vector[bucket] += 1.0;
    }

    let length = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if length > 0.0 {
        for x in &mut vector {
            *x /= length;
        }
    }
    vector
}

fn document_id(content: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(content.as_bytes()));
    format!("doc_{}", &digest[..16])
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredMemory {
    record: MemoryRecord,
    embedding: Vec<f32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    memories: Vec<StoredMemory>,
}

/// Vector memory shared by the stage agents
pub struct VectorMemory {
    memories: RwLock<BTreeMap<String, StoredMemory>>,
    metric: DistanceMetric,
    n_results: usize,
    snapshot_path: Option<PathBuf>,
}

impl VectorMemory {
    /// Create an empty, non-persistent memory
    pub fn new(metric: DistanceMetric, n_results: usize) -> Self {
        Self {
            memories: RwLock::new(BTreeMap::new()),
            metric,
            n_results,
            snapshot_path: None,
        }
    }

    /// Open a memory as configured: load the snapshot from `output_dir` and
    /// ingest the documents in `docs_folder`, when those are set.
    pub async fn open(settings: &MemorySettings) -> Result<Self> {
        let mut memory = Self::new(settings.metric, settings.n_results);

        if let Some(dir) = &settings.output_dir {
            tokio::fs::create_dir_all(dir).await?;
            let path = dir.join(SNAPSHOT_FILE);
            if tokio::fs::try_exists(&path).await? {
                let loaded = load_snapshot(&path).await?;
                tracing::debug!(path = %path.display(), memories = loaded.len(), "loaded memory snapshot");
                memory.memories = RwLock::new(loaded);
            }
            memory.snapshot_path = Some(path);
        }

        if let Some(docs) = &settings.docs_folder {
            if docs.is_dir() {
                let ingested = memory.ingest_documents(docs).await?;
                tracing::info!(folder = %docs.display(), ingested, "ingested property documents");
            } else {
                tracing::debug!(folder = %docs.display(), "docs folder absent, skipping ingestion");
            }
        }

        Ok(memory)
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn n_results(&self) -> usize {
        self.n_results
    }

    /// Path of the on-disk snapshot, if persistent
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Store every `.txt` / `.md` file in `dir` once, keyed by content hash.
    ///
    /// Returns the number of newly stored documents.
    pub async fn ingest_documents(&self, dir: impl AsRef<Path>) -> Result<usize> {
        let mut entries = tokio::fs::read_dir(dir.as_ref()).await?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_document = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("txt") || ext.eq_ignore_ascii_case("md"));
            if is_document && entry.file_type().await?.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut ingested = 0;
        for path in paths {
            let content = tokio::fs::read_to_string(&path).await?;
            if content.trim().is_empty() {
                continue;
            }

            let id = document_id(&content);
            if self.memories.read().await.contains_key(&id) {
                continue;
            }

            let source = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let options = StoreOptions::new()
                .with_id(id)
                .with_memory_type("document")
                .with_property("source", source);
            self.store(content, Some(options)).await?;
            ingested += 1;
        }
        Ok(ingested)
    }

    async fn persist(&self, memories: &BTreeMap<String, StoredMemory>) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let snapshot = Snapshot {
            memories: memories.values().cloned().collect(),
        };
        let json = serde_json::to_vec(&snapshot)?;
        crate::persist::write_atomic(path, &json)
            .await
            .map_err(|e| FacilityError::Memory(format!("Failed to write {}: {}", path.display(), e)))
    }
}

async fn load_snapshot(path: &Path) -> Result<BTreeMap<String, StoredMemory>> {
    let bytes = tokio::fs::read(path).await?;
    let snapshot: Snapshot = serde_json::from_slice(&bytes).map_err(|e| {
        FacilityError::Memory(format!("Corrupt memory snapshot {}: {}", path.display(), e))
    })?;

    Ok(snapshot
        .memories
        .into_iter()
        .map(|mut stored| {
            if stored.embedding.len() != EMBEDDING_DIM {
                stored.embedding = embed(&stored.record.content);
            }
            (stored.record.id.clone(), stored)
        })
        .collect())
}

#[async_trait]
impl MemoryBackend for VectorMemory {
    async fn store(&self, content: String, options: Option<StoreOptions>) -> Result<String> {
        let options = options.unwrap_or_default();
        let id = options
            .id
            .clone()
            .unwrap_or_else(|| format!("mem_{}", Uuid::new_v4().simple()));

        let stored = StoredMemory {
            embedding: embed(&content),
            record: MemoryRecord {
                id: id.clone(),
                content,
                created_at: Utc::now().to_rfc3339(),
                properties: options.into_properties(),
                score: None,
            },
        };

        let mut memories = self.memories.write().await;
        memories.insert(id.clone(), stored);
        self.persist(&memories).await?;
        Ok(id)
    }

    async fn search(
        &self,
        query: &str,
        options: Option<QueryOptions>,
    ) -> Result<Vec<MemoryRecord>> {
        let limit = options.and_then(|o| o.limit).unwrap_or(self.n_results);
        let query_embedding = embed(query);

        let memories = self.memories.read().await;
        let mut scored: Vec<(f64, MemoryRecord)> = memories
            .values()
            .map(|stored| (self.metric.score(&query_embedding, &stored.embedding), stored))
            .filter(|(score, _)| self.metric.keeps(*score))
            .map(|(score, stored)| {
                let mut record = stored.record.clone();
                record.score = Some(score);
                (score, record)
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored.into_iter().take(limit).map(|(_, record)| record).collect())
    }

    async fn get(&self, id: &str) -> Result<Option<MemoryRecord>> {
        let memories = self.memories.read().await;
        Ok(memories.get(id).map(|stored| stored.record.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut memories = self.memories.write().await;
        let existed = memories.remove(id).is_some();
        if existed {
            self.persist(&memories).await?;
        }
        Ok(existed)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.memories.read().await.len() as u64)
    }

    async fn health_check(&self) -> Result<()> {
        match &self.snapshot_path {
            Some(path) => match path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() && !dir.is_dir() => Err(
                    FacilityError::Memory(format!("Memory directory {} is missing", dir.display())),
                ),
                _ => Ok(()),
            },
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_in(dir: &Path) -> MemorySettings {
        MemorySettings {
            enabled: true,
            metric: DistanceMetric::Cosine,
            n_results: 3,
            output_dir: Some(dir.join("data")),
            docs_folder: Some(dir.join("docs")),
        }
    }

    #[test]
    fn test_embed_is_normalized_and_case_insensitive() {
        let a = embed("Group Home Permit");
        let b = embed("group home permit");
        assert_eq!(a.len(), EMBEDDING_DIM);
        assert_eq!(a, b);

        let length: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((length - 1.0).abs() < 1e-5);

        assert!(embed("  ,.; ").iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_metric_scores() {
        let a = embed("zoning permit");
        assert!((DistanceMetric::Cosine.score(&a, &a) - 1.0).abs() < 1e-6);
        assert!((DistanceMetric::Ip.score(&a, &a) - 1.0).abs() < 1e-6);
        assert_eq!(DistanceMetric::L2.score(&a, &a), 0.0);
        assert_eq!(DistanceMetric::Cosine.score(&a, &vec![0.0; EMBEDDING_DIM]), 0.0);
    }

    #[tokio::test]
    async fn test_search_ranks_and_limits() {
        let memory = VectorMemory::new(DistanceMetric::Cosine, 2);
        for text in [
            "zoning permit group home",
            "zoning variance parking",
            "zoning permit parking lot",
            "renovation budget kitchen",
        ] {
            memory.store(text.to_string(), None).await.unwrap();
        }

        let results = memory.search("zoning permit group home", None).await.unwrap();
        assert!(!results.is_empty());
        assert!(results.len() <= 2);
        assert_eq!(results[0].content, "zoning permit group home");

        let scores: Vec<f64> = results.iter().map(|r| r.score.unwrap()).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));

        let one = memory
            .search("zoning", Some(QueryOptions::with_limit(1)))
            .await
            .unwrap();
        assert_eq!(one.len(), 1);
    }

    #[tokio::test]
    async fn test_l2_returns_nearest_first() {
        let memory = VectorMemory::new(DistanceMetric::L2, 10);
        memory.store("community transit".to_string(), None).await.unwrap();
        memory.store("meditation garden".to_string(), None).await.unwrap();

        let results = memory.search("meditation garden", None).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "meditation garden");
        assert_eq!(results[0].score, Some(0.0));
    }

    #[tokio::test]
    async fn test_store_get_delete() {
        let memory = VectorMemory::new(DistanceMetric::Cosine, 3);
        let id = memory
            .store(
                "Group therapy room".to_string(),
                Some(StoreOptions::new().with_tag("Facility Planner")),
            )
            .await
            .unwrap();
        assert!(id.starts_with("mem_"));

        let record = memory.get(&id).await.unwrap().unwrap();
        assert_eq!(record.properties["tags"][0], "Facility Planner");

        assert!(memory.delete(&id).await.unwrap());
        assert!(!memory.delete(&id).await.unwrap());
        assert_eq!(memory.count().await.unwrap(), 0);
        assert!(memory.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());

        let memory = VectorMemory::open(&settings).await.unwrap();
        let id = memory
            .store("123 Palm Ave has 15 bedrooms".to_string(), None)
            .await
            .unwrap();
        assert!(dir.path().join("data").join("memory.json").exists());
        drop(memory);

        let reopened = VectorMemory::open(&settings).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        let results = reopened.search("Palm Ave bedrooms", None).await.unwrap();
        assert_eq!(results[0].id, id);
    }

    #[tokio::test]
    async fn test_document_ingestion_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("docs");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(docs.join("palm.txt"), "Palm Ave zoning allows group homes").unwrap();
        std::fs::write(docs.join("notes.md"), "Transit stops within half a mile").unwrap();
        std::fs::write(docs.join("photo.jpg"), "not text").unwrap();
        std::fs::write(docs.join("empty.txt"), "   ").unwrap();

        let settings = settings_in(dir.path());
        let memory = VectorMemory::open(&settings).await.unwrap();
        assert_eq!(memory.count().await.unwrap(), 2);

        assert_eq!(memory.ingest_documents(&docs).await.unwrap(), 0);
        drop(memory);

        let reopened = VectorMemory::open(&settings).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 2);

        let results = reopened.search("Palm Ave zoning", None).await.unwrap();
        assert_eq!(results[0].properties["source"], "palm.txt");
        assert_eq!(results[0].properties["type"], "document");
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(data.join("memory.json"), "{not json").unwrap();

        let err = VectorMemory::open(&settings_in(dir.path())).await.err().unwrap();
        assert!(matches!(err, FacilityError::Memory(_)));
    }

    #[tokio::test]
    async fn test_interrupted_write_keeps_last_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());

        let memory = VectorMemory::open(&settings).await.unwrap();
        memory
            .store("Palm Ave needs a group home permit".to_string(), None)
            .await
            .unwrap();
        let snapshot = memory.snapshot_path().unwrap().to_path_buf();
        assert!(!crate::persist::staging_path(&snapshot).exists());

        // A write cut short only ever touches the staging file.
        std::fs::write(crate::persist::staging_path(&snapshot), "{\"memories\": [{\"rec").unwrap();

        let reopened = VectorMemory::open(&settings).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);

        reopened
            .store("Second finding".to_string(), None)
            .await
            .unwrap();
        assert!(!crate::persist::staging_path(&snapshot).exists());
        assert_eq!(VectorMemory::open(&settings).await.unwrap().count().await.unwrap(), 2);
    }
}

