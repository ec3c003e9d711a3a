//! In-memory vector index with cosine similarity search and disk
//! persistence.
//!
//! The index is an immutable snapshot (parallel vectors + chunk metadata)
//! behind an atomically swappable handle. Readers clone the `Arc` and work
//! against a single consistent snapshot for the whole request; `install`
//! publishes a fully built replacement in one swap, so no reader ever sees
//! vectors from one build joined with chunks from another.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::RagError;
use crate::models::{Category, Chunk};

/// One complete, immutable index build.
///
/// Invariant: `vectors.len() == chunks.len()`, and `chunks[i].id == i`.
/// Enforced at construction and on load.
#[derive(Debug)]
pub struct IndexSnapshot {
    vectors: Vec<Vec<f32>>,
    chunks: Vec<Chunk>,
}

impl IndexSnapshot {
    /// Build a snapshot from parallel chunk and embedding arrays. Vectors
    /// are L2-normalized here so search is a plain dot product.
    pub fn build(chunks: Vec<Chunk>, mut vectors: Vec<Vec<f32>>) -> Result<Self, RagError> {
        if chunks.len() != vectors.len() {
            return Err(RagError::CorruptIndex(format!(
                "{} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }
        for v in &mut vectors {
            l2_normalize(v);
        }
        Ok(Self { vectors, chunks })
    }

    /// Top-k nearest chunks by cosine similarity (dot product, both sides
    /// are unit vectors). Descending score, ties broken by ascending chunk
    /// id so results are deterministic.
    pub fn search(
        &self,
        query_vector: &[f32],
        k: usize,
        category_filter: Option<Category>,
    ) -> Vec<(usize, f32)> {
        if k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .filter(|(id, _)| match category_filter {
                Some(cat) => self.chunks[*id].category == cat,
                None => true,
            })
            .map(|(id, v)| (id, dot(query_vector, v)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);
        scored
    }

    pub fn chunk(&self, id: usize) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Serialized snapshot layout on disk.
#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    vectors: Vec<Vec<f32>>,
    chunks: Vec<Chunk>,
}

/// Process-wide index handle.
pub struct VectorIndex {
    snapshot: RwLock<Option<Arc<IndexSnapshot>>>,
    persist_path: PathBuf,
}

impl VectorIndex {
    /// Create an empty (not-ready) handle persisting at `persist_path`.
    pub fn new(persist_path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot: RwLock::new(None),
            persist_path: persist_path.into(),
        }
    }

    /// The active snapshot, for callers that need search results and chunk
    /// metadata from one consistent build.
    pub fn snapshot(&self) -> Result<Arc<IndexSnapshot>, RagError> {
        self.snapshot
            .read()
            .clone()
            .ok_or(RagError::IndexNotReady)
    }

    /// Convenience search against the active snapshot.
    pub fn search(
        &self,
        query_vector: &[f32],
        k: usize,
        category_filter: Option<Category>,
    ) -> Result<Vec<(usize, f32)>, RagError> {
        Ok(self.snapshot()?.search(query_vector, k, category_filter))
    }

    /// Publish a fully built snapshot and persist it. The swap is the only
    /// write; in-flight readers keep their previous `Arc` until they finish.
    pub fn install(&self, chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<(), RagError> {
        let snapshot = Arc::new(IndexSnapshot::build(chunks, vectors)?);
        self.persist(&snapshot)?;
        *self.snapshot.write() = Some(snapshot);
        Ok(())
    }

    /// Load the persisted snapshot from disk.
    ///
    /// Returns Ok(false) when nothing has been persisted yet (caller should
    /// rebuild from the corpus). A present-but-inconsistent file is
    /// `CorruptIndex`; the recovery is a full rebuild, never partial repair.
    pub fn load(&self) -> Result<bool, RagError> {
        if !self.persist_path.exists() {
            return Ok(false);
        }
        let data = std::fs::read_to_string(&self.persist_path)?;
        let persisted: PersistedIndex = serde_json::from_str(&data)
            .map_err(|e| RagError::CorruptIndex(format!("unparseable index file: {e}")))?;

        if persisted.vectors.len() != persisted.chunks.len() {
            return Err(RagError::CorruptIndex(format!(
                "{} vectors for {} chunks",
                persisted.vectors.len(),
                persisted.chunks.len()
            )));
        }

        // Persisted vectors are already normalized; build re-normalizes
        // which is a no-op on unit vectors.
        let snapshot = Arc::new(IndexSnapshot::build(persisted.chunks, persisted.vectors)?);
        *self.snapshot.write() = Some(snapshot);
        Ok(true)
    }

    /// Atomic write via temp file + rename.
    fn persist(&self, snapshot: &IndexSnapshot) -> Result<(), RagError> {
        if let Some(parent) = self.persist_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let persisted = PersistedIndex {
            vectors: snapshot.vectors.clone(),
            chunks: snapshot.chunks.clone(),
        };
        let data = serde_json::to_string(&persisted)?;
        let tmp_path = self.persist_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, data)?;
        std::fs::rename(&tmp_path, &self.persist_path)?;
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot.read().is_some()
    }

    pub fn chunk_count(&self) -> usize {
        self.snapshot
            .read()
            .as_ref()
            .map(|s| s.len())
            .unwrap_or(0)
    }

    pub fn persist_path(&self) -> &Path {
        &self.persist_path
    }
}

/// L2-normalize in place. A zero vector stays zero rather than dividing by
/// zero; it then scores 0 against everything.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn make_chunk(id: usize, category: Category) -> Chunk {
        Chunk {
            id,
            text: format!("chunk {id}"),
            source_path: format!("doc_{id}.md"),
            file_name: format!("doc{id}.php"),
            category,
            chunk_index: 0,
        }
    }

    fn three_chunk_snapshot() -> IndexSnapshot {
        let chunks = vec![
            make_chunk(0, Category::Backend),
            make_chunk(1, Category::Frontend),
            make_chunk(2, Category::Backend),
        ];
        let vectors = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ];
        IndexSnapshot::build(chunks, vectors).unwrap()
    }

    #[test]
    fn test_build_rejects_length_mismatch() {
        let chunks = vec![make_chunk(0, Category::Other)];
        let err = IndexSnapshot::build(chunks, vec![]).unwrap_err();
        assert!(matches!(err, RagError::CorruptIndex(_)));
    }

    #[test]
    fn test_search_descending_scores() {
        let snapshot = three_chunk_snapshot();
        let results = snapshot.search(&[0.9, 0.3, 0.1], 3, None);
        assert_eq!(results.len(), 3);
        assert!(results[0].1 >= results[1].1);
        assert!(results[1].1 >= results[2].1);
        assert_eq!(results[0].0, 0);
    }

    #[test]
    fn test_search_ties_broken_by_ascending_id() {
        let chunks = vec![
            make_chunk(0, Category::Other),
            make_chunk(1, Category::Other),
            make_chunk(2, Category::Other),
        ];
        // Identical vectors produce identical scores
        let vectors = vec![vec![1.0, 0.0]; 3];
        let snapshot = IndexSnapshot::build(chunks, vectors).unwrap();
        let results = snapshot.search(&[1.0, 0.0], 3, None);
        let ids: Vec<usize> = results.iter().map(|r| r.0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_search_k_zero_returns_empty() {
        let snapshot = three_chunk_snapshot();
        assert!(snapshot.search(&[1.0, 0.0, 0.0], 0, None).is_empty());
    }

    #[test]
    fn test_search_empty_index_returns_empty() {
        let snapshot = IndexSnapshot::build(vec![], vec![]).unwrap();
        assert!(snapshot.search(&[1.0, 0.0], 5, None).is_empty());
    }

    #[test]
    fn test_search_k_larger_than_index() {
        let snapshot = three_chunk_snapshot();
        let results = snapshot.search(&[1.0, 0.0, 0.0], 50, None);
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_category_filter() {
        let snapshot = three_chunk_snapshot();
        let results = snapshot.search(&[0.5, 0.5, 0.5], 10, Some(Category::Backend));
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(id, _)| *id == 0 || *id == 2));
    }

    #[test]
    fn test_search_before_build_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let index = VectorIndex::new(dir.path().join("index.json"));
        let err = index.search(&[1.0], 5, None).unwrap_err();
        assert!(matches!(err, RagError::IndexNotReady));
    }

    #[test]
    fn test_install_then_search() {
        let dir = tempfile::tempdir().unwrap();
        let index = VectorIndex::new(dir.path().join("index.json"));
        index
            .install(
                vec![make_chunk(0, Category::Backend)],
                vec![vec![3.0, 4.0]],
            )
            .unwrap();
        assert!(index.is_ready());
        assert_eq!(index.chunk_count(), 1);

        // The stored vector was normalized: (0.6, 0.8)
        let results = index.search(&[0.6, 0.8], 1, None).unwrap();
        assert!((results[0].1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_persist_load_round_trip_identical_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let index = VectorIndex::new(&path);
        let chunks = vec![
            make_chunk(0, Category::Backend),
            make_chunk(1, Category::Frontend),
        ];
        let vectors = vec![vec![0.8, 0.2, 0.1], vec![0.1, 0.9, 0.3]];
        index.install(chunks, vectors).unwrap();

        let query = [0.7, 0.3, 0.2];
        let before = index.search(&query, 2, None).unwrap();

        let fresh = VectorIndex::new(&path);
        assert!(fresh.load().unwrap());
        let after = fresh.search(&query, 2, None).unwrap();

        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(&after) {
            assert_eq!(b.0, a.0);
            assert!((b.1 - a.1).abs() < 1e-6);
        }
    }

    #[test]
    fn test_load_missing_file_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let index = VectorIndex::new(dir.path().join("index.json"));
        assert!(!index.load().unwrap());
        assert!(!index.is_ready());
    }

    #[test]
    fn test_load_detects_length_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        // Hand-craft a file violating the parallel-array invariant
        let broken = serde_json::json!({
            "vectors": [[1.0, 0.0]],
            "chunks": []
        });
        std::fs::write(&path, broken.to_string()).unwrap();

        let index = VectorIndex::new(&path);
        let err = index.load().unwrap_err();
        assert!(matches!(err, RagError::CorruptIndex(_)));
        assert!(!index.is_ready());
    }

    #[test]
    fn test_load_detects_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, "not json at all").unwrap();

        let index = VectorIndex::new(&path);
        assert!(matches!(
            index.load().unwrap_err(),
            RagError::CorruptIndex(_)
        ));
    }

    #[test]
    fn test_install_replaces_whole_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let index = VectorIndex::new(dir.path().join("index.json"));

        index
            .install(vec![make_chunk(0, Category::Backend)], vec![vec![1.0, 0.0]])
            .unwrap();
        let old = index.snapshot().unwrap();

        index
            .install(
                vec![
                    make_chunk(0, Category::Frontend),
                    make_chunk(1, Category::Frontend),
                ],
                vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            )
            .unwrap();

        // The reader that grabbed the old snapshot still sees the old build
        assert_eq!(old.len(), 1);
        assert_eq!(old.chunk(0).unwrap().category, Category::Backend);
        // New readers see only the new build
        assert_eq!(index.chunk_count(), 2);
        assert_eq!(
            index.snapshot().unwrap().chunk(0).unwrap().category,
            Category::Frontend
        );
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        let mut v = vec![0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0]);
    }
}
