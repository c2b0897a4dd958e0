//! Flat inner-product vector index with atomic on-disk persistence.
//!
//! Search is exact: every stored vector is scored against the query. With
//! unit-length vectors the inner product is the cosine similarity.
//!
//! On disk an index is three files in one directory:
//! - `vectors.<gen>.bin`: little-endian f32 rows in id order
//! - `chunks.<gen>.json`: the chunk table
//! - `manifest.json`: generation, dimension, counts and SHA-256 of both data files
//!
//! Data files are written under a new generation name first; the manifest is
//! replaced last by rename, so a reader sees either the old or the new pair.

use crate::types::Chunk;
use chrono::{DateTime, Utc};
use ragline_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub const FORMAT_VERSION: u32 = 1;
pub const MANIFEST_FILE: &str = "manifest.json";

/// One stored vector and the chunk it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub id: u64,
    pub vector: Vec<f32>,
    pub chunk: Chunk,
}

#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    entries: Vec<IndexEntry>,
    next_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    format_version: u32,
    generation: u64,
    dimension: usize,
    count: usize,
    next_id: u64,
    vectors_file: String,
    chunks_file: String,
    vectors_sha256: String,
    chunks_sha256: String,
    saved_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChunkTable {
    next_id: u64,
    entries: Vec<StoredChunk>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredChunk {
    id: u64,
    chunk: Chunk,
}

impl VectorIndex {
    /// Create an empty index whose vectors must all have `dimension` components.
    pub fn create(dimension: usize) -> Self {
        Self {
            dimension,
            entries: Vec::new(),
            next_id: 0,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    pub fn contains_only_placeholder(&self) -> bool {
        self.entries.len() == 1 && self.entries[0].chunk.is_placeholder()
    }

    /// Append chunks with their vectors, assigning fresh ids.
    ///
    /// All inputs are validated before anything is inserted: on error the
    /// index is unchanged.
    pub fn add_entries(&mut self, chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> AppResult<Vec<u64>> {
        if chunks.len() != vectors.len() {
            return Err(AppError::DimensionMismatch {
                expected: chunks.len(),
                actual: vectors.len(),
            });
        }

        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(AppError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }

        let mut ids = Vec::with_capacity(chunks.len());
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            let id = self.next_id;
            self.next_id += 1;
            self.entries.push(IndexEntry { id, vector, chunk });
            ids.push(id);
        }

        Ok(ids)
    }

    /// The `k` entries most similar to `query`, best first.
    ///
    /// Equal scores are ordered by ascending id.
    pub fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<(Chunk, f32)>> {
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        if query.len() != self.dimension {
            return Err(AppError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(&IndexEntry, f32)> = self
            .entries
            .iter()
            .map(|entry| (entry, dot(&entry.vector, query)))
            .collect();

        scored.sort_by(|(a, sa), (b, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(entry, score)| (entry.chunk.clone(), score))
            .collect())
    }

    /// True when `dir` holds a manifest, valid or not.
    pub fn exists(dir: &Path) -> bool {
        dir.join(MANIFEST_FILE).exists()
    }

    /// Persist the index to `dir` atomically.
    pub fn save(&self, dir: &Path) -> AppResult<()> {
        fs::create_dir_all(dir).map_err(|e| {
            AppError::Knowledge(format!("Failed to create index directory {:?}: {}", dir, e))
        })?;

        let generation = read_manifest(dir).map(|m| m.generation + 1).unwrap_or(1);
        let vectors_file = format!("vectors.{}.bin", generation);
        let chunks_file = format!("chunks.{}.json", generation);

        let vector_bytes = self.vectors_to_bytes();
        let table = ChunkTable {
            next_id: self.next_id,
            entries: self
                .entries
                .iter()
                .map(|e| StoredChunk {
                    id: e.id,
                    chunk: e.chunk.clone(),
                })
                .collect(),
        };
        let chunk_bytes = serde_json::to_vec(&table)?;

        write_atomic(dir, &vectors_file, &vector_bytes)?;
        write_atomic(dir, &chunks_file, &chunk_bytes)?;

        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            generation,
            dimension: self.dimension,
            count: self.entries.len(),
            next_id: self.next_id,
            vectors_file: vectors_file.clone(),
            chunks_file: chunks_file.clone(),
            vectors_sha256: sha256_hex(&vector_bytes),
            chunks_sha256: sha256_hex(&chunk_bytes),
            saved_at: Utc::now(),
        };
        write_atomic(dir, MANIFEST_FILE, &serde_json::to_vec_pretty(&manifest)?)?;

        prune_generations(dir, &vectors_file, &chunks_file);

        tracing::debug!(
            "Saved vector index generation {} ({} entries, dimension {}) to {:?}",
            generation,
            self.entries.len(),
            self.dimension,
            dir
        );

        Ok(())
    }

    /// Load an index saved by [`VectorIndex::save`].
    ///
    /// Every integrity failure is reported as [`AppError::CorruptIndex`].
    pub fn load(dir: &Path) -> AppResult<Self> {
        let manifest = read_manifest(dir)?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(AppError::CorruptIndex(format!(
                "Unsupported index format version {}",
                manifest.format_version
            )));
        }
        if manifest.dimension == 0 {
            return Err(AppError::CorruptIndex("Index dimension is zero".to_string()));
        }

        let vector_bytes = read_data_file(dir, &manifest.vectors_file)?;
        if sha256_hex(&vector_bytes) != manifest.vectors_sha256 {
            return Err(AppError::CorruptIndex(format!(
                "Checksum mismatch for {}",
                manifest.vectors_file
            )));
        }

        let chunk_bytes = read_data_file(dir, &manifest.chunks_file)?;
        if sha256_hex(&chunk_bytes) != manifest.chunks_sha256 {
            return Err(AppError::CorruptIndex(format!(
                "Checksum mismatch for {}",
                manifest.chunks_file
            )));
        }

        let row_bytes = manifest
            .dimension
            .checked_mul(4)
            .ok_or_else(|| AppError::CorruptIndex("Index dimension out of range".to_string()))?;
        if manifest.count.checked_mul(row_bytes) != Some(vector_bytes.len()) {
            return Err(AppError::CorruptIndex(format!(
                "Vector file holds {} bytes, manifest claims {} rows of {} bytes",
                vector_bytes.len(),
                manifest.count,
                row_bytes
            )));
        }

        let table: ChunkTable = serde_json::from_slice(&chunk_bytes).map_err(|e| {
            AppError::CorruptIndex(format!("Failed to parse {}: {}", manifest.chunks_file, e))
        })?;

        if table.entries.len() != manifest.count || table.next_id != manifest.next_id {
            return Err(AppError::CorruptIndex(format!(
                "Chunk table holds {} entries (next id {}), manifest says {} (next id {})",
                table.entries.len(),
                table.next_id,
                manifest.count,
                manifest.next_id
            )));
        }

        let mut entries = Vec::with_capacity(manifest.count);
        let mut last_id: Option<u64> = None;
        for (stored, row) in table
            .entries
            .into_iter()
            .zip(vector_bytes.chunks_exact(row_bytes))
        {
            let ordered = last_id.map_or(true, |last| stored.id > last);
            if !ordered || stored.id >= manifest.next_id {
                return Err(AppError::CorruptIndex(format!(
                    "Chunk id {} out of order",
                    stored.id
                )));
            }
            last_id = Some(stored.id);

            entries.push(IndexEntry {
                id: stored.id,
                vector: bytes_to_vector(row),
                chunk: stored.chunk,
            });
        }

        tracing::debug!(
            "Loaded vector index generation {} ({} entries, dimension {}) from {:?}",
            manifest.generation,
            entries.len(),
            manifest.dimension,
            dir
        );

        Ok(Self {
            dimension: manifest.dimension,
            entries,
            next_id: manifest.next_id,
        })
    }

    fn vectors_to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.entries.len() * self.dimension * 4);
        for entry in &self.entries {
            for value in &entry.vector {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        bytes
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn bytes_to_vector(row: &[u8]) -> Vec<f32> {
    row.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn read_manifest(dir: &Path) -> AppResult<Manifest> {
    let path = dir.join(MANIFEST_FILE);
    let bytes = fs::read(&path)
        .map_err(|e| AppError::CorruptIndex(format!("Failed to read {:?}: {}", path, e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AppError::CorruptIndex(format!("Failed to parse {:?}: {}", path, e)))
}

fn read_data_file(dir: &Path, name: &str) -> AppResult<Vec<u8>> {
    if name.contains('/') || name.contains('\\') {
        return Err(AppError::CorruptIndex(format!(
            "Invalid data file name in manifest: {}",
            name
        )));
    }
    let path = dir.join(name);
    fs::read(&path).map_err(|e| AppError::CorruptIndex(format!("Failed to read {:?}: {}", path, e)))
}

/// Write `bytes` to `dir/name` via a synced temp file and a rename.
fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> AppResult<()> {
    let tmp_path = dir.join(format!(".{}.tmp", name));
    let final_path = dir.join(name);

    let mut file = File::create(&tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, &final_path)?;

    // Persist the rename itself; not supported on every platform
    if let Ok(dir_handle) = File::open(dir) {
        let _ = dir_handle.sync_all();
    }

    Ok(())
}

fn prune_generations(dir: &Path, vectors_file: &str, chunks_file: &str) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Failed to list {:?} for pruning: {}", dir, e);
            return;
        }
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name().to_string_lossy().to_string();
        let is_data = (name.starts_with("vectors.") && name.ends_with(".bin"))
            || (name.starts_with("chunks.") && name.ends_with(".json"));
        if is_data && name != vectors_file && name != chunks_file {
            if let Err(e) = fs::remove_file(entry.path()) {
                tracing::warn!("Failed to prune old index file {}: {}", name, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Document;
    use tempfile::TempDir;

    fn chunk(text: &str) -> Chunk {
        let doc = Document::new(text).with_title(text).with_source("test");
        Chunk {
            text: text.to_string(),
            metadata: doc.chunk_metadata(),
        }
    }

    fn unit(v: &[f32]) -> Vec<f32> {
        let mut v = v.to_vec();
        crate::embeddings::l2_normalize(&mut v);
        v
    }

    fn sample_index() -> VectorIndex {
        let mut index = VectorIndex::create(3);
        index
            .add_entries(
                vec![chunk("north"), chunk("east"), chunk("north-east")],
                vec![
                    unit(&[1.0, 0.0, 0.0]),
                    unit(&[0.0, 1.0, 0.0]),
                    unit(&[1.0, 1.0, 0.0]),
                ],
            )
            .unwrap();
        index
    }

    #[test]
    fn test_search_ranks_by_similarity() {
        let index = sample_index();
        let results = index.search(&unit(&[1.0, 0.2, 0.0]), 3).unwrap();

        let texts: Vec<&str> = results.iter().map(|(c, _)| c.text.as_str()).collect();
        assert_eq!(texts, vec!["north", "north-east", "east"]);
        assert!(results[0].1 >= results[1].1 && results[1].1 >= results[2].1);
    }

    #[test]
    fn test_search_k_larger_than_len() {
        let index = sample_index();
        assert_eq!(index.search(&unit(&[0.0, 0.0, 1.0]), 10).unwrap().len(), 3);
    }

    #[test]
    fn test_search_ties_by_ascending_id() {
        let mut index = VectorIndex::create(2);
        index
            .add_entries(
                vec![chunk("first"), chunk("second")],
                vec![vec![1.0, 0.0], vec![1.0, 0.0]],
            )
            .unwrap();

        let results = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results[0].0.text, "first");
        assert_eq!(results[1].0.text, "second");
    }

    #[test]
    fn test_search_empty_and_zero_k() {
        let empty = VectorIndex::create(3);
        assert!(empty.search(&[1.0, 0.0, 0.0], 3).unwrap().is_empty());

        let index = sample_index();
        assert!(index.search(&[1.0, 0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_search_wrong_query_dimension() {
        let index = sample_index();
        assert!(matches!(
            index.search(&[1.0, 0.0], 1),
            Err(AppError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_add_entries_is_all_or_nothing() {
        let mut index = sample_index();
        let result = index.add_entries(
            vec![chunk("ok"), chunk("bad")],
            vec![vec![0.0, 0.0, 1.0], vec![0.0, 1.0]],
        );

        assert!(matches!(result, Err(AppError::DimensionMismatch { .. })));
        assert_eq!(index.len(), 3);

        let mismatched = index.add_entries(vec![chunk("lonely")], vec![]);
        assert!(matches!(mismatched, Err(AppError::DimensionMismatch { .. })));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut index = sample_index();
        let ids = index
            .add_entries(vec![chunk("up")], vec![vec![0.0, 0.0, 1.0]])
            .unwrap();
        assert_eq!(ids, vec![3]);

        let all: Vec<u64> = index.entries().map(|e| e.id).collect();
        assert_eq!(all, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_save_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let index = sample_index();
        index.save(temp.path()).unwrap();

        let loaded = VectorIndex::load(temp.path()).unwrap();
        assert_eq!(loaded.dimension(), 3);
        assert_eq!(loaded.len(), 3);

        for query in [[1.0, 0.0, 0.0], [0.3, 0.9, 0.1], [0.0, 0.0, 1.0]] {
            let query = unit(&query);
            assert_eq!(
                index.search(&query, 3).unwrap(),
                loaded.search(&query, 3).unwrap()
            );
        }
    }

    #[test]
    fn test_save_prunes_old_generations() {
        let temp = TempDir::new().unwrap();
        let mut index = sample_index();
        index.save(temp.path()).unwrap();
        index
            .add_entries(vec![chunk("up")], vec![vec![0.0, 0.0, 1.0]])
            .unwrap();
        index.save(temp.path()).unwrap();

        let mut names: Vec<String> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["chunks.2.json", "manifest.json", "vectors.2.bin"]);

        let loaded = VectorIndex::load(temp.path()).unwrap();
        assert_eq!(loaded.len(), 4);
    }

    #[test]
    fn test_load_missing_is_corrupt() {
        let temp = TempDir::new().unwrap();
        assert!(!VectorIndex::exists(temp.path()));
        assert!(matches!(
            VectorIndex::load(&temp.path().join("nope")),
            Err(AppError::CorruptIndex(_))
        ));
    }

    #[test]
    fn test_load_detects_tampering() {
        let temp = TempDir::new().unwrap();
        sample_index().save(temp.path()).unwrap();

        let vectors = temp.path().join("vectors.1.bin");
        let mut bytes = fs::read(&vectors).unwrap();
        bytes[0] ^= 0xff;
        fs::write(&vectors, bytes).unwrap();

        assert!(matches!(
            VectorIndex::load(temp.path()),
            Err(AppError::CorruptIndex(_))
        ));
    }

    #[test]
    fn test_load_detects_truncation() {
        let temp = TempDir::new().unwrap();
        sample_index().save(temp.path()).unwrap();

        let vectors = temp.path().join("vectors.1.bin");
        let bytes = fs::read(&vectors).unwrap();
        fs::write(&vectors, &bytes[..bytes.len() - 4]).unwrap();

        assert!(matches!(
            VectorIndex::load(temp.path()),
            Err(AppError::CorruptIndex(_))
        ));
    }

    #[test]
    fn test_load_rejects_unknown_version() {
        let temp = TempDir::new().unwrap();
        sample_index().save(temp.path()).unwrap();

        let path = temp.path().join(MANIFEST_FILE);
        let mut manifest: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        manifest["formatVersion"] = serde_json::json!(99);
        fs::write(&path, serde_json::to_vec(&manifest).unwrap()).unwrap();

        assert!(matches!(
            VectorIndex::load(temp.path()),
            Err(AppError::CorruptIndex(_))
        ));
    }

    #[test]
    fn test_load_rejects_oversized_counts() {
        let temp = TempDir::new().unwrap();
        sample_index().save(temp.path()).unwrap();

        let path = temp.path().join(MANIFEST_FILE);
        let original: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();

        for (field, value) in [("count", u64::MAX / 4), ("dimension", u64::MAX / 2)] {
            let mut manifest = original.clone();
            manifest[field] = serde_json::json!(value);
            fs::write(&path, serde_json::to_vec(&manifest).unwrap()).unwrap();

            assert!(
                matches!(VectorIndex::load(temp.path()), Err(AppError::CorruptIndex(_))),
                "{} = {} was accepted",
                field,
                value
            );
        }
    }

    #[test]
    fn test_placeholder_detection() {
        let mut index = VectorIndex::create(2);
        assert!(!index.contains_only_placeholder());
        index
            .add_entries(vec![Chunk::placeholder()], vec![vec![1.0, 0.0]])
            .unwrap();
        assert!(index.contains_only_placeholder());
        index
            .add_entries(vec![chunk("real")], vec![vec![0.0, 1.0]])
            .unwrap();
        assert!(!index.contains_only_placeholder());
    }
}
