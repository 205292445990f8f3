use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{PipelineError, ScoredChunk, StoredChunk};

use super::{VectorStore, cosine_similarity};

pub const DEFAULT_PERSIST_DIR: &str = "text_index";
pub const DEFAULT_COLLECTION: &str = "dcd_store";

/// A whole collection kept in memory and written to `{persist_dir}/{collection}.json`.
/// Queries are an exhaustive cosine scan.
#[derive(Debug, Clone)]
pub struct JsonVectorStore {
    persist_dir: PathBuf,
    collection: String,
    embedding_model: String,
    dimensions: Option<usize>,
    entries: Vec<StoredChunk>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CollectionFile {
    collection: String,
    embedding_model: String,
    #[serde(default)]
    dimensions: Option<usize>,
    entries: Vec<StoredChunk>,
}

impl JsonVectorStore {
    pub fn create(
        persist_dir: impl Into<PathBuf>,
        collection: impl Into<String>,
        embedding_model: impl Into<String>,
    ) -> Result<Self, PipelineError> {
        let collection = validate_collection(collection.into())?;
        Ok(Self {
            persist_dir: persist_dir.into(),
            collection,
            embedding_model: embedding_model.into(),
            dimensions: None,
            entries: Vec::new(),
        })
    }

    /// Loads a previously persisted collection. `None` when the directory is missing or
    /// empty, or when it holds no file for this collection.
    pub fn open_existing(
        persist_dir: impl Into<PathBuf>,
        collection: impl Into<String>,
    ) -> Result<Option<Self>, PipelineError> {
        let persist_dir = persist_dir.into();
        let collection = validate_collection(collection.into())?;

        if !dir_has_entries(&persist_dir)? {
            return Ok(None);
        }

        let path = collection_path(&persist_dir, &collection);
        if !path.is_file() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).map_err(|err| {
            PipelineError::store(format!("failed to read {}: {err}", path.display()))
        })?;
        let file: CollectionFile = serde_json::from_str(&contents).map_err(|err| {
            PipelineError::store(format!("failed to decode {}: {err}", path.display()))
        })?;
        if file.collection != collection {
            return Err(PipelineError::store(format!(
                "{} holds collection '{}', expected '{collection}'",
                path.display(),
                file.collection
            )));
        }

        Ok(Some(Self {
            persist_dir,
            collection,
            embedding_model: file.embedding_model,
            dimensions: file.dimensions,
            entries: file.entries,
        }))
    }

    /// Deletes the persisted file for `collection`. Returns whether one existed.
    pub fn discard(
        persist_dir: impl AsRef<Path>,
        collection: impl Into<String>,
    ) -> Result<bool, PipelineError> {
        let collection = validate_collection(collection.into())?;
        let path = collection_path(persist_dir.as_ref(), &collection);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(PipelineError::store(format!(
                "failed to remove {}: {err}",
                path.display()
            ))),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    pub fn path(&self) -> PathBuf {
        collection_path(&self.persist_dir, &self.collection)
    }
}

impl VectorStore for JsonVectorStore {
    fn add(&mut self, entries: Vec<StoredChunk>) -> Result<(), PipelineError> {
        let mut dimensions = self.dimensions;
        for entry in &entries {
            let len = entry.embedding.len();
            if len == 0 {
                return Err(PipelineError::store(format!(
                    "chunk {} has an empty embedding",
                    entry.chunk.id
                )));
            }
            match dimensions {
                Some(expected) if expected != len => {
                    return Err(PipelineError::store(format!(
                        "chunk {} has {len} dimensions, collection uses {expected}",
                        entry.chunk.id
                    )));
                }
                Some(_) => {}
                None => dimensions = Some(len),
            }
        }

        self.dimensions = dimensions;
        self.entries.extend(entries);
        Ok(())
    }

    fn query(&self, embedding: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(embedding, &entry.embedding),
            })
            .collect::<Vec<_>>();

        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        scored.truncate(k);
        scored
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn persist(&self) -> Result<(), PipelineError> {
        fs::create_dir_all(&self.persist_dir).map_err(|err| {
            PipelineError::store(format!(
                "failed to create {}: {err}",
                self.persist_dir.display()
            ))
        })?;

        let file = CollectionFile {
            collection: self.collection.clone(),
            embedding_model: self.embedding_model.clone(),
            dimensions: self.dimensions,
            entries: self.entries.clone(),
        };
        let encoded = serde_json::to_vec(&file)
            .map_err(|err| PipelineError::store(format!("failed to encode collection: {err}")))?;

        // Write then rename so a crash never leaves a half-written collection behind.
        let path = self.path();
        let tmp_path = self.persist_dir.join(format!(".{}.json.tmp", self.collection));
        fs::write(&tmp_path, encoded).map_err(|err| {
            PipelineError::store(format!("failed to write {}: {err}", tmp_path.display()))
        })?;
        fs::rename(&tmp_path, &path).map_err(|err| {
            PipelineError::store(format!("failed to move index into {}: {err}", path.display()))
        })
    }
}

fn validate_collection(collection: String) -> Result<String, PipelineError> {
    let collection = collection.trim().to_string();
    if collection.is_empty() {
        return Err(PipelineError::store("collection name must not be empty"));
    }
    if !collection
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-'))
    {
        return Err(PipelineError::store(format!(
            "collection name '{collection}' may only contain ASCII letters, digits, '_' and '-'"
        )));
    }
    Ok(collection)
}

fn collection_path(persist_dir: &Path, collection: &str) -> PathBuf {
    persist_dir.join(format!("{collection}.json"))
}

fn dir_has_entries(dir: &Path) -> Result<bool, PipelineError> {
    match fs::read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_some()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(PipelineError::store(format!(
            "failed to inspect {}: {err}",
            dir.display()
        ))),
    }
}
