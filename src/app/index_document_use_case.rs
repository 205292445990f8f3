use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{PipelineError, StoredChunk};
use crate::infra::document::{DocumentLoader, loader_for_path};
use crate::infra::embedding::EmbeddingProvider;
use crate::infra::text::ChunkSplitter;
use crate::infra::vector_store::{
    DEFAULT_COLLECTION, DEFAULT_PERSIST_DIR, JsonVectorStore, VectorStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLocation {
    pub persist_dir: PathBuf,
    pub collection: String,
}

impl Default for IndexLocation {
    fn default() -> Self {
        Self {
            persist_dir: PathBuf::from(DEFAULT_PERSIST_DIR),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    Reused { chunks: usize },
    Built { pages: usize, chunks: usize },
}

/// Builds the vector index for one document, or reuses the one already on disk.
pub struct IndexDocumentUseCase {
    embeddings: Arc<dyn EmbeddingProvider>,
    splitter: ChunkSplitter,
    location: IndexLocation,
    loader: Option<Box<dyn DocumentLoader>>,
}

impl IndexDocumentUseCase {
    pub fn new(
        embeddings: Arc<dyn EmbeddingProvider>,
        splitter: ChunkSplitter,
        location: IndexLocation,
    ) -> Self {
        Self {
            embeddings,
            splitter,
            location,
            loader: None,
        }
    }

    /// Uses `loader` for every file instead of choosing one by extension.
    pub fn with_loader(mut self, loader: Box<dyn DocumentLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn location(&self) -> &IndexLocation {
        &self.location
    }

    pub fn open_existing(&self) -> Result<Option<JsonVectorStore>, PipelineError> {
        let store = JsonVectorStore::open_existing(
            &self.location.persist_dir,
            self.location.collection.as_str(),
        )?;

        if let Some(store) = &store
            && store.embedding_model() != self.embeddings.model_id()
        {
            warn!(
                stored_model = store.embedding_model(),
                configured_model = self.embeddings.model_id(),
                "persisted index was built with a different embedding model"
            );
        }

        Ok(store)
    }

    /// Reuses a persisted index when present; otherwise `document` is required and indexed.
    pub fn execute(
        &self,
        document: Option<&Path>,
    ) -> Result<(JsonVectorStore, IndexOutcome), PipelineError> {
        if let Some(store) = self.open_existing()? {
            let chunks = store.len();
            info!(
                path = %store.path().display(),
                chunks,
                "reusing persisted vector index"
            );
            return Ok((store, IndexOutcome::Reused { chunks }));
        }

        let document = document.ok_or_else(|| {
            PipelineError::ingestion(format!(
                "no index found in {}; provide a document to build one",
                self.location.persist_dir.display()
            ))
        })?;

        self.build(document)
    }

    fn build(&self, document: &Path) -> Result<(JsonVectorStore, IndexOutcome), PipelineError> {
        let pages = match &self.loader {
            Some(loader) => loader.load(document)?,
            None => loader_for_path(document)?.load(document)?,
        };

        let chunks = self.splitter.split(&pages);
        if chunks.is_empty() {
            return Err(PipelineError::ingestion(format!(
                "{} produced no text chunks",
                document.display()
            )));
        }
        info!(
            document = %document.display(),
            pages = pages.len(),
            chunks = chunks.len(),
            chunk_size = self.splitter.chunk_size(),
            chunk_overlap = self.splitter.chunk_overlap(),
            "document split into chunks"
        );

        let texts = chunks
            .iter()
            .map(|chunk| chunk.text.clone())
            .collect::<Vec<_>>();
        let vectors = self.embeddings.embed(&texts)?;
        if vectors.len() != chunks.len() {
            return Err(PipelineError::embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            )));
        }

        let mut store = JsonVectorStore::create(
            &self.location.persist_dir,
            self.location.collection.as_str(),
            self.embeddings.model_id(),
        )?;
        let chunk_count = chunks.len();
        store.add(
            chunks
                .into_iter()
                .zip(vectors)
                .map(|(chunk, embedding)| StoredChunk { chunk, embedding })
                .collect(),
        )?;
        store.persist()?;
        info!(path = %store.path().display(), chunks = chunk_count, "vector index persisted");

        Ok((
            store,
            IndexOutcome::Built {
                pages: pages.len(),
                chunks: chunk_count,
            },
        ))
    }
}
