mod sanitize;
mod splitter;

pub use sanitize::{sanitize_bytes, sanitize_text};
pub use splitter::{ChunkSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
