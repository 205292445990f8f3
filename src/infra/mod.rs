pub mod document;
pub mod embedding;
pub mod env;
pub mod llm;
pub mod logging;
pub mod text;
pub mod vector_store;
