mod context_assembler;
mod index_document_use_case;
mod question_answering_service;
mod retriever;

pub use context_assembler::{ContextAssembler, DEFAULT_CONTEXT_BUDGET_CHARS};
pub use index_document_use_case::{IndexDocumentUseCase, IndexLocation, IndexOutcome};
pub use question_answering_service::{Answer, QuestionAnsweringService};
pub use retriever::{DEFAULT_TOP_K, Retriever};
