// src/core/mod.rs
mod snapshot;
mod analyzer;
mod filter;
mod classifier;
mod chunker;
mod prompts;
mod orchestrator;
mod merge;
mod refine;
mod session;
mod repository;
mod service;
mod engine;
mod llm;

#[cfg(test)]
mod test_support;

pub use snapshot::{FileRecord, RepositorySnapshot};
pub use chunker::{Chunk, ChunkBuilder, reconstruct_file_paths};
pub use session::{create_session_store, SessionKey, SessionStore};
pub use repository::{load_snapshot_file, RepositoryProvider};
pub use service::{DocumentationOutcome, DocumentationService};
pub use llm::{create_generator, TextGenerator};

// Export the main engine
pub use engine::{Engine, SnapshotSource};
