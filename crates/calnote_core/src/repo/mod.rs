//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage contracts the services depend on.
//! - Isolate SQLite and JSON encoding details from orchestration code.
//!
//! # Invariants
//! - Repositories require a migrated connection (`try_new` checks tables).
//! - Repository APIs distinguish transport errors (`Db`) from bad stored
//!   data (`InvalidData`).

pub mod kv_repo;
pub mod notebook_repo;

pub use kv_repo::{KeyValueStore, MemoryKeyValueStore, RepoError, RepoResult, SqliteKeyValueStore};
pub use notebook_repo::{KvNotebookRepository, NotebookRepository};
