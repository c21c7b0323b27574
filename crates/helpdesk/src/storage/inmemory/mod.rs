//! In-memory storage backend.
//!
//! Every table lives behind one `Arc<RwLock<_>>`, so a cascading delete is
//! applied under a single write lock and readers never observe half of it.
//! Data is not persisted and is lost when the repository is dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use helpdesk::storage::inmemory::InMemoryRepository;
//!
//! let repo = InMemoryRepository::new();
//! repo.create_user(&user, None).await?;
//! ```

mod repository;
mod tables;

pub use repository::InMemoryRepository;
