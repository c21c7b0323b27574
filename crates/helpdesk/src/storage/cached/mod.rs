//! Cached repository decorators.
//!
//! Both decorators follow the cache-aside pattern:
//!
//! - **Reads**: check the cache, on a miss fetch from the repository and populate the cache
//! - **Writes**: persist to the repository, then invalidate the affected keys
//!
//! Only tickets and users are cached. Everything else passes straight through.
//!
//! # Example
//!
//! ```ignore
//! let repo = Arc::new(SqliteRepository::new("helpdesk.db").await?);
//! let cache = Arc::new(MemoryCache::new(10_000));
//!
//! let tickets = CachedTicketRepository::new(repo, cache, Duration::from_secs(300));
//! ```

mod ticket;
mod user;

pub use ticket::CachedTicketRepository;
pub use user::CachedUserRepository;
