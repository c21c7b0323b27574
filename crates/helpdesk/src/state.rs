//! Application state with repository-based storage.
//!
//! Handlers reach storage only through the repository trait objects held
//! here. The concrete backend is chosen by cargo feature; see `storage`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use helpdesk_core::media::CloudinaryUrlBuilder;
use helpdesk_core::storage::{
    InterventionRepository, MessageRepository, NotificationRepository, ProcedureRepository,
    RatingRepository, TicketRepository, UserRepository,
};

use crate::config::Config;

/// Shared application state.
///
/// Cloned for each request handler.
#[derive(Clone)]
pub struct AppState {
    /// Users and their client/technician profiles (cached).
    pub users: Arc<dyn UserRepository>,
    /// Tickets (cached).
    pub tickets: Arc<dyn TicketRepository>,
    pub interventions: Arc<dyn InterventionRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub ratings: Arc<dyn RatingRepository>,
    pub procedures: Arc<dyn ProcedureRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    /// Builds public URLs for stored media paths.
    pub media: CloudinaryUrlBuilder,
    /// Held while a ticket code is read and the ticket inserted, so two
    /// concurrent creations never compute the same code.
    pub ticket_codes: Arc<Mutex<()>>,
    /// Name of the compiled-in storage backend, reported by `/healthz`.
    pub storage_name: &'static str,
    pub request_timeout: Duration,
}

/// Anything that implements every repository trait.
trait Storage:
    UserRepository
    + TicketRepository
    + InterventionRepository
    + MessageRepository
    + RatingRepository
    + ProcedureRepository
    + NotificationRepository
{
}

impl<T> Storage for T where
    T: UserRepository
        + TicketRepository
        + InterventionRepository
        + MessageRepository
        + RatingRepository
        + ProcedureRepository
        + NotificationRepository
{
}

impl AppState {
    /// Wires a single backend behind every repository slot.
    ///
    /// Users and tickets go through their cache decorators.
    fn build<S>(storage: Arc<S>, storage_name: &'static str, config: &Config) -> Self
    where
        S: Storage + 'static,
    {
        use crate::cache::MemoryCache;
        use crate::storage::cached::{CachedTicketRepository, CachedUserRepository};

        let cache = Arc::new(MemoryCache::new(config.cache_max_entries));

        Self {
            users: Arc::new(CachedUserRepository::new(
                storage.clone(),
                cache.clone(),
                config.cache_ttl(),
            )),
            tickets: Arc::new(CachedTicketRepository::new(
                storage.clone(),
                cache,
                config.cache_ttl(),
            )),
            interventions: storage.clone(),
            messages: storage.clone(),
            ratings: storage.clone(),
            procedures: storage.clone(),
            notifications: storage,
            media: CloudinaryUrlBuilder::new(config.cloudinary_cloud_name.clone()),
            ticket_codes: Arc::new(Mutex::new(())),
            storage_name,
            request_timeout: config.request_timeout(),
        }
    }
}

// ============================================================================
// Backend-specific constructors
// ============================================================================

#[cfg(feature = "inmemory")]
mod inmemory {
    use super::*;
    use crate::storage::InMemoryRepository;

    impl AppState {
        pub async fn new(config: &Config) -> Result<Self, anyhow::Error> {
            tracing::info!("Using in-memory storage; data is lost on restart");
            Ok(Self::build(
                Arc::new(InMemoryRepository::new()),
                "inmemory",
                config,
            ))
        }
    }
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use crate::storage::SqliteRepository;

    impl AppState {
        pub async fn new(config: &Config) -> Result<Self, anyhow::Error> {
            let repo = SqliteRepository::new(&config.sqlite_path).await?;
            tracing::info!(path = %config.sqlite_path, "Using SQLite storage");
            Ok(Self::build(Arc::new(repo), "sqlite", config))
        }
    }
}

#[cfg(test)]
mod test_support {
    use super::*;
    use crate::storage::InMemoryRepository;

    impl Default for AppState {
        /// Creates an AppState over fresh in-memory storage for tests.
        fn default() -> Self {
            let config = Config {
                cache_ttl_seconds: 300,
                cache_max_entries: 1_000,
                sqlite_path: String::new(),
                cloudinary_cloud_name: "demo".to_string(),
                request_timeout_seconds: 10,
            };
            Self::build(Arc::new(InMemoryRepository::new()), "inmemory", &config)
        }
    }
}
