//! Cached ticket repository decorator.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use helpdesk_core::cache::{deserialize_ticket, serialize_ticket, ticket_key, Cache};
use helpdesk_core::storage::{Result, TicketFilter, TicketRepository};
use helpdesk_core::tickets::Ticket;

/// Cached ticket repository decorator.
///
/// Single-ticket reads go through the cache. Listings always hit the
/// repository because their result depends on the caller's scope.
///
/// # Type Parameters
///
/// * `R` - The underlying repository implementation
/// * `C` - The cache implementation
pub struct CachedTicketRepository<R, C>
where
    R: TicketRepository,
    C: Cache,
{
    repository: Arc<R>,
    cache: Arc<C>,
    ttl: Duration,
}

impl<R, C> CachedTicketRepository<R, C>
where
    R: TicketRepository,
    C: Cache,
{
    /// Creates a new cached ticket repository.
    pub fn new(repository: Arc<R>, cache: Arc<C>, ttl: Duration) -> Self {
        Self {
            repository,
            cache,
            ttl,
        }
    }

    async fn invalidate(&self, id: Uuid) {
        if let Err(err) = self.cache.delete(&ticket_key(id)).await {
            tracing::warn!(ticket_id = %id, error = %err, "Failed to invalidate ticket cache");
        }
    }
}

#[async_trait]
impl<R, C> TicketRepository for CachedTicketRepository<R, C>
where
    R: TicketRepository + 'static,
    C: Cache + 'static,
{
    async fn get_ticket(&self, id: Uuid) -> Result<Option<Ticket>> {
        let cache_key = ticket_key(id);

        if let Ok(Some(bytes)) = self.cache.get(&cache_key).await {
            if let Ok(ticket) = deserialize_ticket(&bytes) {
                tracing::trace!(ticket_id = %id, "Cache hit for ticket");
                return Ok(Some(ticket));
            }
            tracing::warn!(ticket_id = %id, "Cache ticket deserialization failed");
        }

        tracing::trace!(ticket_id = %id, "Cache miss for ticket");
        let ticket = self.repository.get_ticket(id).await?;

        if let Some(ref t) = ticket {
            if let Ok(bytes) = serialize_ticket(t) {
                if let Err(err) = self.cache.set(&cache_key, &bytes, Some(self.ttl)).await {
                    tracing::warn!(ticket_id = %id, error = %err, "Failed to cache ticket");
                }
            }
        }

        Ok(ticket)
    }

    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        self.repository.list_tickets(filter).await
    }

    async fn latest_ticket_code(&self, year: i32) -> Result<Option<String>> {
        self.repository.latest_ticket_code(year).await
    }

    async fn create_ticket(&self, ticket: &Ticket) -> Result<()> {
        self.repository.create_ticket(ticket).await?;
        tracing::debug!(ticket_id = %ticket.id, code = %ticket.code, "Ticket created");
        Ok(())
    }

    async fn update_ticket(&self, ticket: &Ticket) -> Result<()> {
        self.repository.update_ticket(ticket).await?;
        self.invalidate(ticket.id).await;

        tracing::debug!(ticket_id = %ticket.id, status = %ticket.status.as_str(), "Ticket updated");
        Ok(())
    }

    async fn delete_ticket(&self, id: Uuid) -> Result<()> {
        self.repository.delete_ticket(id).await?;
        self.invalidate(id).await;

        tracing::debug!(ticket_id = %id, "Ticket deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::RwLock;

    use helpdesk_core::tickets::TicketStatus;

    use crate::cache::MemoryCache;

    struct MockTicketRepository {
        tickets: RwLock<HashMap<Uuid, Ticket>>,
        get_calls: AtomicUsize,
    }

    impl MockTicketRepository {
        fn new() -> Self {
            Self {
                tickets: RwLock::new(HashMap::new()),
                get_calls: AtomicUsize::new(0),
            }
        }

        async fn insert(&self, ticket: Ticket) {
            self.tickets.write().await.insert(ticket.id, ticket);
        }
    }

    #[async_trait]
    impl TicketRepository for MockTicketRepository {
        async fn get_ticket(&self, id: Uuid) -> Result<Option<Ticket>> {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.tickets.read().await.get(&id).cloned())
        }

        async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
            Ok(self
                .tickets
                .read()
                .await
                .values()
                .filter(|t| filter.matches(t))
                .cloned()
                .collect())
        }

        async fn latest_ticket_code(&self, _year: i32) -> Result<Option<String>> {
            Ok(None)
        }

        async fn create_ticket(&self, ticket: &Ticket) -> Result<()> {
            self.insert(ticket.clone()).await;
            Ok(())
        }

        async fn update_ticket(&self, ticket: &Ticket) -> Result<()> {
            self.insert(ticket.clone()).await;
            Ok(())
        }

        async fn delete_ticket(&self, id: Uuid) -> Result<()> {
            self.tickets.write().await.remove(&id);
            Ok(())
        }
    }

    fn create_test_ticket() -> Ticket {
        Ticket::new(Uuid::new_v4(), "VPN down", "Cannot connect since 9am")
            .with_code("TKT-N001-2024")
    }

    fn setup() -> (
        Arc<MockTicketRepository>,
        Arc<MemoryCache>,
        CachedTicketRepository<MockTicketRepository, MemoryCache>,
    ) {
        let repo = Arc::new(MockTicketRepository::new());
        let cache = Arc::new(MemoryCache::new(100));
        let cached = CachedTicketRepository::new(repo.clone(), cache.clone(), Duration::from_secs(300));
        (repo, cache, cached)
    }

    #[tokio::test]
    async fn test_get_ticket_cache_miss_populates_cache() {
        let ticket = create_test_ticket();
        let (repo, cache, cached) = setup();
        repo.insert(ticket.clone()).await;

        let result = cached.get_ticket(ticket.id).await.unwrap();

        assert_eq!(result.map(|t| t.id), Some(ticket.id));
        assert_eq!(repo.get_calls.load(Ordering::SeqCst), 1);
        assert!(cache.get(&ticket_key(ticket.id)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_get_ticket_cache_hit() {
        let ticket = create_test_ticket();
        let (repo, _cache, cached) = setup();
        repo.insert(ticket.clone()).await;

        let _ = cached.get_ticket(ticket.id).await.unwrap();
        let result = cached.get_ticket(ticket.id).await.unwrap();

        assert_eq!(result.map(|t| t.code), Some("TKT-N001-2024".to_string()));
        assert_eq!(repo.get_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_ticket_is_not_cached() {
        let (repo, cache, cached) = setup();
        let id = Uuid::new_v4();

        assert!(cached.get_ticket(id).await.unwrap().is_none());
        assert!(cached.get_ticket(id).await.unwrap().is_none());

        assert_eq!(repo.get_calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_corrupt_cache_entry_falls_back_to_repository() {
        let ticket = create_test_ticket();
        let (repo, cache, cached) = setup();
        repo.insert(ticket.clone()).await;
        cache
            .set(&ticket_key(ticket.id), b"not json", None)
            .await
            .unwrap();

        let result = cached.get_ticket(ticket.id).await.unwrap();

        assert_eq!(result.map(|t| t.id), Some(ticket.id));
        assert_eq!(repo.get_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_update_ticket_invalidates_cache() {
        let ticket = create_test_ticket();
        let (repo, _cache, cached) = setup();
        repo.insert(ticket.clone()).await;
        let _ = cached.get_ticket(ticket.id).await.unwrap();

        let closed = ticket.clone().with_status(TicketStatus::Closed);
        cached.update_ticket(&closed).await.unwrap();

        let result = cached.get_ticket(ticket.id).await.unwrap().unwrap();
        assert_eq!(result.status, TicketStatus::Closed);
        assert_eq!(repo.get_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_delete_ticket_invalidates_cache() {
        let ticket = create_test_ticket();
        let (repo, cache, cached) = setup();
        repo.insert(ticket.clone()).await;
        let _ = cached.get_ticket(ticket.id).await.unwrap();

        cached.delete_ticket(ticket.id).await.unwrap();

        assert!(cache.get(&ticket_key(ticket.id)).await.unwrap().is_none());
        assert!(cached.get_ticket(ticket.id).await.unwrap().is_none());
    }
}
