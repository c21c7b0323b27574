//! Cached user repository decorator.
//!
//! Deleting a user or a profile cascades into tickets (removed or unassigned),
//! so those deletions also drop every cached ticket.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use helpdesk_core::accounts::{ClientProfile, Profile, TechnicianProfile, User};
use helpdesk_core::cache::{deserialize_user, serialize_user, tickets_pattern, user_key, Cache};
use helpdesk_core::storage::{Result, UserRepository};

/// Cached user repository decorator.
///
/// # Type Parameters
///
/// * `R` - The underlying repository implementation
/// * `C` - The cache implementation
pub struct CachedUserRepository<R, C>
where
    R: UserRepository,
    C: Cache,
{
    repository: Arc<R>,
    cache: Arc<C>,
    ttl: Duration,
}

impl<R, C> CachedUserRepository<R, C>
where
    R: UserRepository,
    C: Cache,
{
    /// Creates a new cached user repository.
    pub fn new(repository: Arc<R>, cache: Arc<C>, ttl: Duration) -> Self {
        Self {
            repository,
            cache,
            ttl,
        }
    }

    async fn invalidate_user(&self, id: Uuid) {
        if let Err(err) = self.cache.delete(&user_key(id)).await {
            tracing::warn!(user_id = %id, error = %err, "Failed to invalidate user cache");
        }
    }

    async fn invalidate_tickets(&self) {
        if let Err(err) = self.cache.delete_pattern(tickets_pattern()).await {
            tracing::warn!(error = %err, "Failed to invalidate ticket cache");
        }
    }
}

#[async_trait]
impl<R, C> UserRepository for CachedUserRepository<R, C>
where
    R: UserRepository + 'static,
    C: Cache + 'static,
{
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let cache_key = user_key(id);

        if let Ok(Some(bytes)) = self.cache.get(&cache_key).await {
            if let Ok(user) = deserialize_user(&bytes) {
                tracing::trace!(user_id = %id, "Cache hit for user");
                return Ok(Some(user));
            }
            tracing::warn!(user_id = %id, "Cache user deserialization failed");
        }

        tracing::trace!(user_id = %id, "Cache miss for user");
        let user = self.repository.get_user(id).await?;

        if let Some(ref u) = user {
            if let Ok(bytes) = serialize_user(u) {
                if let Err(err) = self.cache.set(&cache_key, &bytes, Some(self.ttl)).await {
                    tracing::warn!(user_id = %id, error = %err, "Failed to cache user");
                }
            }
        }

        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.repository.get_user_by_email(email).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.repository.list_users().await
    }

    async fn create_user(&self, user: &User, profile: Option<&Profile>) -> Result<()> {
        self.repository.create_user(user, profile).await?;
        tracing::debug!(user_id = %user.id, user_type = %user.user_type.as_str(), "User created");
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        self.repository.update_user(user).await?;
        self.invalidate_user(user.id).await;

        tracing::debug!(user_id = %user.id, "User updated");
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<()> {
        self.repository.delete_user(id).await?;
        self.invalidate_user(id).await;
        self.invalidate_tickets().await;

        tracing::debug!(user_id = %id, "User deleted");
        Ok(())
    }

    async fn get_profile_for_user(&self, user_id: Uuid) -> Result<Option<Profile>> {
        self.repository.get_profile_for_user(user_id).await
    }

    async fn get_client(&self, id: Uuid) -> Result<Option<ClientProfile>> {
        self.repository.get_client(id).await
    }

    async fn list_clients(&self) -> Result<Vec<ClientProfile>> {
        self.repository.list_clients().await
    }

    async fn update_client(&self, client: &ClientProfile) -> Result<()> {
        self.repository.update_client(client).await
    }

    async fn delete_client(&self, id: Uuid) -> Result<()> {
        self.repository.delete_client(id).await?;
        self.invalidate_tickets().await;

        tracing::debug!(client_id = %id, "Client profile deleted");
        Ok(())
    }

    async fn get_technician(&self, id: Uuid) -> Result<Option<TechnicianProfile>> {
        self.repository.get_technician(id).await
    }

    async fn list_technicians(&self) -> Result<Vec<TechnicianProfile>> {
        self.repository.list_technicians().await
    }

    async fn update_technician(&self, technician: &TechnicianProfile) -> Result<()> {
        self.repository.update_technician(technician).await
    }

    async fn delete_technician(&self, id: Uuid) -> Result<()> {
        self.repository.delete_technician(id).await?;
        self.invalidate_tickets().await;

        tracing::debug!(technician_id = %id, "Technician profile deleted");
        Ok(())
    }
}
