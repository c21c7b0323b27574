//! In-memory repository implementation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use helpdesk_core::accounts::{ClientProfile, Profile, TechnicianProfile, User};
use helpdesk_core::interventions::{sort_interventions, Intervention};
use helpdesk_core::messages::{sort_messages, Message};
use helpdesk_core::notifications::{sort_notifications, Notification};
use helpdesk_core::procedures::{
    apply_interaction, slugify, sort_procedures, unique_slug, Procedure, ProcedureAttachment,
    ProcedureImage, ProcedureInteraction, ProcedureTag,
};
use helpdesk_core::ratings::{ClientRating, TechnicianRating};
use helpdesk_core::storage::{
    relation_key, InterventionRepository, MessageRepository, NotificationRepository,
    ProcedureFilter, ProcedureRepository, RatingRepository, RepositoryError, Result,
    TicketFilter, TicketRepository, UserRepository,
};
use helpdesk_core::tickets::{sort_tickets_newest_first, ticket_code_suffix, Ticket};

use super::tables::Tables;

/// In-memory storage backend.
///
/// All tables share one `Arc<RwLock<_>>`. Cloning the repository shares
/// the underlying data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn create_user(&self, user: &User, profile: Option<&Profile>) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.id) || tables.identity_taken(user) {
            return Err(RepositoryError::already_exists("User", &user.email));
        }
        tables.users.insert(user.id, user.clone());
        if let Some(profile) = profile {
            tables.insert_profile(profile);
        }
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user.id) {
            return Err(RepositoryError::not_found("User", user.id));
        }
        if tables.identity_taken(user) {
            return Err(RepositoryError::already_exists("User", &user.email));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .remove_user(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found("User", id))
    }

    async fn get_profile_for_user(&self, user_id: Uuid) -> Result<Option<Profile>> {
        Ok(self.tables.read().await.profile_for_user(user_id))
    }

    async fn get_client(&self, id: Uuid) -> Result<Option<ClientProfile>> {
        Ok(self.tables.read().await.clients.get(&id).cloned())
    }

    async fn list_clients(&self) -> Result<Vec<ClientProfile>> {
        let tables = self.tables.read().await;
        let mut clients: Vec<ClientProfile> = tables.clients.values().cloned().collect();
        clients.sort_by_key(|c| c.created_at);
        Ok(clients)
    }

    async fn update_client(&self, client: &ClientProfile) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.clients.get_mut(&client.id) {
            Some(existing) => {
                *existing = client.clone();
                Ok(())
            }
            None => Err(RepositoryError::not_found("Client", client.id)),
        }
    }

    async fn delete_client(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .remove_client(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found("Client", id))
    }

    async fn get_technician(&self, id: Uuid) -> Result<Option<TechnicianProfile>> {
        Ok(self.tables.read().await.technicians.get(&id).cloned())
    }

    async fn list_technicians(&self) -> Result<Vec<TechnicianProfile>> {
        let tables = self.tables.read().await;
        let mut technicians: Vec<TechnicianProfile> =
            tables.technicians.values().cloned().collect();
        technicians.sort_by_key(|t| t.created_at);
        Ok(technicians)
    }

    async fn update_technician(&self, technician: &TechnicianProfile) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.technicians.get_mut(&technician.id) {
            Some(existing) => {
                *existing = technician.clone();
                Ok(())
            }
            None => Err(RepositoryError::not_found("Technician", technician.id)),
        }
    }

    async fn delete_technician(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .remove_technician(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found("Technician", id))
    }
}

#[async_trait]
impl TicketRepository for InMemoryRepository {
    async fn get_ticket(&self, id: Uuid) -> Result<Option<Ticket>> {
        Ok(self.tables.read().await.tickets.get(&id).cloned())
    }

    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        let tables = self.tables.read().await;
        let mut tickets: Vec<Ticket> = tables
            .tickets
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        sort_tickets_newest_first(&mut tickets);
        Ok(tickets)
    }

    async fn latest_ticket_code(&self, year: i32) -> Result<Option<String>> {
        let suffix = ticket_code_suffix(year);
        let tables = self.tables.read().await;
        Ok(tables
            .tickets
            .values()
            .filter(|t| t.code.ends_with(&suffix))
            .max_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.code.cmp(&b.code))
            })
            .map(|t| t.code.clone()))
    }

    async fn create_ticket(&self, ticket: &Ticket) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.tickets.contains_key(&ticket.id) {
            return Err(RepositoryError::already_exists("Ticket", ticket.id));
        }
        if tables.tickets.values().any(|t| t.code == ticket.code) {
            return Err(RepositoryError::already_exists("Ticket", &ticket.code));
        }
        tables.tickets.insert(ticket.id, ticket.clone());
        Ok(())
    }

    async fn update_ticket(&self, ticket: &Ticket) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.tickets.get_mut(&ticket.id) {
            Some(existing) => {
                *existing = ticket.clone();
                Ok(())
            }
            None => Err(RepositoryError::not_found("Ticket", ticket.id)),
        }
    }

    async fn delete_ticket(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .remove_ticket(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found("Ticket", id))
    }
}

#[async_trait]
impl InterventionRepository for InMemoryRepository {
    async fn get_intervention(&self, id: Uuid) -> Result<Option<Intervention>> {
        Ok(self.tables.read().await.interventions.get(&id).cloned())
    }

    async fn list_interventions(&self, ticket_id: Option<Uuid>) -> Result<Vec<Intervention>> {
        let tables = self.tables.read().await;
        let mut interventions: Vec<Intervention> = tables
            .interventions
            .values()
            .filter(|i| ticket_id.is_none_or(|id| i.ticket_id == id))
            .cloned()
            .collect();
        sort_interventions(&mut interventions);
        Ok(interventions)
    }

    async fn create_intervention(&self, intervention: &Intervention) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.interventions.contains_key(&intervention.id) {
            return Err(RepositoryError::already_exists("Intervention", intervention.id));
        }
        if !tables.tickets.contains_key(&intervention.ticket_id) {
            return Err(RepositoryError::not_found("Ticket", intervention.ticket_id));
        }
        tables
            .interventions
            .insert(intervention.id, intervention.clone());
        Ok(())
    }

    async fn update_intervention(&self, intervention: &Intervention) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.interventions.get_mut(&intervention.id) {
            Some(existing) => {
                *existing = intervention.clone();
                Ok(())
            }
            None => Err(RepositoryError::not_found("Intervention", intervention.id)),
        }
    }

    async fn delete_intervention(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .interventions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found("Intervention", id))
    }
}

#[async_trait]
impl MessageRepository for InMemoryRepository {
    async fn list_messages(&self, ticket_id: Uuid) -> Result<Vec<Message>> {
        let tables = self.tables.read().await;
        let mut messages: Vec<Message> = tables
            .messages
            .values()
            .filter(|m| m.ticket_id == ticket_id)
            .cloned()
            .collect();
        sort_messages(&mut messages);
        Ok(messages)
    }

    async fn create_message(&self, message: &Message) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.tickets.contains_key(&message.ticket_id) {
            return Err(RepositoryError::not_found("Ticket", message.ticket_id));
        }
        tables.messages.insert(message.id, message.clone());
        Ok(())
    }
}

#[async_trait]
impl RatingRepository for InMemoryRepository {
    async fn list_technician_ratings(&self, technician_id: Uuid) -> Result<Vec<TechnicianRating>> {
        let tables = self.tables.read().await;
        let mut ratings: Vec<TechnicianRating> = tables
            .technician_ratings
            .values()
            .filter(|r| r.technician_id == technician_id)
            .cloned()
            .collect();
        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ratings)
    }

    async fn create_technician_rating(&self, rating: &TechnicianRating) -> Result<()> {
        let mut tables = self.tables.write().await;
        let duplicate = tables
            .technician_ratings
            .values()
            .any(|r| r.technician_id == rating.technician_id && r.client_id == rating.client_id);
        if duplicate {
            return Err(RepositoryError::already_exists(
                "TechnicianRating",
                format!("{}:{}", rating.technician_id, rating.client_id),
            ));
        }
        tables.technician_ratings.insert(rating.id, rating.clone());
        Ok(())
    }

    async fn list_client_ratings(&self, client_id: Uuid) -> Result<Vec<ClientRating>> {
        let tables = self.tables.read().await;
        let mut ratings: Vec<ClientRating> = tables
            .client_ratings
            .values()
            .filter(|r| r.client_id == client_id)
            .cloned()
            .collect();
        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ratings)
    }

    async fn create_client_rating(&self, rating: &ClientRating) -> Result<()> {
        let mut tables = self.tables.write().await;
        let duplicate = tables
            .client_ratings
            .values()
            .any(|r| r.client_id == rating.client_id && r.technician_id == rating.technician_id);
        if duplicate {
            return Err(RepositoryError::already_exists(
                "ClientRating",
                format!("{}:{}", rating.client_id, rating.technician_id),
            ));
        }
        tables.client_ratings.insert(rating.id, rating.clone());
        Ok(())
    }
}

#[async_trait]
impl ProcedureRepository for InMemoryRepository {
    async fn get_procedure(&self, id: Uuid) -> Result<Option<Procedure>> {
        Ok(self.tables.read().await.procedures.get(&id).cloned())
    }

    async fn get_procedure_by_slug(&self, slug: &str) -> Result<Option<Procedure>> {
        let tables = self.tables.read().await;
        Ok(tables.procedures.values().find(|p| p.slug == slug).cloned())
    }

    async fn list_procedures(&self, filter: &ProcedureFilter) -> Result<Vec<Procedure>> {
        let tables = self.tables.read().await;
        let mut procedures: Vec<Procedure> = tables
            .procedures
            .values()
            .filter(|p| filter.matches(p, &tables.tag_slugs_of(p.id)))
            .cloned()
            .collect();
        sort_procedures(&mut procedures);
        Ok(procedures)
    }

    async fn procedure_slugs_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let tables = self.tables.read().await;
        Ok(tables
            .procedures
            .values()
            .filter(|p| p.slug.starts_with(prefix))
            .map(|p| p.slug.clone())
            .collect())
    }

    async fn create_procedure(&self, procedure: &Procedure) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.procedures.contains_key(&procedure.id) {
            return Err(RepositoryError::already_exists("Procedure", procedure.id));
        }
        if tables.procedures.values().any(|p| p.slug == procedure.slug) {
            return Err(RepositoryError::already_exists("Procedure", &procedure.slug));
        }
        tables.procedures.insert(procedure.id, procedure.clone());
        Ok(())
    }

    async fn update_procedure(&self, procedure: &Procedure) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables
            .procedures
            .values()
            .any(|p| p.id != procedure.id && p.slug == procedure.slug)
        {
            return Err(RepositoryError::already_exists("Procedure", &procedure.slug));
        }
        let Some(stored) = tables.procedures.get_mut(&procedure.id) else {
            return Err(RepositoryError::not_found("Procedure", procedure.id));
        };
        let mut updated = procedure.clone();
        updated.views = stored.views;
        updated.likes = stored.likes;
        updated.bookmarks = stored.bookmarks;
        updated.images = std::mem::take(&mut stored.images);
        updated.attachments = std::mem::take(&mut stored.attachments);
        *stored = updated;
        Ok(())
    }

    async fn delete_procedure(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .remove_procedure(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found("Procedure", id))
    }

    async fn list_tags(&self) -> Result<Vec<ProcedureTag>> {
        let tables = self.tables.read().await;
        let mut tags: Vec<ProcedureTag> = tables.tags.values().cloned().collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn get_or_create_tag(&self, name: &str) -> Result<ProcedureTag> {
        let mut tables = self.tables.write().await;
        if let Some(tag) = tables.tags.values().find(|t| t.name == name) {
            return Ok(tag.clone());
        }
        let slug = unique_slug(&slugify(name), |candidate| {
            tables.tags.values().any(|t| t.slug == candidate)
        });
        let tag = ProcedureTag::new(name, slug);
        tables.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn get_procedure_tags(&self, procedure_id: Uuid) -> Result<Vec<ProcedureTag>> {
        let tables = self.tables.read().await;
        let mut tags: Vec<ProcedureTag> = tables
            .procedure_tags
            .iter()
            .filter(|(p, _)| *p == procedure_id)
            .filter_map(|(_, t)| tables.tags.get(t).cloned())
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn set_procedure_tags(&self, procedure_id: Uuid, tag_ids: &[Uuid]) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.procedures.contains_key(&procedure_id) {
            return Err(RepositoryError::not_found("Procedure", procedure_id));
        }
        if let Some(missing) = tag_ids.iter().find(|id| !tables.tags.contains_key(id)) {
            return Err(RepositoryError::not_found("ProcedureTag", missing));
        }
        tables.procedure_tags.retain(|(p, _)| *p != procedure_id);
        for tag_id in tag_ids {
            tables.procedure_tags.insert((procedure_id, *tag_id));
        }
        Ok(())
    }

    async fn get_related_procedures(&self, procedure_id: Uuid) -> Result<Vec<Procedure>> {
        let tables = self.tables.read().await;
        let mut related: Vec<Procedure> = tables
            .relations
            .iter()
            .filter_map(|(a, b)| match (*a == procedure_id, *b == procedure_id) {
                (true, _) => Some(*b),
                (_, true) => Some(*a),
                _ => None,
            })
            .filter_map(|id| tables.procedures.get(&id).cloned())
            .collect();
        related.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(related)
    }

    async fn set_related_procedures(
        &self,
        procedure_id: Uuid,
        related_ids: &[Uuid],
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.procedures.contains_key(&procedure_id) {
            return Err(RepositoryError::not_found("Procedure", procedure_id));
        }
        if let Some(missing) = related_ids
            .iter()
            .find(|id| !tables.procedures.contains_key(id))
        {
            return Err(RepositoryError::not_found("Procedure", missing));
        }
        tables
            .relations
            .retain(|(a, b)| *a != procedure_id && *b != procedure_id);
        for related_id in related_ids {
            tables
                .relations
                .insert(relation_key(procedure_id, *related_id));
        }
        Ok(())
    }

    async fn record_interaction(&self, interaction: &ProcedureInteraction) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let key = (
            interaction.user_id,
            interaction.procedure_id,
            interaction.kind,
        );
        if tables.interactions.contains_key(&key) {
            return Ok(false);
        }
        let Some(procedure) = tables.procedures.get_mut(&interaction.procedure_id) else {
            return Err(RepositoryError::not_found(
                "Procedure",
                interaction.procedure_id,
            ));
        };
        apply_interaction(procedure, interaction.kind);
        tables.interactions.insert(key, interaction.clone());
        Ok(true)
    }

    async fn add_procedure_image(&self, procedure_id: Uuid, image: &ProcedureImage) -> Result<()> {
        let mut tables = self.tables.write().await;
        let procedure = tables
            .procedures
            .get_mut(&procedure_id)
            .ok_or_else(|| RepositoryError::not_found("Procedure", procedure_id))?;
        procedure.images.push(image.clone());
        Ok(())
    }

    async fn add_procedure_attachment(
        &self,
        procedure_id: Uuid,
        attachment: &ProcedureAttachment,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        let procedure = tables
            .procedures
            .get_mut(&procedure_id)
            .ok_or_else(|| RepositoryError::not_found("Procedure", procedure_id))?;
        procedure.attachments.push(attachment.clone());
        Ok(())
    }

    async fn increment_attachment_downloads(
        &self,
        procedure_id: Uuid,
        attachment_id: Uuid,
    ) -> Result<ProcedureAttachment> {
        let mut tables = self.tables.write().await;
        let attachment = tables
            .procedures
            .get_mut(&procedure_id)
            .and_then(|p| p.attachments.iter_mut().find(|a| a.id == attachment_id))
            .ok_or_else(|| RepositoryError::not_found("ProcedureAttachment", attachment_id))?;
        attachment.downloads += 1;
        Ok(attachment.clone())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryRepository {
    async fn get_notification(&self, id: Uuid) -> Result<Option<Notification>> {
        Ok(self.tables.read().await.notifications.get(&id).cloned())
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>> {
        let tables = self.tables.read().await;
        let mut notifications: Vec<Notification> = tables
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        sort_notifications(&mut notifications);
        Ok(notifications)
    }

    async fn create_notifications(&self, notifications: &[Notification]) -> Result<()> {
        let mut tables = self.tables.write().await;
        for notification in notifications {
            tables
                .notifications
                .insert(notification.id, notification.clone());
        }
        Ok(())
    }

    async fn mark_read(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.notifications.get_mut(&id) {
            Some(notification) => {
                notification.is_read = true;
                Ok(())
            }
            None => Err(RepositoryError::not_found("Notification", id)),
        }
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<usize> {
        let mut tables = self.tables.write().await;
        let mut changed = 0;
        for notification in tables.notifications.values_mut() {
            if notification.user_id == user_id && !notification.is_read {
                notification.is_read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<usize> {
        let tables = self.tables.read().await;
        Ok(tables
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count())
    }
}
