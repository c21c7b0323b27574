use async_trait::async_trait;
use uuid::Uuid;

use crate::accounts::{ClientProfile, Profile, TechnicianProfile, User};
use crate::interventions::Intervention;
use crate::messages::Message;
use crate::notifications::Notification;
use crate::procedures::{
    Procedure, ProcedureAttachment, ProcedureImage, ProcedureInteraction, ProcedureTag,
};
use crate::ratings::{ClientRating, TechnicianRating};
use crate::tickets::Ticket;

use super::{ProcedureFilter, Result, TicketFilter};

/// Repository for accounts and their client/technician profiles.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Gets a user by their ID.
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Gets a user by their email address.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// All users, oldest first.
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Creates a user together with its profile, if any.
    ///
    /// Fails with `AlreadyExists` when the email or username is taken.
    async fn create_user(&self, user: &User, profile: Option<&Profile>) -> Result<()>;

    /// Updates an existing user.
    async fn update_user(&self, user: &User) -> Result<()>;

    /// Deletes a user and everything that belongs to them.
    ///
    /// Profiles, tickets, messages, notifications and ratings are removed.
    /// Authored procedures are kept with their author cleared.
    async fn delete_user(&self, id: Uuid) -> Result<()>;

    /// The profile attached to a user, if any.
    async fn get_profile_for_user(&self, user_id: Uuid) -> Result<Option<Profile>>;

    async fn get_client(&self, id: Uuid) -> Result<Option<ClientProfile>>;

    async fn list_clients(&self) -> Result<Vec<ClientProfile>>;

    async fn update_client(&self, client: &ClientProfile) -> Result<()>;

    /// Deletes a client profile and its tickets.
    async fn delete_client(&self, id: Uuid) -> Result<()>;

    async fn get_technician(&self, id: Uuid) -> Result<Option<TechnicianProfile>>;

    async fn list_technicians(&self) -> Result<Vec<TechnicianProfile>>;

    async fn update_technician(&self, technician: &TechnicianProfile) -> Result<()>;

    /// Deletes a technician profile. Tickets and interventions are unassigned.
    async fn delete_technician(&self, id: Uuid) -> Result<()>;
}

/// Repository for tickets.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn get_ticket(&self, id: Uuid) -> Result<Option<Ticket>>;

    /// Tickets matching the filter, newest first.
    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>>;

    /// Code of the most recently created ticket whose code ends with `-{year}`.
    async fn latest_ticket_code(&self, year: i32) -> Result<Option<String>>;

    async fn create_ticket(&self, ticket: &Ticket) -> Result<()>;

    async fn update_ticket(&self, ticket: &Ticket) -> Result<()>;

    /// Deletes a ticket with its interventions, messages and notifications.
    async fn delete_ticket(&self, id: Uuid) -> Result<()>;
}

/// Repository for interventions.
#[async_trait]
pub trait InterventionRepository: Send + Sync {
    async fn get_intervention(&self, id: Uuid) -> Result<Option<Intervention>>;

    /// Interventions, optionally restricted to one ticket.
    ///
    /// Ordered by newest intervention date, then newest creation.
    async fn list_interventions(&self, ticket_id: Option<Uuid>) -> Result<Vec<Intervention>>;

    async fn create_intervention(&self, intervention: &Intervention) -> Result<()>;

    async fn update_intervention(&self, intervention: &Intervention) -> Result<()>;

    async fn delete_intervention(&self, id: Uuid) -> Result<()>;
}

/// Repository for ticket messages.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Messages of a ticket, oldest first.
    async fn list_messages(&self, ticket_id: Uuid) -> Result<Vec<Message>>;

    async fn create_message(&self, message: &Message) -> Result<()>;
}

/// Repository for ratings in both directions.
#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Ratings received by a technician profile.
    async fn list_technician_ratings(&self, technician_id: Uuid) -> Result<Vec<TechnicianRating>>;

    /// Fails with `AlreadyExists` when the client already rated the technician.
    async fn create_technician_rating(&self, rating: &TechnicianRating) -> Result<()>;

    /// Ratings received by a client profile.
    async fn list_client_ratings(&self, client_id: Uuid) -> Result<Vec<ClientRating>>;

    /// Fails with `AlreadyExists` when the technician already rated the client.
    async fn create_client_rating(&self, rating: &ClientRating) -> Result<()>;
}

/// Repository for the knowledge base: procedures, tags and interactions.
#[async_trait]
pub trait ProcedureRepository: Send + Sync {
    async fn get_procedure(&self, id: Uuid) -> Result<Option<Procedure>>;

    async fn get_procedure_by_slug(&self, slug: &str) -> Result<Option<Procedure>>;

    /// Procedures matching the filter, featured first then newest.
    async fn list_procedures(&self, filter: &ProcedureFilter) -> Result<Vec<Procedure>>;

    /// Existing procedure slugs starting with `prefix`.
    async fn procedure_slugs_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    /// Fails with `AlreadyExists` when the slug is taken.
    async fn create_procedure(&self, procedure: &Procedure) -> Result<()>;

    /// Writes the editable fields of a procedure.
    ///
    /// Counters, images and attachments are left as stored; they change only
    /// through their own operations.
    async fn update_procedure(&self, procedure: &Procedure) -> Result<()>;

    async fn delete_procedure(&self, id: Uuid) -> Result<()>;

    /// All tags, ordered by name.
    async fn list_tags(&self) -> Result<Vec<ProcedureTag>>;

    /// Finds a tag by exact name or creates it with a unique slug.
    async fn get_or_create_tag(&self, name: &str) -> Result<ProcedureTag>;

    /// Tags of a procedure, ordered by name.
    async fn get_procedure_tags(&self, procedure_id: Uuid) -> Result<Vec<ProcedureTag>>;

    /// Replaces the tag set of a procedure.
    async fn set_procedure_tags(&self, procedure_id: Uuid, tag_ids: &[Uuid]) -> Result<()>;

    /// Procedures related to this one, in either direction.
    async fn get_related_procedures(&self, procedure_id: Uuid) -> Result<Vec<Procedure>>;

    /// Replaces the relations of a procedure. Relations are symmetric.
    async fn set_related_procedures(&self, procedure_id: Uuid, related_ids: &[Uuid])
        -> Result<()>;

    /// Records an interaction once per (user, procedure, kind).
    ///
    /// Returns true when the interaction is new, in which case the matching
    /// counter of the procedure was bumped in the same step.
    async fn record_interaction(&self, interaction: &ProcedureInteraction) -> Result<bool>;

    /// Appends an image to a procedure in one step.
    async fn add_procedure_image(&self, procedure_id: Uuid, image: &ProcedureImage) -> Result<()>;

    /// Appends an attachment to a procedure in one step.
    async fn add_procedure_attachment(
        &self,
        procedure_id: Uuid,
        attachment: &ProcedureAttachment,
    ) -> Result<()>;

    /// Increments the download counter of an attachment and returns it.
    async fn increment_attachment_downloads(
        &self,
        procedure_id: Uuid,
        attachment_id: Uuid,
    ) -> Result<ProcedureAttachment>;
}

/// Repository for in-app notifications.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn get_notification(&self, id: Uuid) -> Result<Option<Notification>>;

    /// Notifications of a user, newest first.
    async fn list_notifications(&self, user_id: Uuid, unread_only: bool)
        -> Result<Vec<Notification>>;

    async fn create_notifications(&self, notifications: &[Notification]) -> Result<()>;

    async fn mark_read(&self, id: Uuid) -> Result<()>;

    /// Marks every unread notification of a user as read. Returns how many changed.
    async fn mark_all_read(&self, user_id: Uuid) -> Result<usize>;

    async fn unread_count(&self, user_id: Uuid) -> Result<usize>;
}
