//! SQLite repository implementation.
//!
//! Implements the repository traits from `helpdesk_core::storage` using SQLite.
//! Cascading deletes are left to the foreign keys declared in the schema.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio_rusqlite::Connection;
use uuid::Uuid;

use helpdesk_core::accounts::{ClientProfile, Profile, TechnicianProfile, User};
use helpdesk_core::interventions::Intervention;
use helpdesk_core::messages::Message;
use helpdesk_core::notifications::Notification;
use helpdesk_core::procedures::{
    slugify, unique_slug, InteractionKind, Procedure, ProcedureAttachment, ProcedureImage,
    ProcedureInteraction, ProcedureTag,
};
use helpdesk_core::ratings::{ClientRating, TechnicianRating};
use helpdesk_core::storage::{
    relation_key, InterventionRepository, MessageRepository, NotificationRepository,
    ProcedureFilter, ProcedureRepository, RatingRepository, RepositoryError, Result,
    TicketFilter, TicketRepository, UserRepository,
};
use helpdesk_core::tickets::{ticket_code_suffix, Ticket};

use super::conversions::{
    count_to_sql, format_date, format_datetime, format_time, row_to_client,
    row_to_client_rating, row_to_intervention, row_to_message, row_to_notification,
    row_to_procedure, row_to_tag, row_to_technician, row_to_technician_rating, row_to_ticket,
    row_to_user, to_json,
};
use super::error::{map_tokio_rusqlite_error, map_tokio_rusqlite_error_with_id};
use super::schema;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// Reads a JSON list column, lets `edit` change it and writes it back,
/// all in one transaction.
fn edit_json_list<T, R>(
    conn: &mut rusqlite::Connection,
    select: &str,
    update: &str,
    id: &str,
    edit: impl FnOnce(&mut Vec<T>) -> std::result::Result<R, tokio_rusqlite::Error>,
) -> std::result::Result<R, tokio_rusqlite::Error>
where
    T: Serialize + DeserializeOwned,
{
    let tx = conn.transaction().map_err(wrap_err)?;
    let json: String = tx
        .query_row(select, [id], |row| row.get(0))
        .map_err(wrap_err)?;
    let mut items: Vec<T> =
        serde_json::from_str(&json).map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
    let result = edit(&mut items)?;
    let json =
        serde_json::to_string(&items).map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
    tx.execute(update, rusqlite::params![id, json])
        .map_err(wrap_err)?;
    tx.commit().map_err(wrap_err)?;
    Ok(result)
}

/// Collects mapped rows, stopping at the first failure.
fn collect_rows<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> std::result::Result<Vec<T>, tokio_rusqlite::Error> {
    rows.map(|row| row.map_err(wrap_err)).collect()
}

/// Turns "no rows" into `None`.
fn optional<T>(result: rusqlite::Result<T>) -> std::result::Result<Option<T>, tokio_rusqlite::Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(wrap_err(e)),
    }
}

/// Fails with "no rows" when an UPDATE or DELETE touched nothing.
fn require_rows(rows: usize) -> std::result::Result<(), tokio_rusqlite::Error> {
    if rows == 0 {
        Err(wrap_err(rusqlite::Error::QueryReturnedNoRows))
    } else {
        Ok(())
    }
}

fn insert_profile(conn: &rusqlite::Connection, profile: &Profile) -> rusqlite::Result<usize> {
    match profile {
        Profile::Client(c) => conn.execute(
            schema::INSERT_CLIENT,
            rusqlite::params![
                c.id.to_string(),
                c.user_id.to_string(),
                c.company,
                format_datetime(&c.created_at)
            ],
        ),
        Profile::Technician(t) => conn.execute(
            schema::INSERT_TECHNICIAN,
            rusqlite::params![
                t.id.to_string(),
                t.user_id.to_string(),
                t.specialty.map(|s| s.as_str()),
                format_datetime(&t.created_at)
            ],
        ),
    }
}

/// SQLite-based repository implementation.
///
/// Provides async access to SQLite storage for all entity types.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Creates a new repository with a file-based database.
    ///
    /// The database file will be created if it doesn't exist.
    /// Schema tables are created automatically.
    pub async fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Creates a new repository with an in-memory database.
    ///
    /// Useful for testing - data is lost when the connection is dropped.
    pub async fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Initialize the database schema and enable foreign keys.
    async fn init_schema(conn: &Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(schema::CREATE_TABLES)
                .map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    }
}

// ============================================================================
// UserRepository implementation
// ============================================================================

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(schema::SELECT_USER_BY_ID).map_err(wrap_err)?;
                optional(stmt.query_row([&id_str], row_to_user))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "User", id.to_string()))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_USER_BY_EMAIL)
                    .map_err(wrap_err)?;
                optional(stmt.query_row([&email], row_to_user))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "User"))
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.conn
            .call(|conn| {
                let mut stmt = conn.prepare(schema::SELECT_ALL_USERS).map_err(wrap_err)?;
                let rows = stmt.query_map([], row_to_user).map_err(wrap_err)?;
                collect_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "User"))
    }

    async fn create_user(&self, user: &User, profile: Option<&Profile>) -> Result<()> {
        let user = user.clone();
        let profile = profile.cloned();
        let email = user.email.clone();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                tx.execute(
                    schema::INSERT_USER,
                    rusqlite::params![
                        user.id.to_string(),
                        user.username,
                        user.first_name,
                        user.last_name,
                        user.email,
                        user.phone,
                        user.user_type.as_str(),
                        user.avatar,
                        user.bio,
                        user.email_verified,
                        user.is_superuser,
                        user.is_active,
                        format_datetime(&user.created_at),
                        format_datetime(&user.updated_at)
                    ],
                )
                .map_err(wrap_err)?;
                if let Some(profile) = &profile {
                    insert_profile(&tx, profile).map_err(wrap_err)?;
                }
                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "User", email))
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let user = user.clone();
        let user_id = user.id.to_string();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(
                        schema::UPDATE_USER,
                        rusqlite::params![
                            user.id.to_string(),
                            user.username,
                            user.first_name,
                            user.last_name,
                            user.email,
                            user.phone,
                            user.user_type.as_str(),
                            user.avatar,
                            user.bio,
                            user.email_verified,
                            user.is_superuser,
                            user.is_active,
                            format_datetime(&user.updated_at)
                        ],
                    )
                    .map_err(wrap_err)?;
                require_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "User", user_id))
    }

    async fn delete_user(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(schema::DELETE_USER, [&id_str])
                    .map_err(wrap_err)?;
                require_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "User", id.to_string()))
    }

    async fn get_profile_for_user(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let id_str = user_id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_CLIENT_BY_USER)
                    .map_err(wrap_err)?;
                if let Some(client) = optional(stmt.query_row([&id_str], row_to_client))? {
                    return Ok(Some(Profile::Client(client)));
                }
                let mut stmt = conn
                    .prepare(schema::SELECT_TECHNICIAN_BY_USER)
                    .map_err(wrap_err)?;
                Ok(optional(stmt.query_row([&id_str], row_to_technician))?
                    .map(Profile::Technician))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Profile", user_id.to_string()))
    }

    async fn get_client(&self, id: Uuid) -> Result<Option<ClientProfile>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_CLIENT_BY_ID)
                    .map_err(wrap_err)?;
                optional(stmt.query_row([&id_str], row_to_client))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Client", id.to_string()))
    }

    async fn list_clients(&self) -> Result<Vec<ClientProfile>> {
        self.conn
            .call(|conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_ALL_CLIENTS)
                    .map_err(wrap_err)?;
                let rows = stmt.query_map([], row_to_client).map_err(wrap_err)?;
                collect_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Client"))
    }

    async fn update_client(&self, client: &ClientProfile) -> Result<()> {
        let id_str = client.id.to_string();
        let company = client.company.clone();
        let client_id = client.id.to_string();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(schema::UPDATE_CLIENT, rusqlite::params![id_str, company])
                    .map_err(wrap_err)?;
                require_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Client", client_id))
    }

    async fn delete_client(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(schema::DELETE_CLIENT, [&id_str])
                    .map_err(wrap_err)?;
                require_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Client", id.to_string()))
    }

    async fn get_technician(&self, id: Uuid) -> Result<Option<TechnicianProfile>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_TECHNICIAN_BY_ID)
                    .map_err(wrap_err)?;
                optional(stmt.query_row([&id_str], row_to_technician))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Technician", id.to_string()))
    }

    async fn list_technicians(&self) -> Result<Vec<TechnicianProfile>> {
        self.conn
            .call(|conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_ALL_TECHNICIANS)
                    .map_err(wrap_err)?;
                let rows = stmt.query_map([], row_to_technician).map_err(wrap_err)?;
                collect_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Technician"))
    }

    async fn update_technician(&self, technician: &TechnicianProfile) -> Result<()> {
        let id_str = technician.id.to_string();
        let specialty = technician.specialty.map(|s| s.as_str());
        let technician_id = technician.id.to_string();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(
                        schema::UPDATE_TECHNICIAN,
                        rusqlite::params![id_str, specialty],
                    )
                    .map_err(wrap_err)?;
                require_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Technician", technician_id))
    }

    async fn delete_technician(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(schema::DELETE_TECHNICIAN, [&id_str])
                    .map_err(wrap_err)?;
                require_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Technician", id.to_string()))
    }
}

// ============================================================================
// TicketRepository implementation
// ============================================================================

#[async_trait]
impl TicketRepository for SqliteRepository {
    async fn get_ticket(&self, id: Uuid) -> Result<Option<Ticket>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_TICKET_BY_ID)
                    .map_err(wrap_err)?;
                optional(stmt.query_row([&id_str], row_to_ticket))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Ticket", id.to_string()))
    }

    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        let filter = *filter;

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(schema::SELECT_ALL_TICKETS).map_err(wrap_err)?;
                let rows = stmt.query_map([], row_to_ticket).map_err(wrap_err)?;
                let mut tickets = collect_rows(rows)?;
                tickets.retain(|t| filter.matches(t));
                Ok(tickets)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Ticket"))
    }

    async fn latest_ticket_code(&self, year: i32) -> Result<Option<String>> {
        let pattern = format!("%{}", ticket_code_suffix(year));

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_LATEST_TICKET_CODE)
                    .map_err(wrap_err)?;
                optional(stmt.query_row([&pattern], |row| row.get::<_, String>(0)))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Ticket"))
    }

    async fn create_ticket(&self, ticket: &Ticket) -> Result<()> {
        let images = to_json(&ticket.images)?;
        let ticket = ticket.clone();
        let ticket_id = ticket.id.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_TICKET,
                    rusqlite::params![
                        ticket.id.to_string(),
                        ticket.code,
                        ticket.title,
                        ticket.description,
                        ticket.material_name,
                        ticket.problem_start_date.as_ref().map(format_datetime),
                        ticket.problem_type,
                        ticket.status.as_str(),
                        ticket.priority.as_str(),
                        ticket.tags,
                        ticket.attachment,
                        ticket.client_id.to_string(),
                        ticket.technician_id.map(|id| id.to_string()),
                        images,
                        format_datetime(&ticket.created_at),
                        format_datetime(&ticket.updated_at)
                    ],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Ticket", ticket_id))
    }

    async fn update_ticket(&self, ticket: &Ticket) -> Result<()> {
        let images = to_json(&ticket.images)?;
        let ticket = ticket.clone();
        let ticket_id = ticket.id.to_string();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(
                        schema::UPDATE_TICKET,
                        rusqlite::params![
                            ticket.id.to_string(),
                            ticket.title,
                            ticket.description,
                            ticket.material_name,
                            ticket.problem_start_date.as_ref().map(format_datetime),
                            ticket.problem_type,
                            ticket.status.as_str(),
                            ticket.priority.as_str(),
                            ticket.tags,
                            ticket.attachment,
                            ticket.client_id.to_string(),
                            ticket.technician_id.map(|id| id.to_string()),
                            images,
                            format_datetime(&ticket.updated_at)
                        ],
                    )
                    .map_err(wrap_err)?;
                require_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Ticket", ticket_id))
    }

    async fn delete_ticket(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(schema::DELETE_TICKET, [&id_str])
                    .map_err(wrap_err)?;
                require_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Ticket", id.to_string()))
    }
}

// ============================================================================
// InterventionRepository implementation
// ============================================================================

/// JSON columns of an intervention: materials, expenses, images.
fn intervention_children(intervention: &Intervention) -> Result<(String, String, String)> {
    Ok((
        to_json(&intervention.materials)?,
        to_json(&intervention.expenses)?,
        to_json(&intervention.images)?,
    ))
}

#[async_trait]
impl InterventionRepository for SqliteRepository {
    async fn get_intervention(&self, id: Uuid) -> Result<Option<Intervention>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_INTERVENTION_BY_ID)
                    .map_err(wrap_err)?;
                optional(stmt.query_row([&id_str], row_to_intervention))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Intervention", id.to_string()))
    }

    async fn list_interventions(&self, ticket_id: Option<Uuid>) -> Result<Vec<Intervention>> {
        let ticket_id = ticket_id.map(|id| id.to_string());

        self.conn
            .call(move |conn| match ticket_id {
                Some(ticket_id) => {
                    let mut stmt = conn
                        .prepare(schema::SELECT_INTERVENTIONS_BY_TICKET)
                        .map_err(wrap_err)?;
                    let rows = stmt
                        .query_map([&ticket_id], row_to_intervention)
                        .map_err(wrap_err)?;
                    collect_rows(rows)
                }
                None => {
                    let mut stmt = conn
                        .prepare(schema::SELECT_ALL_INTERVENTIONS)
                        .map_err(wrap_err)?;
                    let rows = stmt.query_map([], row_to_intervention).map_err(wrap_err)?;
                    collect_rows(rows)
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Intervention"))
    }

    async fn create_intervention(&self, intervention: &Intervention) -> Result<()> {
        let (materials, expenses, images) = intervention_children(intervention)?;
        let i = intervention.clone();
        let intervention_id = i.id.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_INTERVENTION,
                    rusqlite::params![
                        i.id.to_string(),
                        i.ticket_id.to_string(),
                        i.technician_id.map(|id| id.to_string()),
                        i.code,
                        i.report,
                        format_date(&i.intervention_date),
                        i.start_time.as_ref().map(format_time),
                        i.end_time.as_ref().map(format_time),
                        i.transport_cost.to_string(),
                        i.additional_costs.to_string(),
                        i.total_cost.to_string(),
                        i.hours_worked.to_string(),
                        i.travel_time.to_string(),
                        i.materials_used,
                        i.equipment_used,
                        i.status.as_str(),
                        i.customer_signature,
                        i.customer_feedback,
                        i.customer_rating.map(i64::from),
                        i.technician_notes,
                        i.internal_notes,
                        materials,
                        expenses,
                        images,
                        format_datetime(&i.created_at),
                        format_datetime(&i.updated_at)
                    ],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Intervention", intervention_id))
    }

    async fn update_intervention(&self, intervention: &Intervention) -> Result<()> {
        let (materials, expenses, images) = intervention_children(intervention)?;
        let i = intervention.clone();
        let intervention_id = i.id.to_string();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(
                        schema::UPDATE_INTERVENTION,
                        rusqlite::params![
                            i.id.to_string(),
                            i.ticket_id.to_string(),
                            i.technician_id.map(|id| id.to_string()),
                            i.report,
                            format_date(&i.intervention_date),
                            i.start_time.as_ref().map(format_time),
                            i.end_time.as_ref().map(format_time),
                            i.transport_cost.to_string(),
                            i.additional_costs.to_string(),
                            i.total_cost.to_string(),
                            i.hours_worked.to_string(),
                            i.travel_time.to_string(),
                            i.materials_used,
                            i.equipment_used,
                            i.status.as_str(),
                            i.customer_signature,
                            i.customer_feedback,
                            i.customer_rating.map(i64::from),
                            i.technician_notes,
                            i.internal_notes,
                            materials,
                            expenses,
                            images,
                            format_datetime(&i.updated_at)
                        ],
                    )
                    .map_err(wrap_err)?;
                require_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Intervention", intervention_id))
    }

    async fn delete_intervention(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(schema::DELETE_INTERVENTION, [&id_str])
                    .map_err(wrap_err)?;
                require_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Intervention", id.to_string()))
    }
}

// ============================================================================
// MessageRepository implementation
// ============================================================================

#[async_trait]
impl MessageRepository for SqliteRepository {
    async fn list_messages(&self, ticket_id: Uuid) -> Result<Vec<Message>> {
        let id_str = ticket_id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_MESSAGES_BY_TICKET)
                    .map_err(wrap_err)?;
                let rows = stmt.query_map([&id_str], row_to_message).map_err(wrap_err)?;
                collect_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Message"))
    }

    async fn create_message(&self, message: &Message) -> Result<()> {
        let m = message.clone();
        let message_id = m.id.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_MESSAGE,
                    rusqlite::params![
                        m.id.to_string(),
                        m.ticket_id.to_string(),
                        m.user_id.to_string(),
                        m.content,
                        m.image,
                        format_datetime(&m.timestamp),
                        m.whatsapp_status.as_str(),
                        m.whatsapp_sid,
                        m.is_whatsapp
                    ],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Message", message_id))
    }
}

// ============================================================================
// RatingRepository implementation
// ============================================================================

#[async_trait]
impl RatingRepository for SqliteRepository {
    async fn list_technician_ratings(&self, technician_id: Uuid) -> Result<Vec<TechnicianRating>> {
        let id_str = technician_id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_TECHNICIAN_RATINGS)
                    .map_err(wrap_err)?;
                let rows = stmt
                    .query_map([&id_str], row_to_technician_rating)
                    .map_err(wrap_err)?;
                collect_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "TechnicianRating"))
    }

    async fn create_technician_rating(&self, rating: &TechnicianRating) -> Result<()> {
        let r = rating.clone();
        let pair = format!("{}:{}", r.technician_id, r.client_id);

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_TECHNICIAN_RATING,
                    rusqlite::params![
                        r.id.to_string(),
                        r.technician_id.to_string(),
                        r.client_id.to_string(),
                        i64::from(r.rating),
                        r.comment,
                        format_datetime(&r.created_at)
                    ],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "TechnicianRating", pair))
    }

    async fn list_client_ratings(&self, client_id: Uuid) -> Result<Vec<ClientRating>> {
        let id_str = client_id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_CLIENT_RATINGS)
                    .map_err(wrap_err)?;
                let rows = stmt
                    .query_map([&id_str], row_to_client_rating)
                    .map_err(wrap_err)?;
                collect_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "ClientRating"))
    }

    async fn create_client_rating(&self, rating: &ClientRating) -> Result<()> {
        let r = rating.clone();
        let pair = format!("{}:{}", r.client_id, r.technician_id);

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_CLIENT_RATING,
                    rusqlite::params![
                        r.id.to_string(),
                        r.client_id.to_string(),
                        r.technician_id.to_string(),
                        i64::from(r.rating),
                        r.comment,
                        format_datetime(&r.created_at)
                    ],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "ClientRating", pair))
    }
}

// ============================================================================
// ProcedureRepository implementation
// ============================================================================

fn ensure_procedure_exists(
    conn: &rusqlite::Connection,
    id: &str,
) -> std::result::Result<(), tokio_rusqlite::Error> {
    conn.query_row(schema::SELECT_PROCEDURE_EXISTS, [id], |_| Ok(()))
        .map_err(wrap_err)
}

#[async_trait]
impl ProcedureRepository for SqliteRepository {
    async fn get_procedure(&self, id: Uuid) -> Result<Option<Procedure>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_PROCEDURE_BY_ID)
                    .map_err(wrap_err)?;
                optional(stmt.query_row([&id_str], row_to_procedure))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Procedure", id.to_string()))
    }

    async fn get_procedure_by_slug(&self, slug: &str) -> Result<Option<Procedure>> {
        let slug = slug.to_string();
        let slug_id = slug.clone();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_PROCEDURE_BY_SLUG)
                    .map_err(wrap_err)?;
                optional(stmt.query_row([&slug], row_to_procedure))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Procedure", slug_id))
    }

    async fn list_procedures(&self, filter: &ProcedureFilter) -> Result<Vec<Procedure>> {
        let filter = filter.clone();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_ALL_TAG_LINKS)
                    .map_err(wrap_err)?;
                let links = stmt
                    .query_map([], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                    })
                    .map_err(wrap_err)?;
                let mut tag_slugs: HashMap<String, HashSet<String>> = HashMap::new();
                for (procedure_id, slug) in collect_rows(links)? {
                    tag_slugs.entry(procedure_id).or_default().insert(slug);
                }

                let mut stmt = conn
                    .prepare(schema::SELECT_ALL_PROCEDURES)
                    .map_err(wrap_err)?;
                let rows = stmt.query_map([], row_to_procedure).map_err(wrap_err)?;
                let no_tags = HashSet::new();
                let mut procedures = collect_rows(rows)?;
                procedures.retain(|p| {
                    let slugs = tag_slugs.get(&p.id.to_string()).unwrap_or(&no_tags);
                    filter.matches(p, slugs)
                });
                Ok(procedures)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Procedure"))
    }

    async fn procedure_slugs_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = prefix.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_SLUGS_WITH_PREFIX)
                    .map_err(wrap_err)?;
                let rows = stmt
                    .query_map([&prefix], |row| row.get::<_, String>(0))
                    .map_err(wrap_err)?;
                collect_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Procedure"))
    }

    async fn create_procedure(&self, procedure: &Procedure) -> Result<()> {
        let images = to_json(&procedure.images)?;
        let attachments = to_json(&procedure.attachments)?;
        let p = procedure.clone();
        let slug = p.slug.clone();

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_PROCEDURE,
                    rusqlite::params![
                        p.id.to_string(),
                        p.title,
                        p.description,
                        p.content,
                        p.category.as_str(),
                        p.difficulty.as_str(),
                        p.estimated_time,
                        p.is_active,
                        p.author_id.map(|id| id.to_string()),
                        count_to_sql(p.views),
                        count_to_sql(p.likes),
                        count_to_sql(p.bookmarks),
                        p.status.as_str(),
                        p.slug,
                        p.meta_description,
                        p.featured,
                        images,
                        attachments,
                        format_datetime(&p.created_at),
                        format_datetime(&p.updated_at)
                    ],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Procedure", slug))
    }

    async fn update_procedure(&self, procedure: &Procedure) -> Result<()> {
        let p = procedure.clone();
        let procedure_id = p.id.to_string();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(
                        schema::UPDATE_PROCEDURE,
                        rusqlite::params![
                            p.id.to_string(),
                            p.title,
                            p.description,
                            p.content,
                            p.category.as_str(),
                            p.difficulty.as_str(),
                            p.estimated_time,
                            p.is_active,
                            p.author_id.map(|id| id.to_string()),
                            p.status.as_str(),
                            p.slug,
                            p.meta_description,
                            p.featured,
                            format_datetime(&p.updated_at)
                        ],
                    )
                    .map_err(wrap_err)?;
                require_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Procedure", procedure_id))
    }

    async fn delete_procedure(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(schema::DELETE_PROCEDURE, [&id_str])
                    .map_err(wrap_err)?;
                require_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Procedure", id.to_string()))
    }

    async fn list_tags(&self) -> Result<Vec<ProcedureTag>> {
        self.conn
            .call(|conn| {
                let mut stmt = conn.prepare(schema::SELECT_ALL_TAGS).map_err(wrap_err)?;
                let rows = stmt.query_map([], row_to_tag).map_err(wrap_err)?;
                collect_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "ProcedureTag"))
    }

    async fn get_or_create_tag(&self, name: &str) -> Result<ProcedureTag> {
        let name = name.to_string();
        let tag_name = name.clone();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let existing = {
                    let mut stmt = tx.prepare(schema::SELECT_TAG_BY_NAME).map_err(wrap_err)?;
                    optional(stmt.query_row([&name], row_to_tag))?
                };
                if let Some(tag) = existing {
                    return Ok(tag);
                }

                let slugs: HashSet<String> = {
                    let mut stmt = tx.prepare(schema::SELECT_ALL_TAG_SLUGS).map_err(wrap_err)?;
                    let rows = stmt
                        .query_map([], |row| row.get::<_, String>(0))
                        .map_err(wrap_err)?;
                    collect_rows(rows)?.into_iter().collect()
                };
                let slug = unique_slug(&slugify(&name), |candidate| slugs.contains(candidate));
                let tag = ProcedureTag::new(name, slug);
                tx.execute(
                    schema::INSERT_TAG,
                    rusqlite::params![
                        tag.id.to_string(),
                        tag.name,
                        tag.slug,
                        tag.description,
                        tag.color,
                        format_datetime(&tag.created_at)
                    ],
                )
                .map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(tag)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "ProcedureTag", tag_name))
    }

    async fn get_procedure_tags(&self, procedure_id: Uuid) -> Result<Vec<ProcedureTag>> {
        let id_str = procedure_id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_TAGS_BY_PROCEDURE)
                    .map_err(wrap_err)?;
                let rows = stmt.query_map([&id_str], row_to_tag).map_err(wrap_err)?;
                collect_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "ProcedureTag"))
    }

    async fn set_procedure_tags(&self, procedure_id: Uuid, tag_ids: &[Uuid]) -> Result<()> {
        let id_str = procedure_id.to_string();
        let tag_ids: Vec<String> = tag_ids.iter().map(Uuid::to_string).collect();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                ensure_procedure_exists(&tx, &id_str)?;
                tx.execute(schema::DELETE_TAG_LINKS, [&id_str])
                    .map_err(wrap_err)?;
                for tag_id in &tag_ids {
                    tx.execute(schema::INSERT_TAG_LINK, [&id_str, tag_id])
                        .map_err(wrap_err)?;
                }
                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Procedure", procedure_id.to_string()))
    }

    async fn get_related_procedures(&self, procedure_id: Uuid) -> Result<Vec<Procedure>> {
        let id_str = procedure_id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_RELATED_PROCEDURES)
                    .map_err(wrap_err)?;
                let rows = stmt
                    .query_map([&id_str], row_to_procedure)
                    .map_err(wrap_err)?;
                collect_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Procedure"))
    }

    async fn set_related_procedures(
        &self,
        procedure_id: Uuid,
        related_ids: &[Uuid],
    ) -> Result<()> {
        let id_str = procedure_id.to_string();
        let pairs: Vec<(String, String)> = related_ids
            .iter()
            .map(|related| {
                let (low, high) = relation_key(procedure_id, *related);
                (low.to_string(), high.to_string())
            })
            .collect();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                ensure_procedure_exists(&tx, &id_str)?;
                tx.execute(schema::DELETE_RELATIONS, [&id_str])
                    .map_err(wrap_err)?;
                for (low, high) in &pairs {
                    tx.execute(schema::INSERT_RELATION, [low, high])
                        .map_err(wrap_err)?;
                }
                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Procedure", procedure_id.to_string()))
    }

    async fn record_interaction(&self, interaction: &ProcedureInteraction) -> Result<bool> {
        let i = interaction.clone();
        let entity_id = i.procedure_id.to_string();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let procedure_id = i.procedure_id.to_string();
                ensure_procedure_exists(&tx, &procedure_id)?;
                let inserted = tx
                    .execute(
                        schema::INSERT_INTERACTION,
                        rusqlite::params![
                            i.id.to_string(),
                            i.user_id.to_string(),
                            procedure_id,
                            i.kind.as_str(),
                            format_datetime(&i.created_at)
                        ],
                    )
                    .map_err(wrap_err)?
                    == 1;
                if inserted {
                    let counter = match i.kind {
                        InteractionKind::View => Some(schema::INCREMENT_PROCEDURE_VIEWS),
                        InteractionKind::Like => Some(schema::INCREMENT_PROCEDURE_LIKES),
                        InteractionKind::Bookmark => Some(schema::INCREMENT_PROCEDURE_BOOKMARKS),
                        InteractionKind::Share => None,
                    };
                    if let Some(sql) = counter {
                        tx.execute(sql, [&procedure_id]).map_err(wrap_err)?;
                    }
                }
                tx.commit().map_err(wrap_err)?;
                Ok(inserted)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Procedure", entity_id))
    }

    async fn add_procedure_image(&self, procedure_id: Uuid, image: &ProcedureImage) -> Result<()> {
        let id_str = procedure_id.to_string();
        let image = image.clone();

        self.conn
            .call(move |conn| {
                edit_json_list(
                    conn,
                    schema::SELECT_PROCEDURE_IMAGES,
                    schema::UPDATE_PROCEDURE_IMAGES,
                    &id_str,
                    |images: &mut Vec<ProcedureImage>| {
                        images.push(image);
                        Ok(())
                    },
                )
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Procedure", procedure_id.to_string()))
    }

    async fn add_procedure_attachment(
        &self,
        procedure_id: Uuid,
        attachment: &ProcedureAttachment,
    ) -> Result<()> {
        let id_str = procedure_id.to_string();
        let attachment = attachment.clone();

        self.conn
            .call(move |conn| {
                edit_json_list(
                    conn,
                    schema::SELECT_PROCEDURE_ATTACHMENTS,
                    schema::UPDATE_PROCEDURE_ATTACHMENTS,
                    &id_str,
                    |attachments: &mut Vec<ProcedureAttachment>| {
                        attachments.push(attachment);
                        Ok(())
                    },
                )
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Procedure", procedure_id.to_string()))
    }

    async fn increment_attachment_downloads(
        &self,
        procedure_id: Uuid,
        attachment_id: Uuid,
    ) -> Result<ProcedureAttachment> {
        let id_str = procedure_id.to_string();

        self.conn
            .call(move |conn| {
                edit_json_list(
                    conn,
                    schema::SELECT_PROCEDURE_ATTACHMENTS,
                    schema::UPDATE_PROCEDURE_ATTACHMENTS,
                    &id_str,
                    |attachments: &mut Vec<ProcedureAttachment>| {
                        let attachment = attachments
                            .iter_mut()
                            .find(|a| a.id == attachment_id)
                            .ok_or_else(|| wrap_err(rusqlite::Error::QueryReturnedNoRows))?;
                        attachment.downloads += 1;
                        Ok(attachment.clone())
                    },
                )
            })
            .await
            .map_err(|e| {
                map_tokio_rusqlite_error_with_id(e, "ProcedureAttachment", attachment_id.to_string())
            })
    }
}

// ============================================================================
// NotificationRepository implementation
// ============================================================================

#[async_trait]
impl NotificationRepository for SqliteRepository {
    async fn get_notification(&self, id: Uuid) -> Result<Option<Notification>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_NOTIFICATION_BY_ID)
                    .map_err(wrap_err)?;
                optional(stmt.query_row([&id_str], row_to_notification))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Notification", id.to_string()))
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>> {
        let id_str = user_id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_NOTIFICATIONS_BY_USER)
                    .map_err(wrap_err)?;
                let rows = stmt
                    .query_map(rusqlite::params![id_str, unread_only], row_to_notification)
                    .map_err(wrap_err)?;
                collect_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Notification"))
    }

    async fn create_notifications(&self, notifications: &[Notification]) -> Result<()> {
        let notifications = notifications.to_vec();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                for n in &notifications {
                    tx.execute(
                        schema::INSERT_NOTIFICATION,
                        rusqlite::params![
                            n.id.to_string(),
                            n.user_id.to_string(),
                            n.title,
                            n.message,
                            n.ticket_id.map(|id| id.to_string()),
                            n.is_read,
                            format_datetime(&n.created_at)
                        ],
                    )
                    .map_err(wrap_err)?;
                }
                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Notification"))
    }

    async fn mark_read(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(schema::MARK_NOTIFICATION_READ, [&id_str])
                    .map_err(wrap_err)?;
                require_rows(rows)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Notification", id.to_string()))
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<usize> {
        let id_str = user_id.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(schema::MARK_ALL_NOTIFICATIONS_READ, [&id_str])
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Notification"))
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<usize> {
        let id_str = user_id.to_string();

        self.conn
            .call(move |conn| {
                let count: i64 = conn
                    .query_row(schema::COUNT_UNREAD_NOTIFICATIONS, [&id_str], |row| {
                        row.get(0)
                    })
                    .map_err(wrap_err)?;
                Ok(usize::try_from(count).unwrap_or_default())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Notification"))
    }
}
