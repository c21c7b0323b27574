//! SQLite row conversion functions.
//!
//! Pure functions for converting between SQLite rows and domain types.
//! These are testable in isolation without database access.

use std::error::Error as StdError;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use helpdesk_core::accounts::{ClientProfile, TechnicianProfile, User};
use helpdesk_core::interventions::Intervention;
use helpdesk_core::messages::{Message, WhatsappStatus};
use helpdesk_core::notifications::Notification;
use helpdesk_core::procedures::{Procedure, ProcedureTag};
use helpdesk_core::ratings::{ClientRating, TechnicianRating};
use helpdesk_core::storage::RepositoryError;
use helpdesk_core::tickets::Ticket;

// ============================================================================
// Account conversions
// ============================================================================

/// Convert a SQLite row to a User.
///
/// Expected columns: id, username, first_name, last_name, email, phone,
/// user_type, avatar, bio, email_verified, is_superuser, is_active,
/// created_at, updated_at
pub fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: parse_uuid(row, 0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        user_type: parse_enum(row, 6)?,
        avatar: row.get(7)?,
        bio: row.get(8)?,
        email_verified: row.get(9)?,
        is_superuser: row.get(10)?,
        is_active: row.get(11)?,
        created_at: parse_datetime(row, 12)?,
        updated_at: parse_datetime(row, 13)?,
    })
}

/// Expected columns: id, user_id, company, created_at
pub fn row_to_client(row: &Row) -> rusqlite::Result<ClientProfile> {
    Ok(ClientProfile {
        id: parse_uuid(row, 0)?,
        user_id: parse_uuid(row, 1)?,
        company: row.get(2)?,
        created_at: parse_datetime(row, 3)?,
    })
}

/// Expected columns: id, user_id, specialty, created_at
pub fn row_to_technician(row: &Row) -> rusqlite::Result<TechnicianProfile> {
    let specialty: Option<String> = row.get(2)?;
    Ok(TechnicianProfile {
        id: parse_uuid(row, 0)?,
        user_id: parse_uuid(row, 1)?,
        specialty: specialty
            .map(|s| s.parse().map_err(|e| conversion_failure(2, e)))
            .transpose()?,
        created_at: parse_datetime(row, 3)?,
    })
}

// ============================================================================
// Ticket conversions
// ============================================================================

/// Convert a SQLite row to a Ticket. Column order matches `ticket_columns!`.
pub fn row_to_ticket(row: &Row) -> rusqlite::Result<Ticket> {
    Ok(Ticket {
        id: parse_uuid(row, 0)?,
        code: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        material_name: row.get(4)?,
        problem_start_date: parse_optional_datetime(row, 5)?,
        problem_type: row.get(6)?,
        status: parse_enum(row, 7)?,
        priority: parse_enum(row, 8)?,
        tags: row.get(9)?,
        attachment: row.get(10)?,
        client_id: parse_uuid(row, 11)?,
        technician_id: parse_optional_uuid(row, 12)?,
        images: parse_json(row, 13)?,
        created_at: parse_datetime(row, 14)?,
        updated_at: parse_datetime(row, 15)?,
    })
}

// ============================================================================
// Intervention conversions
// ============================================================================

/// Convert a SQLite row to an Intervention. Column order matches
/// `intervention_columns!`.
pub fn row_to_intervention(row: &Row) -> rusqlite::Result<Intervention> {
    let customer_rating: Option<i64> = row.get(18)?;
    Ok(Intervention {
        id: parse_uuid(row, 0)?,
        ticket_id: parse_uuid(row, 1)?,
        technician_id: parse_optional_uuid(row, 2)?,
        code: row.get(3)?,
        report: row.get(4)?,
        intervention_date: parse_date(row, 5)?,
        start_time: parse_optional_time(row, 6)?,
        end_time: parse_optional_time(row, 7)?,
        transport_cost: parse_decimal(row, 8)?,
        additional_costs: parse_decimal(row, 9)?,
        total_cost: parse_decimal(row, 10)?,
        hours_worked: parse_decimal(row, 11)?,
        travel_time: parse_decimal(row, 12)?,
        materials_used: row.get(13)?,
        equipment_used: row.get(14)?,
        status: parse_enum(row, 15)?,
        customer_signature: row.get(16)?,
        customer_feedback: row.get(17)?,
        customer_rating: customer_rating
            .map(|r| u8::try_from(r).map_err(|e| conversion_failure(18, e)))
            .transpose()?,
        technician_notes: row.get(19)?,
        internal_notes: row.get(20)?,
        materials: parse_json(row, 21)?,
        expenses: parse_json(row, 22)?,
        images: parse_json(row, 23)?,
        created_at: parse_datetime(row, 24)?,
        updated_at: parse_datetime(row, 25)?,
    })
}

// ============================================================================
// Message and rating conversions
// ============================================================================

/// Expected columns: id, ticket_id, user_id, content, image, timestamp,
/// whatsapp_status, whatsapp_sid, is_whatsapp
pub fn row_to_message(row: &Row) -> rusqlite::Result<Message> {
    let status: String = row.get(6)?;
    Ok(Message {
        id: parse_uuid(row, 0)?,
        ticket_id: parse_uuid(row, 1)?,
        user_id: parse_uuid(row, 2)?,
        content: row.get(3)?,
        image: row.get(4)?,
        timestamp: parse_datetime(row, 5)?,
        whatsapp_status: WhatsappStatus::parse(&status).ok_or_else(|| {
            conversion_failure(
                6,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("Unknown whatsapp status: {status}"),
                ),
            )
        })?,
        whatsapp_sid: row.get(7)?,
        is_whatsapp: row.get(8)?,
    })
}

/// Expected columns: id, technician_id, client_id, rating, comment, created_at
pub fn row_to_technician_rating(row: &Row) -> rusqlite::Result<TechnicianRating> {
    Ok(TechnicianRating {
        id: parse_uuid(row, 0)?,
        technician_id: parse_uuid(row, 1)?,
        client_id: parse_uuid(row, 2)?,
        rating: parse_score(row, 3)?,
        comment: row.get(4)?,
        created_at: parse_datetime(row, 5)?,
    })
}

/// Expected columns: id, client_id, technician_id, rating, comment, created_at
pub fn row_to_client_rating(row: &Row) -> rusqlite::Result<ClientRating> {
    Ok(ClientRating {
        id: parse_uuid(row, 0)?,
        client_id: parse_uuid(row, 1)?,
        technician_id: parse_uuid(row, 2)?,
        rating: parse_score(row, 3)?,
        comment: row.get(4)?,
        created_at: parse_datetime(row, 5)?,
    })
}

// ============================================================================
// Procedure conversions
// ============================================================================

/// Convert a SQLite row to a Procedure. Column order matches
/// `procedure_columns!`.
pub fn row_to_procedure(row: &Row) -> rusqlite::Result<Procedure> {
    Ok(Procedure {
        id: parse_uuid(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        content: row.get(3)?,
        category: parse_enum(row, 4)?,
        difficulty: parse_enum(row, 5)?,
        estimated_time: row.get(6)?,
        is_active: row.get(7)?,
        author_id: parse_optional_uuid(row, 8)?,
        views: parse_count(row, 9)?,
        likes: parse_count(row, 10)?,
        bookmarks: parse_count(row, 11)?,
        status: parse_enum(row, 12)?,
        slug: row.get(13)?,
        meta_description: row.get(14)?,
        featured: row.get(15)?,
        images: parse_json(row, 16)?,
        attachments: parse_json(row, 17)?,
        created_at: parse_datetime(row, 18)?,
        updated_at: parse_datetime(row, 19)?,
    })
}

/// Expected columns: id, name, slug, description, color, created_at
pub fn row_to_tag(row: &Row) -> rusqlite::Result<ProcedureTag> {
    Ok(ProcedureTag {
        id: parse_uuid(row, 0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        color: row.get(4)?,
        created_at: parse_datetime(row, 5)?,
    })
}

// ============================================================================
// Notification conversions
// ============================================================================

/// Expected columns: id, user_id, title, message, ticket_id, is_read, created_at
pub fn row_to_notification(row: &Row) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: parse_uuid(row, 0)?,
        user_id: parse_uuid(row, 1)?,
        title: row.get(2)?,
        message: row.get(3)?,
        ticket_id: parse_optional_uuid(row, 4)?,
        is_read: row.get(5)?,
        created_at: parse_datetime(row, 6)?,
    })
}

// ============================================================================
// Helper functions
// ============================================================================

fn conversion_failure<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: StdError + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_uuid(row: &Row, idx: usize) -> rusqlite::Result<Uuid> {
    let s: String = row.get(idx)?;
    Uuid::parse_str(&s).map_err(|e| conversion_failure(idx, e))
}

fn parse_optional_uuid(row: &Row, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| Uuid::parse_str(&s).map_err(|e| conversion_failure(idx, e)))
        .transpose()
}

fn parse_datetime_str(s: &str, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_failure(idx, e))
}

fn parse_datetime(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    parse_datetime_str(&s, idx)
}

fn parse_optional_datetime(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| parse_datetime_str(&s, idx)).transpose()
}

fn parse_date(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let s: String = row.get(idx)?;
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| conversion_failure(idx, e))
}

fn parse_optional_time(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveTime>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| NaiveTime::parse_from_str(&s, "%H:%M:%S").map_err(|e| conversion_failure(idx, e)))
        .transpose()
}

fn parse_decimal(row: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = row.get(idx)?;
    Decimal::from_str(&s).map_err(|e| conversion_failure(idx, e))
}

fn parse_enum<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: StdError + Send + Sync + 'static,
{
    let s: String = row.get(idx)?;
    s.parse().map_err(|e| conversion_failure(idx, e))
}

fn parse_json<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    serde_json::from_str(&s).map_err(|e| conversion_failure(idx, e))
}

fn parse_count(row: &Row, idx: usize) -> rusqlite::Result<u64> {
    let n: i64 = row.get(idx)?;
    u64::try_from(n).map_err(|e| conversion_failure(idx, e))
}

fn parse_score(row: &Row, idx: usize) -> rusqlite::Result<u8> {
    let n: i64 = row.get(idx)?;
    u8::try_from(n).map_err(|e| conversion_failure(idx, e))
}

/// Serialize a child collection to its JSON column.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

/// Format a DateTime<Utc> for SQLite storage.
///
/// Fixed precision keeps the text sortable.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Format a NaiveDate for SQLite storage (YYYY-MM-DD).
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a NaiveTime for SQLite storage (HH:MM:SS).
pub fn format_time(time: &NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}

/// Counters are stored as INTEGER.
pub fn count_to_sql(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
