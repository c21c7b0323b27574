//! JSON encoding of cached entities.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::accounts::User;
use crate::tickets::Ticket;

/// Errors that can occur during cache serialization/deserialization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializationError {
    #[error("Failed to serialize: {0}")]
    SerializeFailed(String),
    #[error("Failed to deserialize: {0}")]
    DeserializeFailed(String),
}

/// Result type for serialization operations.
pub type Result<T> = std::result::Result<T, SerializationError>;

fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| SerializationError::SerializeFailed(e.to_string()))
}

fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| SerializationError::DeserializeFailed(e.to_string()))
}

pub fn serialize_ticket(ticket: &Ticket) -> Result<Vec<u8>> {
    to_bytes(ticket)
}

pub fn deserialize_ticket(bytes: &[u8]) -> Result<Ticket> {
    from_bytes(bytes)
}

pub fn serialize_user(user: &User) -> Result<Vec<u8>> {
    to_bytes(user)
}

pub fn deserialize_user(bytes: &[u8]) -> Result<User> {
    from_bytes(bytes)
}
