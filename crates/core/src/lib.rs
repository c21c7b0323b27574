//! Functional core for the helpdesk backend.
//!
//! Domain types, derivation rules and validation live here, together with the
//! storage and cache traits the server implements. Nothing in this crate
//! performs I/O.

pub mod accounts;
pub mod cache;
pub mod interventions;
pub mod media;
pub mod messages;
pub mod notifications;
pub mod procedures;
pub mod ratings;
pub mod serde;
pub mod storage;
pub mod tickets;
