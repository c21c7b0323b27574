pub mod actor;
pub mod error;
pub mod exports;
pub mod health;
pub mod interventions;
pub mod messages;
pub mod notifications;
pub mod procedures;
pub mod profiles;
pub mod ratings;
pub mod tickets;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

pub use actor::Actor;
pub use error::AppError;
