mod error;
mod keys;
mod patterns;
mod serialization;
mod traits;

pub use error::{CacheError, Result};
pub use keys::{ticket_key, tickets_pattern, user_key};
pub use patterns::pattern_matches;
pub use serialization::{
    deserialize_ticket, deserialize_user, serialize_ticket, serialize_user, SerializationError,
};
pub use traits::Cache;
