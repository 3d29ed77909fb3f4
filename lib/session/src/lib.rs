//! Conversation session persistence for copper-courier.
//!
//! Maps a platform user identifier to the opaque conversation session
//! identifier used by the agent backend, and owns the reset-command
//! vocabulary that clears that mapping.

pub mod error;
pub mod reset;
pub mod store;

pub use error::SessionStoreError;
pub use reset::is_reset_command;
pub use store::{MemorySessionStore, PgSessionStore, SessionStore};
