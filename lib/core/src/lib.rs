//! Core domain types and utilities for the copper-courier relay.
//!
//! This crate provides the foundational types shared across the relay
//! pipeline: the canonical queueable message, the versioned payload
//! envelope, and the error handling foundation.

pub mod envelope;
pub mod error;
pub mod message;

pub use envelope::{CURRENT_VERSION, Envelope, PayloadCodecError};
pub use error::Result;
pub use message::{MessageKind, QueuedMessage};
