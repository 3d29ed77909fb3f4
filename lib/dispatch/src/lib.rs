//! Queued-message dispatch orchestration for copper-courier.
//!
//! The dispatcher consumes deliveries from the relay queue and walks each
//! one through the pipeline: reset check, session resolution, attachment
//! upload, agent call, stream interpretation, push reply. The messaging
//! platform client and the canned reply text live here too.

pub mod dispatcher;
pub mod error;
pub mod messaging;
pub mod reply;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::{DispatchError, MessagingError};
pub use messaging::{FetchedContent, HttpMessagingClient, MessagingClient, MessagingConfig};
pub use reply::{
    EMPTY_RESPONSE_MESSAGE, RESET_MESSAGE, attachment_prompt, sender_display_name,
};
