//! Agent backend gateway and stream interpretation for copper-courier.
//!
//! The gateway sends one request per user turn to the streaming agent
//! backend and hands back the buffered newline-delimited event stream. The
//! interpreter turns that stream into a single structured reply: it decides
//! which event is final, stitches partial text fragments back together, and
//! resolves the optional sender attribution.

pub mod error;
pub mod event;
pub mod gateway;
pub mod interpreter;
pub mod sender;

pub use error::AgentError;
pub use event::{AgentEvent, Part, parse_stream};
pub use gateway::{AgentClient, AgentConfig, AgentGateway, AgentMessage};
pub use interpreter::{StructuredReply, interpret_stream};
pub use sender::{TRANSFER_TOOL_NAME, sender_id_for_agent};
