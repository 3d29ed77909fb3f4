//! Sender attribution table.
//!
//! The agent backend is a small team of sub-agents; replies carry a numeric
//! sender id naming which sub-agent authored them. When the reply JSON
//! omits the id, the interpreter falls back to the stream's author fields
//! and agent-handoff calls, mapped through this table.

/// Name of the agent-handoff tool call in the event stream.
pub const TRANSFER_TOOL_NAME: &str = "transfer_to_agent";

/// Maps a backend agent name to its sender id.
#[must_use]
pub fn sender_id_for_agent(name: &str) -> Option<u32> {
    match name {
        "root_agent" | "db_sample_agent" => Some(1),
        "goal_setting_agent" => Some(2),
        "exercise_manager_agent" => Some(3),
        "meal_record_agent" => Some(4),
        _ => None,
    }
}
