//! Decoding of agent stream events.
//!
//! The backend streams one JSON object per line, and the same logical
//! field appears under several names and containers depending on which
//! layer produced the event. All of that shape-probing happens here, once,
//! at parse time; the interpreter only ever sees the tagged types below.
//!
//! Alias precedence, applied in order:
//! - parts: `parts` → `content.parts` → `candidates[].content.parts`,
//!   then the `response` / `output` / `result` wrapper containers;
//! - long-running tool ids: `longRunningToolIds` → `long_running_tool_ids`
//!   → `longRunningToolIDs` → `long_running_tool_IDs`;
//! - skip-summarization: `actions.skip_summarization` →
//!   `actions.skipSummarization`.

use serde_json::Value;

/// One decoded part of an event's content.
///
/// A part object carrying several markers decodes by precedence:
/// function_call > function_response > code_execution_result > text.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    /// Plain text fragment.
    Text(String),
    /// A tool invocation issued by the agent.
    FunctionCall { name: String, args: Value },
    /// A tool result returned to the agent. The payload is the whole
    /// function_response object; its `response` field carries the result.
    FunctionResponse { payload: Value },
    /// A code execution result.
    CodeExecutionResult,
    /// A part this relay does not model. Kept so positional checks (the
    /// trailing code-execution test) see the original part order.
    Other,
}

/// One decoded line of the agent's streamed response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AgentEvent {
    /// The sub-agent that authored the event, if named.
    pub author: Option<String>,
    /// True for streamed partial text fragments.
    pub partial: bool,
    /// True when the event asks for summarization to be skipped.
    pub skip_summarization: bool,
    /// Identifiers of still-running long-lived tools.
    pub long_running_tool_ids: Vec<Value>,
    /// Ordered content parts.
    pub parts: Vec<Part>,
}

impl AgentEvent {
    /// Decodes an event from a JSON value. Non-object values yield `None`.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        let author = object.get("author").and_then(Value::as_str).map(String::from);
        let partial = object.get("partial").and_then(Value::as_bool) == Some(true);
        let skip_summarization = read_skip_summarization(value);
        let long_running_tool_ids = read_long_running_tool_ids(value);
        let parts = extract_parts(value).into_iter().map(decode_part).collect();

        Some(Self {
            author,
            partial,
            skip_summarization,
            long_running_tool_ids,
            parts,
        })
    }

    /// Returns the text fragments of this event's parts, in order.
    #[must_use]
    pub fn text_parts(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Returns the function_response payloads of this event's parts.
    #[must_use]
    pub fn function_response_payloads(&self) -> Vec<&Value> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::FunctionResponse { payload } => Some(payload),
                _ => None,
            })
            .collect()
    }

    fn has_function_call(&self) -> bool {
        self.parts
            .iter()
            .any(|part| matches!(part, Part::FunctionCall { .. }))
    }

    fn has_function_response(&self) -> bool {
        self.parts
            .iter()
            .any(|part| matches!(part, Part::FunctionResponse { .. }))
    }

    fn last_part_is_code_execution(&self) -> bool {
        matches!(self.parts.last(), Some(Part::CodeExecutionResult))
    }

    /// Judges whether this event carries the agent's settled answer.
    ///
    /// An event is final if it skips summarization or lists long-running
    /// tools; otherwise it must be free of pending activity: no function
    /// call, no function response, not partial, and no trailing code
    /// execution result.
    #[must_use]
    pub fn is_final(&self) -> bool {
        if self.skip_summarization || !self.long_running_tool_ids.is_empty() {
            return true;
        }
        !self.has_function_call()
            && !self.has_function_response()
            && !self.partial
            && !self.last_part_is_code_execution()
    }
}

/// Parses a buffered stream body into events.
///
/// Blank lines are ignored; lines that fail JSON parsing or do not decode
/// to an object are dropped silently.
#[must_use]
pub fn parse_stream(response_text: &str) -> Vec<AgentEvent> {
    response_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .filter_map(|value| AgentEvent::from_value(&value))
        .collect()
}

fn read_skip_summarization(event: &Value) -> bool {
    let Some(actions) = event.get("actions").filter(|a| a.is_object()) else {
        return false;
    };
    let skip = actions
        .get("skip_summarization")
        .or_else(|| actions.get("skipSummarization"));
    skip.and_then(Value::as_bool) == Some(true)
}

fn read_long_running_tool_ids(event: &Value) -> Vec<Value> {
    const ALIASES: [&str; 4] = [
        "longRunningToolIds",
        "long_running_tool_ids",
        "longRunningToolIDs",
        "long_running_tool_IDs",
    ];
    ALIASES
        .iter()
        .find_map(|alias| event.get(*alias))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn parts_of_container(container: &Value) -> Vec<&Value> {
    if let Some(parts) = container.get("parts").and_then(Value::as_array) {
        return parts.iter().collect();
    }
    if let Some(parts) = container
        .get("content")
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
    {
        return parts.iter().collect();
    }
    if let Some(candidates) = container.get("candidates").and_then(Value::as_array) {
        return candidates
            .iter()
            .filter_map(|candidate| {
                candidate
                    .get("content")
                    .and_then(|content| content.get("parts"))
                    .and_then(Value::as_array)
            })
            .flatten()
            .collect();
    }
    Vec::new()
}

fn extract_parts(event: &Value) -> Vec<&Value> {
    let direct = parts_of_container(event);
    if !direct.is_empty() {
        return direct;
    }

    // Some layers wrap the content in a named container.
    for key in ["response", "output", "result"] {
        if let Some(container) = event.get(key).filter(|c| c.is_object()) {
            let wrapped = parts_of_container(container);
            if !wrapped.is_empty() {
                return wrapped;
            }
        }
    }

    Vec::new()
}

fn decode_part(part: &Value) -> Part {
    let Some(object) = part.as_object() else {
        return Part::Other;
    };

    if let Some(call) = object.get("function_call") {
        let name = call
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let args = call.get("args").cloned().unwrap_or(Value::Null);
        return Part::FunctionCall { name, args };
    }
    if let Some(response) = object.get("function_response") {
        return Part::FunctionResponse {
            payload: response.clone(),
        };
    }
    if object.contains_key("code_execution_result") {
        return Part::CodeExecutionResult;
    }
    if let Some(text) = object.get("text").and_then(Value::as_str) {
        return Part::Text(text.to_string());
    }
    Part::Other
}
