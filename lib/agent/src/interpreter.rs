//! Turns a parsed event stream into a single reply.
//!
//! The stream delivers text in two ways: as partial fragments that must be
//! stitched together, and as complete final events. Tool activity can also
//! stand in for text when a forced-final event carries only function
//! responses. The reply text itself may be a structured JSON object naming
//! the sub-agent that authored it; when it is not, attribution falls back
//! to the stream's author fields and agent-handoff calls.

use serde_json::Value;

use crate::event::{AgentEvent, Part, parse_stream};
use crate::sender::{TRANSFER_TOOL_NAME, sender_id_for_agent};

/// The interpreted outcome of one agent turn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructuredReply {
    /// Reply text to push back to the user. Empty when the stream produced
    /// no usable answer.
    pub text: String,
    /// Numeric id of the sub-agent that authored the reply, if resolved.
    pub sender_id: Option<u32>,
}

/// Interprets a buffered newline-delimited event stream.
#[must_use]
pub fn interpret_stream(response_text: &str) -> StructuredReply {
    let events = parse_stream(response_text);
    let final_text = extract_final_text(&events);
    let mut reply = parse_structured_reply(&final_text);
    if reply.sender_id.is_none() {
        reply.sender_id = detect_sender_id(&events);
    }
    reply
}

/// Walks the stream in order and settles on the final reply text.
///
/// Partial fragments accumulate until a final event with text flushes them,
/// prefixed, into the result. A partial event carrying text is always a
/// fragment, even when it also carries forced-final markers. A forced-final
/// event without text falls back to its function-response texts; a later
/// final event with text still overrides that fallback.
fn extract_final_text(events: &[AgentEvent]) -> String {
    let mut accumulated = String::new();
    let mut result = String::new();

    for event in events {
        let texts = event.text_parts();
        if event.partial && !texts.is_empty() {
            accumulated.push_str(&texts.concat());
            continue;
        }
        if event.is_final() {
            if !texts.is_empty() {
                result = format!("{accumulated}{}", texts.concat()).trim().to_string();
                accumulated.clear();
            } else {
                let fallback: Vec<String> = event
                    .function_response_payloads()
                    .into_iter()
                    .map(function_response_text)
                    .filter(|text| !text.is_empty())
                    .collect();
                if !fallback.is_empty() {
                    result = fallback.join("\n").trim().to_string();
                }
            }
        }
    }

    result
}

/// Extracts readable text from a function_response payload.
///
/// The `response` field is the result itself when it is a string; otherwise
/// the first present string among the conventional result keys wins, and a
/// result with none of them is serialized whole. A payload without a
/// `response` field contributes nothing.
fn function_response_text(payload: &Value) -> String {
    const RESULT_KEYS: [&str; 5] = ["message", "result", "text", "report", "summary"];

    match payload.get("response") {
        Some(Value::String(text)) => text.clone(),
        Some(response) => {
            for key in RESULT_KEYS {
                if let Some(text) = response.get(key).and_then(Value::as_str) {
                    return text.to_string();
                }
            }
            serde_json::to_string(response).unwrap_or_default()
        }
        None => String::new(),
    }
}

/// Decodes the reply text as a structured JSON reply when it is one.
///
/// Anything that is not a JSON object with a string `text` field passes
/// through unchanged as plain text.
fn parse_structured_reply(final_text: &str) -> StructuredReply {
    if final_text.is_empty() {
        return StructuredReply::default();
    }

    let Ok(value) = serde_json::from_str::<Value>(final_text) else {
        return StructuredReply {
            text: final_text.to_string(),
            sender_id: None,
        };
    };
    let Some(text) = value.get("text").and_then(Value::as_str) else {
        return StructuredReply {
            text: final_text.to_string(),
            sender_id: None,
        };
    };

    let sender_id = value
        .get("senderId")
        .or_else(|| value.get("sender_id"))
        .and_then(Value::as_u64)
        .and_then(|id| u32::try_from(id).ok());

    StructuredReply {
        text: text.to_string(),
        sender_id,
    }
}

/// Resolves sender attribution from the stream itself.
///
/// The author of the last text-carrying event wins; when that author does
/// not map to a known sub-agent, the last agent-handoff call names the
/// recipient.
fn detect_sender_id(events: &[AgentEvent]) -> Option<u32> {
    let by_author = events
        .iter()
        .rev()
        .find(|event| !event.text_parts().is_empty())
        .and_then(|event| event.author.as_deref())
        .and_then(sender_id_for_agent);
    if by_author.is_some() {
        return by_author;
    }

    events.iter().rev().find_map(|event| {
        event.parts.iter().rev().find_map(|part| match part {
            Part::FunctionCall { name, args } if name == TRANSFER_TOOL_NAME => args
                .get("agent_name")
                .and_then(Value::as_str)
                .and_then(sender_id_for_agent),
            _ => None,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stream(lines: &[Value]) -> String {
        lines
            .iter()
            .map(|line| line.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn stitches_partial_fragments_into_final_text() {
        let raw = stream(&[
            json!({"partial": true, "content": {"parts": [{"text": "Hel"}]}}),
            json!({"content": {"parts": [{"text": "lo, world"}]}}),
        ]);
        let reply = interpret_stream(&raw);
        assert_eq!(reply.text, "Hello, world");
    }

    #[test]
    fn partial_with_forced_final_markers_stays_a_fragment() {
        let raw = stream(&[
            json!({
                "partial": true,
                "actions": {"skip_summarization": true},
                "content": {"parts": [{"text": "frag"}]},
            }),
            json!({"content": {"parts": [{"text": "final"}]}}),
        ]);
        assert_eq!(interpret_stream(&raw).text, "fragfinal");
    }

    #[test]
    fn later_final_event_wins() {
        let raw = stream(&[
            json!({"content": {"parts": [{"text": "first"}]}}),
            json!({"content": {"parts": [{"text": "second"}]}}),
        ]);
        assert_eq!(interpret_stream(&raw).text, "second");
    }

    #[test]
    fn non_final_events_are_skipped() {
        let raw = stream(&[
            json!({"content": {"parts": [{"function_call": {"name": "lookup", "args": {}}}]}}),
            json!({"content": {"parts": [{"function_response": {"response": {"message": "raw"}}}]}}),
            json!({"content": {"parts": [{"text": "answer"}]}}),
        ]);
        assert_eq!(interpret_stream(&raw).text, "answer");
    }

    #[test]
    fn forced_final_function_response_supplies_text() {
        let raw = stream(&[json!({
            "actions": {"skip_summarization": true},
            "content": {"parts": [{"function_response": {"response": {"message": "done"}}}]},
        })]);
        assert_eq!(interpret_stream(&raw).text, "done");
    }

    #[test]
    fn function_response_string_result_passes_through() {
        let raw = stream(&[json!({
            "actions": {"skip_summarization": true},
            "content": {"parts": [{"function_response": {"response": "plain result"}}]},
        })]);
        assert_eq!(interpret_stream(&raw).text, "plain result");
    }

    #[test]
    fn function_response_key_order() {
        let payload = json!({"response": {"summary": "s", "result": "r"}});
        assert_eq!(function_response_text(&payload), "r");

        let serialized = json!({"response": {"count": 3}});
        assert_eq!(function_response_text(&serialized), r#"{"count":3}"#);

        assert_eq!(function_response_text(&json!({"id": "x"})), "");
    }

    #[test]
    fn text_after_fallback_overrides_it() {
        let raw = stream(&[
            json!({
                "actions": {"skip_summarization": true},
                "content": {"parts": [{"function_response": {"response": {"message": "interim"}}}]},
            }),
            json!({"content": {"parts": [{"text": "final answer"}]}}),
        ]);
        assert_eq!(interpret_stream(&raw).text, "final answer");
    }

    #[test]
    fn structured_reply_carries_sender_id() {
        let raw = stream(&[json!({
            "content": {"parts": [{"text": r#"{"text":"hi","senderId":3}"#}]},
        })]);
        let reply = interpret_stream(&raw);
        assert_eq!(reply.text, "hi");
        assert_eq!(reply.sender_id, Some(3));
    }

    #[test]
    fn snake_case_sender_id_is_accepted() {
        let reply = parse_structured_reply(r#"{"text":"ok","sender_id":4}"#);
        assert_eq!(reply.sender_id, Some(4));
    }

    #[test]
    fn json_without_text_field_stays_plain() {
        let reply = parse_structured_reply(r#"{"senderId":2}"#);
        assert_eq!(reply.text, r#"{"senderId":2}"#);
        assert_eq!(reply.sender_id, None);
    }

    #[test]
    fn plain_text_reply_has_no_sender() {
        let raw = stream(&[json!({"content": {"parts": [{"text": "hi"}]}})]);
        let reply = interpret_stream(&raw);
        assert_eq!(reply.text, "hi");
        assert_eq!(reply.sender_id, None);
    }

    #[test]
    fn author_of_last_text_event_attributes_sender() {
        let raw = stream(&[
            json!({"author": "root_agent", "content": {"parts": [{"text": "routing"}]}}),
            json!({"author": "goal_setting_agent", "content": {"parts": [{"text": "goal set"}]}}),
        ]);
        let reply = interpret_stream(&raw);
        assert_eq!(reply.text, "goal set");
        assert_eq!(reply.sender_id, Some(2));
    }

    #[test]
    fn transfer_call_attributes_sender_when_author_unknown() {
        let raw = stream(&[
            json!({"content": {"parts": [
                {"function_call": {"name": "transfer_to_agent", "args": {"agent_name": "meal_record_agent"}}},
            ]}}),
            json!({"author": "unnamed", "content": {"parts": [{"text": "logged"}]}}),
        ]);
        let reply = interpret_stream(&raw);
        assert_eq!(reply.text, "logged");
        assert_eq!(reply.sender_id, Some(4));
    }

    #[test]
    fn unknown_last_author_falls_through_to_transfer_call() {
        // Only the last text-carrying event's author counts; an earlier
        // mapped author must not win over the handoff call.
        let raw = stream(&[
            json!({"author": "goal_setting_agent", "content": {"parts": [{"text": "planning"}]}}),
            json!({"content": {"parts": [
                {"function_call": {"name": "transfer_to_agent", "args": {"agent_name": "meal_record_agent"}}},
            ]}}),
            json!({"author": "mystery", "content": {"parts": [{"text": "logged"}]}}),
        ]);
        let reply = interpret_stream(&raw);
        assert_eq!(reply.text, "logged");
        assert_eq!(reply.sender_id, Some(4));
    }

    #[test]
    fn structured_sender_id_beats_stream_attribution() {
        let raw = stream(&[json!({
            "author": "meal_record_agent",
            "content": {"parts": [{"text": r#"{"text":"hi","senderId":2}"#}]},
        })]);
        assert_eq!(interpret_stream(&raw).sender_id, Some(2));
    }

    #[test]
    fn empty_stream_yields_empty_reply() {
        let reply = interpret_stream("");
        assert_eq!(reply.text, "");
        assert_eq!(reply.sender_id, None);
    }

    #[test]
    fn stream_with_only_partials_yields_empty_reply() {
        let raw = stream(&[json!({"partial": true, "content": {"parts": [{"text": "frag"}]}})]);
        assert_eq!(interpret_stream(&raw).text, "");
    }

    #[test]
    fn final_text_is_trimmed() {
        let raw = stream(&[json!({"content": {"parts": [{"text": "  spaced  "}]}})]);
        assert_eq!(interpret_stream(&raw).text, "spaced");
    }
}
