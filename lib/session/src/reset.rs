//! Reset-command vocabulary.
//!
//! A reset clears the persisted session so the next message starts a fresh
//! conversation with the agent backend. The vocabulary is a fixed set of
//! exact case-insensitive tokens plus a Japanese start-over pattern.

use regex::Regex;
use std::sync::LazyLock;

/// Exact reset command tokens, matched case-insensitively after trimming.
const RESET_COMMANDS: [&str; 3] = ["reset", "session reset", "session reset please"];

/// Japanese start-over intent, e.g. 「リセット」「最初からお願い」.
static RESET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^(リセット|セッションリセット|最初から|はじめから|やり直し)(して|してください|お願い)?$")
        .expect("reset pattern is valid")
});

/// Returns true if the text is a session reset command.
#[must_use]
pub fn is_reset_command(text: &str) -> bool {
    let trimmed = text.trim();
    let lowered = trimmed.to_lowercase();
    if RESET_COMMANDS.contains(&lowered.as_str()) {
        return true;
    }
    RESET_PATTERN.is_match(trimmed)
}
