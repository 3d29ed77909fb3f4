//! Canned reply text and sender display identities.
//!
//! The relay serves a Japanese-language bot, so the fixed user-facing
//! strings live here in the platform's primary language.

use copper_courier_core::MessageKind;

/// Confirmation pushed after a session reset.
pub const RESET_MESSAGE: &str = "セッションをリセットしました。続けて話しかけてください。";

/// Substitute pushed when the agent produced no usable text.
pub const EMPTY_RESPONSE_MESSAGE: &str =
    "すみません、現在応答を生成できませんでした。もう一度お試しください。";

/// Text accompanying an uploaded attachment in the agent turn.
///
/// Attachment messages carry no user text, so the agent is told what
/// arrived alongside the file reference.
#[must_use]
pub fn attachment_prompt(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Image => "画像が送信されました。内容を確認して応答してください。",
        MessageKind::Video => "動画が送信されました。内容を確認して応答してください。",
        MessageKind::Audio => "音声が送信されました。内容を確認して応答してください。",
        MessageKind::Text => "",
    }
}

/// Maps a sender id to its display name, shown next to the pushed reply.
///
/// Unknown or out-of-range ids yield no special sender display.
#[must_use]
pub fn sender_display_name(sender_id: u32) -> Option<&'static str> {
    match sender_id {
        1 => Some("アドバイザー"),
        2 => Some("目標設定コーチ"),
        3 => Some("運動マネージャー"),
        4 => Some("食事記録係"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_prompts_name_the_kind() {
        assert!(attachment_prompt(MessageKind::Image).contains("画像"));
        assert!(attachment_prompt(MessageKind::Video).contains("動画"));
        assert!(attachment_prompt(MessageKind::Audio).contains("音声"));
    }

    #[test]
    fn sender_display_lookup() {
        assert_eq!(sender_display_name(2), Some("目標設定コーチ"));
        assert_eq!(sender_display_name(0), None);
        assert_eq!(sender_display_name(9), None);
    }
}
