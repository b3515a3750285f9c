//! Plain-text transcripts of chat sessions.
//!
//! Used by the summarizer and pattern-mining adapters to feed history to
//! the external model as `User: ...` / `Assistant: ...` lines.

use sora_types::chat::{ChatMessage, ChatSession, MessageRole};

fn speaker(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "User",
        MessageRole::Assistant => "Assistant",
    }
}

/// Render a message list, one line per message.
pub fn render(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", speaker(m.role), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Concatenate sessions in the given order and keep the first `max_chars`
/// characters.
pub fn recent_window(sessions: &[ChatSession], max_chars: usize) -> String {
    let mut text = String::new();
    for session in sessions {
        for message in &session.messages {
            text.push_str(speaker(message.role));
            text.push_str(": ");
            text.push_str(&message.content);
            text.push('\n');
        }
    }
    truncate_chars(&text, max_chars)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
