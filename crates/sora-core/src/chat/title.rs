//! Session title derivation from the first exchange.
//!
//! Titles are best-effort labels: the first non-empty line of the user's
//! text (or the assistant's, when the user sent nothing usable), clipped to
//! a handful of words.

use sora_types::chat::DEFAULT_SESSION_TITLE;

const MAX_TITLE_WORDS: usize = 6;
const MAX_TITLE_CHARS: usize = 60;

/// Derive a short title from a user/assistant exchange.
pub fn derive_title(user_text: &str, assistant_text: &str) -> String {
    first_line(user_text)
        .or_else(|| first_line(assistant_text))
        .map(clip)
        .unwrap_or_else(|| DEFAULT_SESSION_TITLE.to_string())
}

fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}

fn clip(line: &str) -> String {
    let words: Vec<&str> = line.split_whitespace().take(MAX_TITLE_WORDS).collect();
    let joined = words.join(" ");
    if joined.chars().count() <= MAX_TITLE_CHARS {
        return joined;
    }
    let clipped: String = joined.chars().take(MAX_TITLE_CHARS).collect();
    clipped.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_from_user_text() {
        let title = derive_title("I can't focus at work lately and it is getting worse", "Hi");
        assert_eq!(title, "I can't focus at work lately");
    }

    #[test]
    fn test_title_skips_blank_lines() {
        let title = derive_title("\n\n   \nSleep schedule\nmore text", "");
        assert_eq!(title, "Sleep schedule");
    }

    #[test]
    fn test_title_falls_back_to_assistant_text() {
        let title = derive_title("   ", "Let's talk about your morning routine");
        assert_eq!(title, "Let's talk about your morning routine");
    }

    #[test]
    fn test_title_default_when_both_empty() {
        assert_eq!(derive_title("", "\n"), DEFAULT_SESSION_TITLE);
    }

    #[test]
    fn test_title_clips_long_words_on_char_boundary() {
        let long = "ü".repeat(100);
        let title = derive_title(&long, "");
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
    }
}
