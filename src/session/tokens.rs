//! Rough token accounting for the context-window check.
//!
//! No tokenizer is bundled; four characters per token is close enough to
//! catch a log that has outgrown the window before paying for the call.

use crate::ports::llm::Message;

/// Framing overhead of one message.
pub const TOKENS_PER_MESSAGE: usize = 3;
/// Priming overhead of every reply.
pub const REPLY_PRIMING: usize = 3;
/// Tokens reserved for the answer.
pub const EXPECTED_RESPONSE: usize = 2048;

/// Estimated tokens in `text`.
#[must_use]
pub fn estimate_text(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Estimated prompt tokens for a whole conversation.
#[must_use]
pub fn estimate_messages(messages: &[Message]) -> usize {
    messages
        .iter()
        .map(|m| TOKENS_PER_MESSAGE + estimate_text(m.role.as_str()) + estimate_text(&m.content))
        .sum::<usize>()
        + REPLY_PRIMING
}

/// Whether `messages` plus the reserved answer fit in `context_window`.
#[must_use]
pub fn fits(messages: &[Message], context_window: usize) -> bool {
    estimate_messages(messages) + EXPECTED_RESPONSE <= context_window
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_rounds_up() {
        assert_eq!(estimate_text(""), 0);
        assert_eq!(estimate_text("abc"), 1);
        assert_eq!(estimate_text("abcd"), 1);
        assert_eq!(estimate_text("abcde"), 2);
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(estimate_text("éééé"), 1);
    }

    #[test]
    fn conversation_overheads() {
        // 3 + ceil(4/4) + ceil(8/4) per message, plus 3 priming.
        let messages = [Message::user("abcdefgh")];
        assert_eq!(estimate_messages(&messages), 3 + 1 + 2 + 3);
        assert_eq!(estimate_messages(&[]), REPLY_PRIMING);
    }

    #[test]
    fn window_includes_expected_response() {
        let messages = [Message::user("abcdefgh")];
        let needed = estimate_messages(&messages) + EXPECTED_RESPONSE;
        assert!(fits(&messages, needed));
        assert!(!fits(&messages, needed - 1));
    }
}
