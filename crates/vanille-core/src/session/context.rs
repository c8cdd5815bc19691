//! Assembly of the message list sent with each request.

use super::config::SessionConfig;
use crate::message::{ChatMessage, MessageRole};
use rand::Rng;

/// Samples each system message independently against its weight.
///
/// A message is included iff a `Uniform[0, 1)` draw is `<=` its
/// `probability_to_use`; a weight of `0.0` is never included.
pub fn select_system_messages<R: Rng + ?Sized>(
    system_messages: &[ChatMessage],
    rng: &mut R,
) -> Vec<ChatMessage> {
    system_messages
        .iter()
        .filter(|message| {
            let draw: f64 = rng.r#gen();
            message.probability_to_use > 0.0 && draw <= message.probability_to_use
        })
        .cloned()
        .collect()
}

/// Builds the outgoing context for a new user message.
///
/// Order: sampled system messages, the compressed-memory summary (when
/// compression is enabled and a summary exists), the last `memory_window`
/// stored messages, then `user_message`.
pub fn build_request_messages<R: Rng + ?Sized>(
    config: &SessionConfig,
    history: &[ChatMessage],
    user_message: &ChatMessage,
    rng: &mut R,
) -> Vec<ChatMessage> {
    let mut messages = select_system_messages(&config.system_messages, rng);

    if config.compress_memory_enable {
        if let Some(summary) = config.compressed_memory_summary() {
            messages.push(ChatMessage::new(MessageRole::System, summary).with_model(&config.model));
        }
    }

    let window = config.memory_window().min(history.len());
    messages.extend_from_slice(&history[history.len() - window..]);
    messages.push(user_message.clone());
    messages
}

/// Index of the message that should be summarized next, if any.
///
/// This is the most recent assistant message that has already left the
/// memory window. With memory disabled every stored message is outside it.
pub fn compression_candidate(config: &SessionConfig, history: &[ChatMessage]) -> Option<usize> {
    let outside = history.len().saturating_sub(config.memory_window());
    history[..outside]
        .iter()
        .rposition(|m| m.role == MessageRole::Assistant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn numbered(n: usize) -> Vec<ChatMessage> {
        (1..=n)
            .map(|i| {
                let role = if i % 2 == 0 {
                    MessageRole::Assistant
                } else {
                    MessageRole::User
                };
                ChatMessage::with_created(role, format!("m{i}"), i as i64)
            })
            .collect()
    }

    fn contents(messages: &[ChatMessage]) -> Vec<&str> {
        messages.iter().map(|m| m.content.as_str()).collect()
    }

    #[test]
    fn window_of_three_keeps_last_three() {
        let mut config = SessionConfig::new("test");
        config.memory_count = 3;
        config.compress_memory_enable = false;

        let history = numbered(5);
        let hi = ChatMessage::user("hi");
        let mut rng = StdRng::seed_from_u64(7);

        let out = build_request_messages(&config, &history, &hi, &mut rng);
        assert_eq!(contents(&out), vec!["m3", "m4", "m5", "hi"]);
    }

    #[test]
    fn short_history_is_sent_whole() {
        let mut config = SessionConfig::new("test");
        config.memory_count = 10;

        let history = numbered(2);
        let hi = ChatMessage::user("hi");
        let out = build_request_messages(&config, &history, &hi, &mut StdRng::seed_from_u64(1));
        assert_eq!(contents(&out), vec!["m1", "m2", "hi"]);
    }

    #[test]
    fn disabled_memory_sends_no_history() {
        let mut config = SessionConfig::new("test");
        config.memory_enable = false;

        let out = build_request_messages(
            &config,
            &numbered(6),
            &ChatMessage::user("hi"),
            &mut StdRng::seed_from_u64(1),
        );
        assert_eq!(contents(&out), vec!["hi"]);
    }

    #[test]
    fn certain_and_impossible_weights() {
        let system = vec![
            ChatMessage::system("always").with_probability(1.0),
            ChatMessage::system("never").with_probability(0.0),
        ];
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let picked = select_system_messages(&system, &mut rng);
            assert_eq!(contents(&picked), vec!["always"]);
        }
    }

    #[test]
    fn half_weight_is_sampled_per_call() {
        let system = vec![ChatMessage::system("maybe").with_probability(0.5)];
        let mut rng = StdRng::seed_from_u64(3);
        let included = (0..1000)
            .filter(|_| !select_system_messages(&system, &mut rng).is_empty())
            .count();
        assert!(included > 350 && included < 650, "included {included} of 1000");
    }

    #[test]
    fn summary_follows_system_messages_when_enabled() {
        let mut config = SessionConfig::new("test");
        config.memory_count = 1;
        config.system_messages = vec![ChatMessage::system("persona")];
        config.push_compressed_memory(ChatMessage::with_created(
            MessageRole::Assistant,
            "earlier talk",
            1,
        ));

        let out = build_request_messages(
            &config,
            &numbered(3),
            &ChatMessage::user("hi"),
            &mut StdRng::seed_from_u64(9),
        );
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].content, "persona");
        assert_eq!(out[1].role, MessageRole::System);
        assert!(out[1].content.ends_with("earlier talk"));
        assert_eq!(out[2].content, "m3");

        config.compress_memory_enable = false;
        let out = build_request_messages(
            &config,
            &numbered(3),
            &ChatMessage::user("hi"),
            &mut StdRng::seed_from_u64(9),
        );
        assert_eq!(contents(&out), vec!["persona", "m3", "hi"]);
    }

    #[test]
    fn candidate_is_latest_assistant_outside_window() {
        let mut config = SessionConfig::new("test");
        config.memory_count = 3;

        // m1..m6: assistants at m2, m4, m6; outside window = m1..m3
        let history = numbered(6);
        assert_eq!(compression_candidate(&config, &history), Some(1));

        config.memory_count = 6;
        assert_eq!(compression_candidate(&config, &history), None);
    }

    #[test]
    fn disabled_memory_makes_every_message_a_candidate() {
        let mut config = SessionConfig::new("test");
        config.memory_count = 6;
        config.memory_enable = false;

        let history = numbered(6);
        assert_eq!(compression_candidate(&config, &history), Some(5));
    }
}
