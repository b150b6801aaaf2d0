//! Conversation context assembly from persisted history.

use docqa_core::AppResult;
use docqa_history::HistoryStore;

/// Builds the conversational context string injected into prompts.
pub struct ContextBuilder {
    window_size: usize,
}

impl ContextBuilder {
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }

    /// Render the most recent turns of a session, oldest first.
    ///
    /// Each turn becomes a `Q:`/`A:` pair; a session with no history
    /// yields an empty string. Store failures propagate: answering
    /// with silently missing context would misattribute follow-up
    /// questions.
    pub fn build(&self, session_id: &str, store: &dyn HistoryStore) -> AppResult<String> {
        let mut turns = store.query_recent(session_id, self.window_size)?;
        turns.reverse();

        let rendered: Vec<String> = turns
            .iter()
            .map(|turn| format!("Q: {}\nA: {}", turn.question, turn.answer))
            .collect();

        Ok(rendered.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_history::SqliteHistoryStore;

    #[test]
    fn test_empty_history_renders_empty_string() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        let builder = ContextBuilder::new(5);

        assert_eq!(builder.build("fresh-session", &store).unwrap(), "");
    }

    #[test]
    fn test_turns_render_oldest_first() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        store.append("s1", "first question", "first answer").unwrap();
        store.append("s1", "second question", "second answer").unwrap();

        let builder = ContextBuilder::new(5);
        let context = builder.build("s1", &store).unwrap();

        assert_eq!(
            context,
            "Q: first question\nA: first answer\nQ: second question\nA: second answer"
        );
    }

    #[test]
    fn test_window_keeps_only_most_recent_turns() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        for i in 0..8 {
            store
                .append("s1", &format!("question {}", i), &format!("answer {}", i))
                .unwrap();
        }

        let builder = ContextBuilder::new(5);
        let context = builder.build("s1", &store).unwrap();

        // Turns 0-2 fell out of the window; 3-7 remain in order.
        assert!(!context.contains("question 2"));
        assert!(context.starts_with("Q: question 3"));
        assert!(context.ends_with("A: answer 7"));
        assert_eq!(context.matches("Q: ").count(), 5);
    }

    #[test]
    fn test_sessions_do_not_leak_into_each_other() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        store.append("s1", "mine", "yes").unwrap();
        store.append("s2", "theirs", "no").unwrap();

        let builder = ContextBuilder::new(5);
        let context = builder.build("s1", &store).unwrap();

        assert!(context.contains("mine"));
        assert!(!context.contains("theirs"));
    }
}
