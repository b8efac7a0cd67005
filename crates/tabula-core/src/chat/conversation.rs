use super::message::{ChatMessage, QueryAnswer, QueryRequest};

/// Append-only transcript of one chat about one file.
///
/// The conversation id is whatever the backend returned last; it is never
/// generated or checked on the client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    file_id: i64,
    messages: Vec<ChatMessage>,
    conversation_id: Option<String>,
}

impl Conversation {
    pub fn new(file_id: i64) -> Self {
        Self {
            file_id,
            messages: Vec::new(),
            conversation_id: None,
        }
    }

    pub fn file_id(&self) -> i64 {
        self.file_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// Appends the user's question and returns the request to send.
    ///
    /// Returns `None` for blank input; nothing is appended then.
    pub fn begin_send(&mut self, question: &str) -> Option<QueryRequest> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }

        self.messages.push(ChatMessage::user(question));
        Some(QueryRequest {
            file_id: self.file_id,
            question: question.to_string(),
            conversation_id: self.conversation_id.clone(),
        })
    }

    pub fn record_answer(&mut self, answer: QueryAnswer) {
        self.conversation_id = Some(answer.conversation_id);
        self.messages
            .push(ChatMessage::assistant(answer.answer, answer.chart));
    }

    pub fn record_failure(&mut self, reason: &str) {
        self.messages.push(ChatMessage::assistant_error(format!(
            "Sorry, I couldn't answer that: {}",
            reason
        )));
    }

    /// Drops every message and forgets the conversation id.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.conversation_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::MessageRole;

    fn answer(id: &str) -> QueryAnswer {
        QueryAnswer {
            answer: "March".into(),
            conversation_id: id.into(),
            chart: None,
        }
    }

    #[test]
    fn test_conversation_id_threads_later_turns() {
        let mut conversation = Conversation::new(5);

        let first = conversation.begin_send("Best month?").unwrap();
        assert!(first.conversation_id.is_none());
        conversation.record_answer(answer("conv-1"));

        let second = conversation.begin_send("And the worst?").unwrap();
        assert_eq!(second.conversation_id.as_deref(), Some("conv-1"));
        assert_eq!(second.file_id, 5);
    }

    #[test]
    fn test_failure_does_not_assign_conversation_id() {
        let mut conversation = Conversation::new(5);
        conversation.begin_send("Best month?").unwrap();
        conversation.record_failure("Network error: offline");

        let retry = conversation.begin_send("Best month?").unwrap();
        assert!(retry.conversation_id.is_none());

        let roles: Vec<_> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![MessageRole::User, MessageRole::Assistant, MessageRole::User]
        );
        assert!(conversation.messages()[1].is_error);
    }

    #[test]
    fn test_blank_question_ignored() {
        let mut conversation = Conversation::new(1);
        assert!(conversation.begin_send("   ").is_none());
        assert!(conversation.messages().is_empty());
    }

    #[test]
    fn test_clear_forgets_everything() {
        let mut conversation = Conversation::new(1);
        conversation.begin_send("q").unwrap();
        conversation.record_answer(answer("conv-9"));
        conversation.clear();

        assert!(conversation.messages().is_empty());
        assert!(conversation.conversation_id().is_none());
    }
}
