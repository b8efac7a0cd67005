//! Single-file chat.

use std::sync::Arc;

use tabula_core::chat::{ChatMessage, Conversation};
use tabula_core::{Result, TabulaError};
use tokio::sync::watch;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::cancel::run_cancellable;
use crate::data_service::DataService;

pub struct ChatFlow {
    data: Arc<DataService>,
    conversation: watch::Sender<Conversation>,
    cancel: CancellationToken,
}

impl ChatFlow {
    pub fn new(file_id: i64, data: Arc<DataService>) -> Self {
        let (conversation, _) = watch::channel(Conversation::new(file_id));
        Self {
            data,
            conversation,
            cancel: CancellationToken::new(),
        }
    }

    /// Continues an existing transcript, e.g. after the previous flow was cancelled.
    pub fn resume(conversation: Conversation, data: Arc<DataService>) -> Self {
        let (conversation, _) = watch::channel(conversation);
        Self {
            data,
            conversation,
            cancel: CancellationToken::new(),
        }
    }

    pub fn conversation(&self) -> Conversation {
        self.conversation.borrow().clone()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.conversation.borrow().messages().to_vec()
    }

    pub fn subscribe(&self) -> watch::Receiver<Conversation> {
        self.conversation.subscribe()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn drop_guard(&self) -> DropGuard {
        self.cancel.clone().drop_guard()
    }

    /// Asks `question` about the file and returns the assistant's reply.
    ///
    /// Blank questions are ignored (`Ok(None)`). A failed request becomes an
    /// assistant error message in the transcript rather than an `Err`; only
    /// cancellation is returned as an error.
    pub async fn send(&self, question: &str) -> Result<Option<ChatMessage>> {
        let mut request = None;
        self.conversation.send_if_modified(|conversation| {
            request = conversation.begin_send(question);
            request.is_some()
        });
        let Some(request) = request else {
            return Ok(None);
        };

        tracing::debug!(
            "chat question for file {} (conversation {:?})",
            request.file_id,
            request.conversation_id
        );

        match run_cancellable(&self.cancel, self.data.query(&request)).await {
            Ok(answer) => {
                self.conversation
                    .send_modify(|conversation| conversation.record_answer(answer));
            }
            Err(TabulaError::Cancelled) => return Err(TabulaError::Cancelled),
            Err(err) => {
                let reason = err.user_message("the request failed");
                tracing::warn!("chat request failed: {}", reason);
                self.conversation
                    .send_modify(|conversation| conversation.record_failure(&reason));
            }
        }

        Ok(self.conversation.borrow().messages().last().cloned())
    }

    /// Empties the transcript and starts a new conversation.
    pub fn clear(&self) {
        self.conversation.send_modify(Conversation::clear);
    }
}
