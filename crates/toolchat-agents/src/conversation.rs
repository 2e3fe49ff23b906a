use toolchat_common::{ChatMessage, ChatRole};
use tracing::{debug, warn};

use crate::registry::ProviderConfig;

/// Assembles the message sequence sent to a provider.
#[derive(Debug, Clone, Copy)]
pub struct ConversationBuilder {
    history_limit: usize,
}

impl Default for ConversationBuilder {
    fn default() -> Self {
        Self { history_limit: 10 }
    }
}

impl ConversationBuilder {
    pub fn new(history_limit: usize) -> Self {
        Self { history_limit }
    }

    /// System prompt first, then the most recent history, then the new user turn.
    ///
    /// Caller-supplied system entries are dropped so the provider's prompt stays
    /// the only, and first, system message.
    pub fn build(
        &self,
        provider: &ProviderConfig,
        history: &[ChatMessage],
        user_message: &str,
    ) -> Vec<ChatMessage> {
        let history: Vec<&ChatMessage> = history
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .collect();

        let mut start = history.len().saturating_sub(self.history_limit);
        // A tool reply whose assistant call was cut off cannot lead the history.
        while history.get(start).is_some_and(|m| m.role == ChatRole::Tool) {
            start += 1;
        }
        if start > 0 {
            warn!(
                "history has {} entries, keeping the last {}",
                history.len(),
                history.len() - start
            );
        }

        let mut messages = Vec::with_capacity(history.len() - start + 2);
        messages.push(ChatMessage::system(provider.system_prompt.clone()));
        messages.extend(history[start..].iter().map(|m| (*m).clone()));
        messages.push(ChatMessage::user(user_message.trim()));

        debug!(provider = %provider.id, messages = messages.len(), "built conversation");
        messages
    }
}
