use crate::llm::{ChatMessage, Role};

/// Everything one conversation owns. Mutated only by `ChatService`.
#[derive(Debug, Clone)]
pub struct ConversationState {
    messages: Vec<ChatMessage>,
    last_search_results: String,
    connection_checked: bool,
    pub model: String,
    pub host: String,
    pub rag_enabled: bool,
}

impl ConversationState {
    pub fn new(system_prompt: &str, model: &str, host: &str, rag_enabled: bool) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_prompt)],
            last_search_results: String::new(),
            connection_checked: false,
            model: model.to_string(),
            host: host.to_string(),
            rag_enabled,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Append a message and return its position in the history.
    pub fn push(&mut self, message: ChatMessage) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    /// The history as sent to the model: identical to the stored history
    /// except that the message at `index` carries `content` instead.
    pub fn outgoing_messages(&self, index: usize, content: &str) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .enumerate()
            .map(|(position, message)| {
                if position == index {
                    ChatMessage::new(message.role, content)
                } else {
                    message.clone()
                }
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Put the system prompt back at the head of the history unless one is
    /// already there.
    pub fn restore_system_prompt(&mut self, system_prompt: &str) {
        let has_system = self
            .messages
            .first()
            .is_some_and(|message| message.role == Role::System);
        if !has_system {
            self.messages.insert(0, ChatMessage::system(system_prompt));
        }
    }

    pub fn last_search_results(&self) -> &str {
        &self.last_search_results
    }

    pub fn cache_search_results(&mut self, formatted: String) {
        self.last_search_results = formatted;
    }

    pub fn is_connected(&self) -> bool {
        self.connection_checked
    }

    pub fn mark_connected(&mut self) {
        self.connection_checked = true;
    }
}
