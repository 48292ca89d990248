//! Conversation Store
//!
//! Keeps the recent history of every user the bot has talked to. Each
//! conversation is an ordered list of turns, oldest first, seeded with a
//! single system turn carrying the persona. After every user message the
//! relay trims the list to a fixed number of turns by dropping from the
//! front.
//!
//! Trimming is a blunt FIFO: once a conversation grows past the cap the
//! persona turn at index 0 is evicted like any other turn.
//!
//! The store hands out copies. A handler works on its own copy for the whole
//! turn and writes it back with `save`, so two turns for the same user that
//! overlap will race and the later `save` wins. Entries live for the
//! lifetime of the process.

use crate::llm::Message;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Default maximum number of turns kept after each user message
pub const DEFAULT_MAX_TURNS: usize = 10;

/// Persona seeded as the system turn of every new conversation
pub const DEFAULT_PERSONA: &str = "You are an intelligent assistant bot, named BookWorm, at the company BooksTime. You can assist bookkeepers, senior accountants, IT department, Senior Mangers and client service advisors with their queries to the best of your ability. You can provide sales support and management insights. You can advise staffs at BooksTime, a bookkeeping company, and answer their questions, and help them draft emails";

/// Ordered turns for a single user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation holding only the persona turn
    pub fn with_persona(persona: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(persona)],
        }
    }

    /// Append `{role: user, content: text}`
    pub fn append_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    /// Append `{role: assistant, content: text}`
    pub fn append_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(Message::assistant(text));
    }

    /// Drop the oldest turns until at most `max_len` remain.
    ///
    /// Index 0 is not special-cased, so the persona turn goes first.
    pub fn trim(&mut self, max_len: usize) {
        if self.messages.len() > max_len {
            let excess = self.messages.len() - max_len;
            self.messages.drain(..excess);
        }
    }

    /// All turns, oldest first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Process-wide map from user id to conversation
#[derive(Debug)]
pub struct ConversationStore {
    persona: String,
    conversations: RwLock<HashMap<String, Conversation>>,
}

impl ConversationStore {
    /// Create an empty store seeding new conversations with `persona`
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            conversations: RwLock::new(HashMap::new()),
        }
    }

    /// Return a copy of the user's conversation, or a fresh one holding the
    /// persona turn. A fresh conversation is not stored until `save`.
    pub async fn get_or_create(&self, user_id: &str) -> Conversation {
        let conversations = self.conversations.read().await;
        match conversations.get(user_id) {
            Some(existing) if !existing.is_empty() => existing.clone(),
            _ => Conversation::with_persona(self.persona.as_str()),
        }
    }

    /// Return a copy of the stored conversation, if any
    pub async fn get(&self, user_id: &str) -> Option<Conversation> {
        self.conversations.read().await.get(user_id).cloned()
    }

    /// Overwrite the stored conversation for `user_id`
    pub async fn save(&self, user_id: &str, conversation: Conversation) {
        self.conversations
            .write()
            .await
            .insert(user_id.to_string(), conversation);
    }

    /// Number of users with a stored conversation
    pub async fn user_count(&self) -> usize {
        self.conversations.read().await.len()
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA)
    }
}
