//! Per-conversation session state.

use std::{collections::HashMap, sync::Mutex};

use teloxide::types::{ChatId, UserId};

/// Identity of one conversation: a chat, and the user inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub chat_id: ChatId,
    pub user_id: Option<UserId>,
}

impl ConversationKey {
    #[must_use]
    pub fn new(chat_id: ChatId, user_id: Option<UserId>) -> Self {
        Self { chat_id, user_id }
    }
}

/// "Next text message is a search query" flags.
///
/// Flags are overwritten, never removed. `std::sync::Mutex` because every
/// operation is a synchronous map lookup and is never held across `.await`.
#[derive(Debug, Default)]
pub struct PendingSearches {
    flags: Mutex<HashMap<ConversationKey, bool>>,
}

impl PendingSearches {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: ConversationKey) {
        self.flags
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, true);
    }

    #[cfg(test)]
    #[must_use]
    pub fn is_pending(&self, key: ConversationKey) -> bool {
        self.flags
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
            .copied()
            .unwrap_or(false)
    }

    /// Read and clear the flag in one step. Returns whether it was set.
    pub fn take(&self, key: ConversationKey) -> bool {
        let mut flags = self.flags.lock().unwrap_or_else(|e| e.into_inner());
        flags
            .get_mut(&key)
            .map(std::mem::take)
            .unwrap_or(false)
    }
}
