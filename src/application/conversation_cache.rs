//! Per-conversation state cache.
//!
//! Each conversation lives behind its own `tokio::sync::Mutex`, so turns for
//! one conversation are processed strictly in order while different
//! conversations proceed independently. Entries are rebuilt from the
//! transcript on a miss, and evicted when a write discovers the cached copy
//! is behind the store or when the conversation reaches its terminal phase.
//!
//! The cache holds at most `capacity` idle conversations. Past that, the
//! least recently used entry that no request is holding is dropped; it is
//! replayed from the transcript if it comes back.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::error::ReflectionError;
use crate::domain::foundation::ConversationId;
use crate::domain::reflection::ConversationState;
use crate::ports::{TranscriptStore, TurnRecord};

/// A conversation's state together with its committed turns.
#[derive(Debug, Clone)]
pub struct CachedConversation {
    pub state: ConversationState,
    pub turns: Vec<TurnRecord>,
}

impl CachedConversation {
    pub fn new(state: ConversationState) -> Self {
        Self {
            state,
            turns: Vec::new(),
        }
    }

    /// Rebuilds a conversation by replaying its stored turns.
    pub async fn load(
        id: ConversationId,
        transcript: &dyn TranscriptStore,
    ) -> Result<Self, ReflectionError> {
        let record = transcript
            .find(id)
            .await?
            .ok_or(ReflectionError::NotFound(id))?;
        let turns = transcript.turns(id).await?;

        let state = ConversationState::replay(
            id,
            record.started_at,
            turns
                .iter()
                .map(|t| (&t.transition, t.phase_summary.as_deref(), t.created_at)),
        )
        .map_err(|err| {
            ReflectionError::Storage(format!("transcript for {} does not replay: {}", id, err))
        })?;

        Ok(Self { state, turns })
    }

    /// Turns committed in the currently open phase.
    pub fn current_phase_turns(&self) -> &[TurnRecord] {
        let start = self
            .turns
            .iter()
            .rposition(|t| t.transition.seals_phase())
            .map_or(0, |i| i + 1);
        &self.turns[start..]
    }
}

type Entry = Arc<Mutex<CachedConversation>>;

#[derive(Debug)]
struct Slot {
    entry: Entry,
    last_used: AtomicU64,
}

/// Shared map of live conversations.
#[derive(Debug)]
pub struct ConversationCache {
    entries: RwLock<HashMap<ConversationId, Slot>>,
    capacity: usize,
    clock: AtomicU64,
}

impl ConversationCache {
    pub const DEFAULT_CAPACITY: usize = 10_000;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            clock: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Inserts a freshly started conversation.
    pub async fn insert(&self, conversation: CachedConversation) -> Entry {
        let id = conversation.state.id();
        let entry = Arc::new(Mutex::new(conversation));
        let mut entries = self.entries.write().await;
        entries.insert(id, self.slot(Arc::clone(&entry)));
        self.shrink(&mut entries);
        entry
    }

    /// Returns the cached entry, loading it from the transcript on a miss.
    ///
    /// Terminal conversations are replayed on every call and never cached.
    pub async fn get_or_load(
        &self,
        id: ConversationId,
        transcript: &dyn TranscriptStore,
    ) -> Result<Entry, ReflectionError> {
        if let Some(entry) = self.lookup(id).await {
            return Ok(entry);
        }

        let loaded = CachedConversation::load(id, transcript).await?;
        if loaded.state.is_terminal() {
            return Ok(Arc::new(Mutex::new(loaded)));
        }

        let mut entries = self.entries.write().await;
        // Another request may have loaded it while we were reading.
        let slot = entries
            .entry(id)
            .or_insert_with(|| self.slot(Arc::new(Mutex::new(loaded))));
        self.touch(slot);
        let entry = Arc::clone(&slot.entry);
        self.shrink(&mut entries);
        Ok(entry)
    }

    /// Returns the cached entry without touching the transcript.
    pub async fn peek(&self, id: ConversationId) -> Option<Entry> {
        self.lookup(id).await
    }

    pub async fn evict(&self, id: ConversationId) {
        self.entries.write().await.remove(&id);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn lookup(&self, id: ConversationId) -> Option<Entry> {
        let entries = self.entries.read().await;
        let slot = entries.get(&id)?;
        self.touch(slot);
        Some(Arc::clone(&slot.entry))
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn slot(&self, entry: Entry) -> Slot {
        Slot {
            entry,
            last_used: AtomicU64::new(self.tick()),
        }
    }

    fn touch(&self, slot: &Slot) {
        slot.last_used.store(self.tick(), Ordering::Relaxed);
    }

    /// Drops idle entries, oldest first, until the map fits its capacity.
    /// Entries a request still holds are skipped.
    fn shrink(&self, entries: &mut HashMap<ConversationId, Slot>) {
        while entries.len() > self.capacity {
            let oldest_idle = entries
                .iter()
                .filter(|(_, slot)| Arc::strong_count(&slot.entry) == 1)
                .min_by_key(|(_, slot)| slot.last_used.load(Ordering::Relaxed))
                .map(|(id, _)| *id);

            match oldest_idle {
                Some(id) => {
                    entries.remove(&id);
                    tracing::debug!(conversation_id = %id, "Evicted idle conversation");
                }
                None => break,
            }
        }
    }
}

impl Default for ConversationCache {
    fn default() -> Self {
        Self::new()
    }
}
