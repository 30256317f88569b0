//! Per-word memory levels.

use crate::models::MAX_LEVEL;
use crate::storage::{read_json, write_json, SharedStore, StorageResult, MEMORY_KEY};
use std::collections::HashMap;

/// Word -> level map, persisted after every change.
pub struct MemoryStore {
    store: SharedStore,
    levels: HashMap<String, u8>,
}

impl MemoryStore {
    /// Load levels from storage. Missing or corrupt data yields an empty map.
    pub fn load(store: SharedStore) -> Self {
        let levels = read_json::<HashMap<String, i64>>(store.as_ref(), MEMORY_KEY)
            .unwrap_or_default()
            .into_iter()
            .map(|(word, level)| (word, clamp_level(level)))
            .collect();

        Self { store, levels }
    }

    /// Level for a word, 0 when never answered.
    pub fn get(&self, word: &str) -> u8 {
        self.levels.get(word).copied().unwrap_or(0)
    }

    /// Store a level, clamped to the valid range, and persist.
    pub fn set(&mut self, word: &str, level: i64) -> StorageResult<u8> {
        let level = clamp_level(level);
        self.levels.insert(word.to_string(), level);
        write_json(self.store.as_ref(), MEMORY_KEY, &self.levels)?;
        Ok(level)
    }

    /// Raise the level after a correct answer, lower it after a wrong one.
    pub fn adjust(&mut self, word: &str, correct: bool) -> StorageResult<u8> {
        let current = i64::from(self.get(word));
        let next = if correct { current + 1 } else { current - 1 };
        self.set(word, next)
    }

    pub fn is_mastered(&self, word: &str) -> bool {
        self.get(word) == MAX_LEVEL
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }
}

fn clamp_level(level: i64) -> u8 {
    level.clamp(0, i64::from(MAX_LEVEL)) as u8
}
