//! Per-user unlock state and progress

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unlock state of one achievement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementProgress {
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
    pub current_progress: f64,
}

impl AchievementProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self) -> bool {
        !self.unlocked
    }

    /// Raise progress to `value`. Lower values are ignored.
    ///
    /// Returns true if the stored value changed.
    pub(crate) fn advance(&mut self, value: f64) -> bool {
        if value > self.current_progress {
            self.current_progress = value;
            true
        } else {
            false
        }
    }

    pub(crate) fn unlock(&mut self, at: DateTime<Utc>) {
        self.unlocked = true;
        self.unlocked_at = Some(at);
    }

    /// Back to the initial locked state
    pub(crate) fn lock(&mut self) {
        *self = Self::default();
    }
}

/// Achievement key → progress.
///
/// Only the engine mutates entries; everyone else reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressStore {
    entries: BTreeMap<String, AchievementProgress>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a store from persisted entries
    pub fn from_entries(entries: impl IntoIterator<Item = (String, AchievementProgress)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&AchievementProgress> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AchievementProgress)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unlocked_count(&self) -> usize {
        self.entries.values().filter(|p| p.unlocked).count()
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut AchievementProgress> {
        self.entries.get_mut(key)
    }

    /// Entry for `key`, created locked if missing
    pub(crate) fn seed(&mut self, key: &str) -> &mut AchievementProgress {
        self.entries.entry(key.to_string()).or_default()
    }

    /// Replace the entry for `key` with a fresh locked one
    pub(crate) fn reset(&mut self, key: &str) {
        self.entries.insert(key.to_string(), AchievementProgress::new());
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<AchievementProgress> {
        self.entries.remove(key)
    }

    /// Drop entries whose key fails `keep`; returns the number removed
    pub(crate) fn retain_keys(&mut self, mut keep: impl FnMut(&str) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| keep(key));
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_is_monotonic() {
        let mut progress = AchievementProgress::new();
        assert!(progress.advance(3.0));
        assert!(!progress.advance(1.0));
        assert!(!progress.advance(3.0));
        assert_eq!(progress.current_progress, 3.0);
    }

    #[test]
    fn lock_clears_everything() {
        let mut progress = AchievementProgress::new();
        progress.advance(5.0);
        progress.unlock(Utc::now());

        progress.lock();

        assert_eq!(progress, AchievementProgress::default());
        assert!(progress.is_locked());
    }

    #[test]
    fn seed_keeps_existing_entry() {
        let mut store = ProgressStore::new();
        store.seed("a").advance(2.0);
        store.seed("a");
        assert_eq!(store.get("a").map(|p| p.current_progress), Some(2.0));

        store.reset("a");
        assert_eq!(store.get("a").map(|p| p.current_progress), Some(0.0));
    }

    #[test]
    fn retain_keys_reports_pruned() {
        let mut store = ProgressStore::new();
        store.seed("keep");
        store.seed("drop_a");
        store.seed("drop_b");

        let pruned = store.retain_keys(|k| k == "keep");

        assert_eq!(pruned, 2);
        assert_eq!(store.len(), 1);
        assert!(store.contains("keep"));
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut store = ProgressStore::new();
        store.seed("a").advance(1.0);
        let json = serde_json::to_value(&store).unwrap();
        assert_eq!(json["a"]["currentProgress"], 1.0);
        assert_eq!(json["a"]["unlocked"], false);
    }
}
