//! In-memory team membership cache.
//!
//! Entries live as long as the owning client. Nothing invalidates them:
//! adding or removing users does not touch the cache, so callers that need
//! fresh data must ask for it.

use dashmap::DashMap;
use std::sync::Arc;

/// Team name to member list, shared between clones of one client.
#[derive(Debug, Clone, Default)]
pub struct MemberCache {
    cache: Arc<DashMap<String, Vec<String>>>,
}

impl MemberCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached members of a team.
    ///
    /// An empty list is reported as a miss.
    pub fn get(&self, team: &str) -> Option<Vec<String>> {
        let entry = self.cache.get(team)?;
        if entry.is_empty() {
            return None;
        }
        Some(entry.clone())
    }

    /// Store the members of a team, replacing any previous entry.
    pub fn set(&self, team: &str, members: Vec<String>) {
        self.cache.insert(team.to_string(), members);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_set_get() {
        let cache = MemberCache::new();
        cache.set("blue", vec!["alice".to_string(), "bob".to_string()]);

        let cached = cache.get("blue").unwrap();
        assert_eq!(cached, vec!["alice", "bob"]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_miss() {
        let cache = MemberCache::new();
        assert!(cache.get("nonexistent").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_empty_entry_is_a_miss() {
        let cache = MemberCache::new();
        cache.set("empty", Vec::new());
        assert!(cache.get("empty").is_none());
    }

    #[test]
    fn test_set_replaces_entry() {
        let cache = MemberCache::new();
        cache.set("blue", vec!["alice".to_string()]);
        cache.set("blue", vec!["carol".to_string()]);
        assert_eq!(cache.get("blue").unwrap(), vec!["carol"]);
    }
}
