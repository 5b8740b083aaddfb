//! In-memory profile store, keyed by the normalized name+affiliation
//! identity key. Profiles are superseded whole on re-upsert, never merged.
//! Intentionally non-durable: nothing survives a process restart.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tracing::debug;

use crate::models::candidate::{profile_key, Paper, StoredProfile};

/// The fields a caller proposes for persistence; the store assigns identity
/// and timestamps.
#[derive(Debug, Clone)]
pub struct ProfileDraft {
    pub name: String,
    pub affiliation: String,
    pub summary: String,
    pub top_papers: Vec<Paper>,
}

#[derive(Clone, Default)]
pub struct ProfileStore {
    inner: Arc<RwLock<HashMap<String, StoredProfile>>>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a profile. An existing profile under the same
    /// identity key is superseded; its `created_at` is preserved.
    pub fn upsert(&self, draft: ProfileDraft) -> StoredProfile {
        let id = profile_key(&draft.name, &draft.affiliation);
        let now = Utc::now();

        let mut profiles = self.inner.write().expect("profile store lock poisoned");
        let created_at = profiles.get(&id).map(|p| p.created_at).unwrap_or(now);
        let stored = StoredProfile {
            id: id.clone(),
            name: draft.name,
            affiliation: draft.affiliation,
            summary: draft.summary,
            top_papers: draft.top_papers,
            created_at,
            updated_at: now,
        };
        debug!("stored profile {id}");
        profiles.insert(id, stored.clone());
        stored
    }

    pub fn get(&self, name: &str, affiliation: &str) -> Option<StoredProfile> {
        self.get_by_id(&profile_key(name, affiliation))
    }

    pub fn get_by_id(&self, id: &str) -> Option<StoredProfile> {
        self.inner
            .read()
            .expect("profile store lock poisoned")
            .get(id)
            .cloned()
    }

    /// All profiles, most recently updated first.
    pub fn get_all(&self) -> Vec<StoredProfile> {
        let profiles = self.inner.read().expect("profile store lock poisoned");
        let mut all: Vec<StoredProfile> = profiles.values().cloned().collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        all
    }

    pub fn count(&self) -> usize {
        self.inner.read().expect("profile store lock poisoned").len()
    }
}
