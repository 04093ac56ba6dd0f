use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryScope {
    List,
    Detail,
}

/// `resource -> scope -> fingerprint`. Invalidation works on any prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryKey {
    pub resource: String,
    pub scope: QueryScope,
    pub fingerprint: String,
}

impl QueryKey {
    pub fn list(resource: &str, params: &Value) -> Self {
        Self {
            resource: resource.to_string(),
            scope: QueryScope::List,
            fingerprint: fingerprint(params),
        }
    }

    pub fn detail(resource: &str, id: &str) -> Self {
        Self {
            resource: resource.to_string(),
            scope: QueryScope::Detail,
            fingerprint: id.to_string(),
        }
    }
}

/// SHA-256 of the compact JSON. serde_json maps iterate in key order, so
/// equal params hash equally regardless of how the caller ordered them.
pub fn fingerprint(params: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(params.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Small result cache for processed table pages. Oldest entries go first
/// once `capacity` is reached.
pub struct QueryCache {
    capacity: usize,
    entries: VecDeque<(QueryKey, Value)>,
    hits: u64,
    misses: u64,
}

impl QueryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: &QueryKey) -> Option<Value> {
        match self.entries.iter().find(|(k, _)| k == key) {
            Some((_, v)) => {
                self.hits += 1;
                Some(v.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, key: QueryKey, value: Value) {
        if self.capacity == 0 {
            return;
        }
        self.entries.retain(|(k, _)| k != &key);
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((key, value));
    }

    /// Drops every list and detail entry of `resource`.
    pub fn invalidate(&mut self, resource: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k.resource != resource);
        let dropped = before - self.entries.len();
        if dropped > 0 {
            tracing::debug!(resource, dropped, "invalidated cached queries");
        }
        dropped
    }

    pub fn invalidate_scope(&mut self, resource: &str, scope: QueryScope) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|(k, _)| !(k.resource == resource && k.scope == scope));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
