// src/watch/registry.rs

//! Directory → key → subscriptions bookkeeping.
//!
//! The registry is pure data, guarded by the watcher's lock. Each key's
//! subscription set is published as an immutable `Arc` snapshot: every
//! mutation builds a new set and swaps it in, so the watch loop can iterate
//! a snapshot without holding the lock while registrations continue.
//!
//! Invariants:
//! - a directory maps to at most one key, and a key to exactly one
//!   directory;
//! - a key present in the registry has a non-empty subscription set.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::subscription::{Callback, Subscription};
use crate::service::WatchKey;

/// Immutable snapshot of the subscriptions on one key.
pub type SubscriptionSet = Arc<HashSet<Subscription>>;

/// Result of [`Registry::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    /// An equal `(directory, callback)` subscription was replaced.
    Overridden,
}

#[derive(Debug, Default)]
pub struct Registry {
    keys: HashMap<PathBuf, WatchKey>,
    subscriptions: HashMap<WatchKey, SubscriptionSet>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_for(&self, dir: &Path) -> Option<WatchKey> {
        self.keys.get(dir).copied()
    }

    pub fn directory_of(&self, key: WatchKey) -> Option<&Path> {
        self.keys
            .iter()
            .find(|(_, k)| **k == key)
            .map(|(dir, _)| dir.as_path())
    }

    pub fn is_watched(&self, dir: &Path) -> bool {
        self.keys.contains_key(dir)
    }

    /// Number of watched directories.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn directories(&self) -> impl Iterator<Item = &Path> {
        self.keys.keys().map(PathBuf::as_path)
    }

    /// Number of subscriptions on `dir`.
    pub fn subscription_count(&self, dir: &Path) -> usize {
        self.key_for(dir)
            .and_then(|key| self.subscriptions.get(&key))
            .map_or(0, |set| set.len())
    }

    /// Add `subscription` under `key`, replacing an equal one.
    ///
    /// If the directory was bound to a different key (its old handle died
    /// and the service handed out a new one), the subscriptions on the dead
    /// key are dropped and the new key starts empty.
    pub fn insert(&mut self, key: WatchKey, subscription: Subscription) -> Upsert {
        let dir = subscription.directory().to_path_buf();
        if let Some(old) = self.keys.insert(dir.clone(), key) {
            if old != key {
                let dropped = self.subscriptions.remove(&old).map_or(0, |set| set.len());
                debug!(
                    ?dir,
                    old = old.id(),
                    new = key.id(),
                    dropped,
                    "directory rebound to a new key"
                );
            }
        }

        let mut next: HashSet<Subscription> = self
            .subscriptions
            .get(&key)
            .map(|set| (**set).clone())
            .unwrap_or_default();
        let outcome = match next.replace(subscription) {
            Some(_) => Upsert::Overridden,
            None => Upsert::Inserted,
        };
        self.subscriptions.insert(key, Arc::new(next));
        outcome
    }

    /// Drop every subscription on `dir`. Returns `false` if it was not
    /// watched.
    pub fn remove_directory(&mut self, dir: &Path) -> bool {
        match self.keys.remove(dir) {
            Some(key) => {
                self.subscriptions.remove(&key);
                true
            }
            None => false,
        }
    }

    /// Drop the subscription of `callback` on `dir`.
    ///
    /// Returns `true` if a subscription was removed. The directory itself is
    /// dropped once its last subscription goes.
    pub fn remove_callback(&mut self, dir: &Path, callback: &Callback) -> bool {
        let Some(key) = self.key_for(dir) else {
            return false;
        };
        let Some(current) = self.subscriptions.get(&key) else {
            return false;
        };

        let next: HashSet<Subscription> = current
            .iter()
            .filter(|s| s.callback() != callback)
            .cloned()
            .collect();
        if next.len() == current.len() {
            return false;
        }

        if next.is_empty() {
            self.keys.remove(dir);
            self.subscriptions.remove(&key);
        } else {
            self.subscriptions.insert(key, Arc::new(next));
        }
        true
    }

    /// Current subscriptions on `key`, if any.
    pub fn snapshot(&self, key: WatchKey) -> Option<SubscriptionSet> {
        self.subscriptions.get(&key).cloned()
    }

    /// Forget a key whose handle became invalid.
    ///
    /// Returns the directory it was bound to, or `None` if the key was
    /// already gone (unregistered, or rebound to a newer key).
    pub fn purge_key(&mut self, key: WatchKey) -> Option<PathBuf> {
        self.subscriptions.remove(&key)?;
        let dir = self.directory_of(key)?.to_path_buf();
        self.keys.remove(&dir);
        Some(dir)
    }
}
