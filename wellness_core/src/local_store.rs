//! Bundled [`DocumentStore`] implementation.
//!
//! Keeps every collection in memory and, when opened on a path, rewrites a
//! JSON snapshot after each successful mutation. A write whose snapshot
//! cannot be saved is rejected and leaves the in-memory data untouched.

use crate::persist;
use crate::store::{
    Document, DocumentStore, ErrorCallback, Fields, Query, SnapshotCallback, SubscriptionId,
};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

type Collections = BTreeMap<String, BTreeMap<String, Fields>>;

struct Subscription {
    id: SubscriptionId,
    query: Query,
    on_snapshot: SnapshotCallback,
    on_error: ErrorCallback,
}

/// In-memory document store with optional JSON file persistence
pub struct LocalStore {
    data: Collections,
    path: Option<PathBuf>,
    subscriptions: Vec<Subscription>,
    next_subscription: u64,
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("collections", &self.data.len())
            .field("path", &self.path)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl LocalStore {
    /// A store that forgets everything when dropped
    pub fn in_memory() -> Self {
        Self {
            data: Collections::new(),
            path: None,
            subscriptions: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Load a store snapshot, starting empty if the file is missing or corrupt
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data: Collections = persist::load_json(&path)?;
        tracing::debug!(
            "Opened store {:?} with {} collections",
            path,
            data.len()
        );
        Ok(Self {
            data,
            path: Some(path),
            subscriptions: Vec::new(),
            next_subscription: 0,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of records in a collection
    pub fn count(&self, collection: &str) -> usize {
        self.data.get(collection).map_or(0, BTreeMap::len)
    }

    /// Apply a mutation to a copy, persist it, then swap it in and notify
    /// subscribers of the collection
    ///
    /// File-backed stores reload the snapshot under the file lock first, so
    /// the mutation sees writes made by other processes since `open`.
    fn write<R, F>(&mut self, collection: &str, mutate: F) -> Result<R>
    where
        F: FnOnce(&mut Collections) -> Result<R>,
    {
        let (_lock, mut next) = match &self.path {
            Some(path) => {
                let lock = persist::FileLock::acquire(path)?;
                (Some(lock), persist::load_json(path)?)
            }
            None => (None, self.data.clone()),
        };
        let result = mutate(&mut next)?;

        if let Some(path) = &self.path {
            if let Err(e) = persist::save_json(path, &next) {
                tracing::warn!("Failed to persist store {:?}: {}", path, e);
                let failure = Error::Store(format!("could not save {}: {}", collection, e));
                for sub in self
                    .subscriptions
                    .iter_mut()
                    .filter(|s| s.query.collection == collection)
                {
                    (sub.on_error)(&failure);
                }
                return Err(failure);
            }
        }

        self.data = next;
        self.notify(collection);
        Ok(result)
    }

    fn notify(&mut self, collection: &str) {
        for sub in self
            .subscriptions
            .iter_mut()
            .filter(|s| s.query.collection == collection)
        {
            let snapshot = run_query(&self.data, &sub.query);
            (sub.on_snapshot)(&snapshot);
        }
    }
}

fn run_query(data: &Collections, query: &Query) -> Vec<Document> {
    let Some(records) = data.get(&query.collection) else {
        return Vec::new();
    };
    query.apply(records.iter().map(|(id, fields)| Document {
        id: id.clone(),
        fields: fields.clone(),
    }))
}

impl DocumentStore for LocalStore {
    fn create(&mut self, collection: &str, fields: Fields) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let key = id.clone();
        self.write(collection, move |data| {
            data.entry(collection.to_string())
                .or_default()
                .insert(key, fields);
            Ok(())
        })?;
        tracing::debug!("Created {}/{}", collection, id);
        Ok(id)
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        Ok(self
            .data
            .get(collection)
            .and_then(|records| records.get(id))
            .map(|fields| Document {
                id: id.to_string(),
                fields: fields.clone(),
            }))
    }

    fn query(&self, query: &Query) -> Result<Vec<Document>> {
        Ok(run_query(&self.data, query))
    }

    fn update(&mut self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        self.write(collection, |data| {
            let record = data
                .get_mut(collection)
                .and_then(|records| records.get_mut(id))
                .ok_or_else(|| Error::not_found(collection, id))?;
            for (key, value) in fields {
                record.insert(key, value);
            }
            Ok(())
        })?;
        tracing::debug!("Updated {}/{}", collection, id);
        Ok(())
    }

    fn delete(&mut self, collection: &str, id: &str) -> Result<()> {
        self.write(collection, |data| {
            data.get_mut(collection)
                .and_then(|records| records.remove(id))
                .map(|_| ())
                .ok_or_else(|| Error::not_found(collection, id))
        })?;
        tracing::debug!("Deleted {}/{}", collection, id);
        Ok(())
    }

    fn subscribe(
        &mut self,
        query: Query,
        mut on_snapshot: SnapshotCallback,
        on_error: ErrorCallback,
    ) -> Result<SubscriptionId> {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);

        on_snapshot(&run_query(&self.data, &query));

        tracing::debug!("Subscribed {:?} to '{}'", id, query.collection);
        self.subscriptions.push(Subscription {
            id,
            query,
            on_snapshot,
            on_error,
        });
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        before != self.subscriptions.len()
    }
}
