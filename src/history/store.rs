use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Result, anyhow};
use chrono::NaiveDateTime;
use fjall::Keyspace;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};
use tokio::task;

use crate::models::{HistoryEntry, HistoryRecord};

const INDEX_KEY: &str = "index";

/// Live ids and the next id to hand out
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IdIndex {
    next_id: u64,
    ids: BTreeSet<u64>,
}

impl Default for IdIndex {
    fn default() -> Self {
        // 0 is never assigned: it marks a record that has no id yet
        Self {
            next_id: 1,
            ids: BTreeSet::new(),
        }
    }
}

/// Persistent, id-keyed log of history records.
///
/// Writers are serialised through the id index; readers only take the index
/// lock long enough to copy the live ids. Every change bumps a version that
/// subscribers can watch.
pub struct HistoryStore {
    records: Keyspace,
    meta: Keyspace,
    index: Mutex<IdIndex>,
    changes: watch::Sender<u64>,
}

fn record_key(id: u64) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

fn write_record(store: &Keyspace, record: &HistoryRecord) -> Result<()> {
    let bytes = postcard::to_stdvec(record)?;
    store.insert(record_key(record.id), bytes)?;
    Ok(())
}

fn read_record(store: &Keyspace, id: u64) -> Result<Option<HistoryRecord>> {
    match get_from_store(store.clone(), record_key(id))? {
        Some(bytes) => Ok(Some(postcard::from_bytes(&bytes)?)),
        None => Ok(None),
    }
}

fn write_index(store: &Keyspace, index: &IdIndex) -> Result<()> {
    let bytes = postcard::to_stdvec(index)?;
    store.insert(INDEX_KEY.as_bytes().to_vec(), bytes)?;
    Ok(())
}

fn successor(id: u64) -> Result<u64> {
    id.checked_add(1)
        .ok_or_else(|| anyhow!("history id space exhausted"))
}

fn newest_first(records: &mut [HistoryRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
}

impl HistoryStore {
    /// Open (or create) the store in `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let records = db.keyspace("records", fjall::KeyspaceCreateOptions::default)?;
        let meta = db.keyspace("meta", fjall::KeyspaceCreateOptions::default)?;

        let index = match get_from_store(meta.clone(), INDEX_KEY.as_bytes().to_vec())? {
            Some(bytes) => postcard::from_bytes(&bytes)?,
            None => IdIndex::default(),
        };
        tracing::debug!(
            "Opened history store with {} records, next id {}",
            index.ids.len(),
            index.next_id
        );

        let (changes, _) = watch::channel(0);
        Ok(Self {
            records,
            meta,
            index: Mutex::new(index),
            changes,
        })
    }

    /// Receiver whose value changes after every write
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }

    /// Store a new record under a freshly assigned id
    #[tracing::instrument(name = "insert_history", level = "debug", skip(self, entry))]
    pub async fn insert(&self, entry: HistoryEntry) -> Result<u64> {
        let mut index = self.index.lock().await;
        let id = index.next_id;
        let record = entry.into_record(id);

        let mut next = index.clone();
        next.next_id = successor(id)?;
        next.ids.insert(id);

        let (records, meta) = (self.records.clone(), self.meta.clone());
        let persisted = next.clone();
        task::spawn_blocking(move || -> Result<()> {
            write_record(&records, &record)?;
            write_index(&meta, &persisted)
        })
        .await??;

        *index = next;
        drop(index);
        self.notify();
        tracing::debug!("Inserted history record {}", id);
        Ok(id)
    }

    /// Insert or replace by id; a record with id 0 gets a fresh id
    pub async fn upsert(&self, record: HistoryRecord) -> Result<u64> {
        let ids = self.upsert_all(vec![record]).await?;
        Ok(ids[0])
    }

    /// Insert or replace every record, returning the ids in input order
    #[tracing::instrument(name = "upsert_history", level = "debug", skip_all, fields(count = records.len()))]
    pub async fn upsert_all(&self, records: Vec<HistoryRecord>) -> Result<Vec<u64>> {
        let mut index = self.index.lock().await;
        let mut next = index.clone();

        let mut assigned = Vec::with_capacity(records.len());
        let mut to_write = Vec::with_capacity(records.len());
        for mut record in records {
            if record.id == 0 {
                record.id = next.next_id;
            }
            next.next_id = next.next_id.max(successor(record.id)?);
            next.ids.insert(record.id);
            assigned.push(record.id);
            to_write.push(record);
        }

        let (store, meta) = (self.records.clone(), self.meta.clone());
        let persisted = next.clone();
        task::spawn_blocking(move || -> Result<()> {
            for record in &to_write {
                write_record(&store, record)?;
            }
            write_index(&meta, &persisted)
        })
        .await??;

        *index = next;
        drop(index);
        self.notify();
        Ok(assigned)
    }

    /// Replace an existing record; returns false and writes nothing if it is absent
    pub async fn update(&self, record: HistoryRecord) -> Result<bool> {
        let index = self.index.lock().await;
        if !index.ids.contains(&record.id) {
            return Ok(false);
        }

        let store = self.records.clone();
        task::spawn_blocking(move || write_record(&store, &record)).await??;

        drop(index);
        self.notify();
        Ok(true)
    }

    /// Remove the record with the same id
    pub async fn delete(&self, record: &HistoryRecord) -> Result<bool> {
        self.delete_by_id(record.id).await
    }

    /// Remove a record; returns whether it existed
    #[tracing::instrument(name = "delete_history", level = "debug", skip(self))]
    pub async fn delete_by_id(&self, id: u64) -> Result<bool> {
        let mut index = self.index.lock().await;
        if !index.ids.contains(&id) {
            tracing::debug!("Key not found");
            return Ok(false);
        }

        let mut next = index.clone();
        next.ids.remove(&id);

        let (store, meta) = (self.records.clone(), self.meta.clone());
        let persisted = next.clone();
        task::spawn_blocking(move || -> Result<()> {
            write_index(&meta, &persisted)?;
            store.remove(record_key(id))?;
            Ok(())
        })
        .await??;

        *index = next;
        drop(index);
        self.notify();
        Ok(true)
    }

    /// Remove every record; returns how many were removed. Ids are not reused.
    #[tracing::instrument(name = "clear_history", level = "debug", skip(self))]
    pub async fn delete_all(&self) -> Result<usize> {
        let mut index = self.index.lock().await;

        let removed: Vec<u64> = index.ids.iter().copied().collect();
        let next = IdIndex {
            next_id: index.next_id,
            ids: BTreeSet::new(),
        };

        let (store, meta) = (self.records.clone(), self.meta.clone());
        let persisted = next.clone();
        let ids = removed.clone();
        task::spawn_blocking(move || -> Result<()> {
            write_index(&meta, &persisted)?;
            for id in ids {
                store.remove(record_key(id))?;
            }
            Ok(())
        })
        .await??;

        *index = next;
        drop(index);
        self.notify();
        Ok(removed.len())
    }

    /// Point lookup
    pub async fn get(&self, id: u64) -> Result<Option<HistoryRecord>> {
        if !self.index.lock().await.ids.contains(&id) {
            return Ok(None);
        }
        let store = self.records.clone();
        task::spawn_blocking(move || read_record(&store, id)).await?
    }

    /// All records, newest timestamp first
    pub async fn list(&self) -> Result<Vec<HistoryRecord>> {
        let ids: Vec<u64> = self.index.lock().await.ids.iter().copied().collect();
        let store = self.records.clone();

        let mut records = task::spawn_blocking(move || -> Result<Vec<HistoryRecord>> {
            let mut records = Vec::with_capacity(ids.len());
            for id in ids {
                // A concurrent delete may have removed it since the ids were copied
                if let Some(record) = read_record(&store, id)? {
                    records.push(record);
                }
            }
            Ok(records)
        })
        .await??;

        newest_first(&mut records);
        Ok(records)
    }

    /// Records with `start <= timestamp <= end`, newest first
    pub async fn list_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<HistoryRecord>> {
        let mut records = self.list().await?;
        records.retain(|r| r.timestamp >= start && r.timestamp <= end);
        Ok(records)
    }

    /// Records whose description contains `text` (case-insensitive), newest first
    pub async fn search(&self, text: &str) -> Result<Vec<HistoryRecord>> {
        let mut records = self.list().await?;
        records.retain(|r| r.description_contains(text));
        Ok(records)
    }

    pub async fn count(&self) -> usize {
        self.index.lock().await.ids.len()
    }
}
