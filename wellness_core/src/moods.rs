//! Mood log.
//!
//! Entries are stored with `logged_at` in epoch milliseconds so day and
//! range lookups are plain range queries. Days are UTC days.

use crate::store::{encode, DocumentStore, Direction, Document, Query, SubscriptionId};
use crate::{Error, MoodEntry, MoodKind, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::cell::RefCell;
use std::rc::Rc;

/// Collection holding every user's mood entries
pub const MOODS: &str = "moods";

/// Mood entries belonging to one user
pub struct MoodRepository<'a, S: DocumentStore + ?Sized> {
    store: &'a mut S,
    user_id: String,
}

impl<'a, S: DocumentStore + ?Sized> MoodRepository<'a, S> {
    pub fn new(store: &'a mut S, user_id: impl Into<String>) -> Self {
        Self {
            store,
            user_id: user_id.into(),
        }
    }

    pub fn log(&mut self, mood: MoodKind, note: &str, at: DateTime<Utc>) -> Result<MoodEntry> {
        let mut entry = MoodEntry {
            id: String::new(),
            user_id: self.user_id.clone(),
            mood,
            note: note.trim().to_string(),
            logged_at: at,
        };
        entry.id = self.store.create(MOODS, encode(&entry)?)?;
        tracing::info!("Logged mood {} ({})", mood, entry.id);
        Ok(entry)
    }

    /// Entries with `from <= logged_at < to`, newest first
    pub fn list_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<MoodEntry>> {
        let query = self
            .user_query()
            .where_gte("logged_at", from.timestamp_millis())
            .where_lt("logged_at", to.timestamp_millis());
        decode_all(self.store.query(&query)?)
    }

    /// The latest `limit` entries, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<MoodEntry>> {
        decode_all(self.store.query(&self.user_query().limit(limit))?)
    }

    /// The last entry logged on a given day
    pub fn latest_on(&self, date: NaiveDate) -> Result<Option<MoodEntry>> {
        let (start, end) = day_bounds(date);
        Ok(self.list_between(start, end)?.into_iter().next())
    }

    pub fn delete(&mut self, id: &str) -> Result<()> {
        let doc = self
            .store
            .get(MOODS, id)?
            .ok_or_else(|| Error::not_found(MOODS, id))?;
        let entry: MoodEntry = doc.decode()?;
        if entry.user_id != self.user_id {
            return Err(Error::not_found(MOODS, id));
        }
        self.store.delete(MOODS, id)?;
        tracing::info!("Deleted mood entry {}", id);
        Ok(())
    }

    /// Live list of entries logged since `from`, newest first
    ///
    /// Malformed documents are left out of the snapshot and reported to
    /// `on_error`.
    pub fn watch_since<F, E>(
        &mut self,
        from: DateTime<Utc>,
        mut on_snapshot: F,
        on_error: E,
    ) -> Result<SubscriptionId>
    where
        F: FnMut(&[MoodEntry]) + 'static,
        E: FnMut(&Error) + 'static,
    {
        let query = self
            .user_query()
            .where_gte("logged_at", from.timestamp_millis());
        let on_error = Rc::new(RefCell::new(on_error));
        let report = Rc::clone(&on_error);
        self.store.subscribe(
            query,
            Box::new(move |docs: &[Document]| {
                let entries: Vec<MoodEntry> = docs
                    .iter()
                    .filter_map(|doc| match decode_entry(doc) {
                        Ok(entry) => Some(entry),
                        Err(e) => {
                            tracing::warn!("Skipping mood entry {}: {}", doc.id, e);
                            (&mut *report.borrow_mut())(&e);
                            None
                        }
                    })
                    .collect();
                on_snapshot(&entries);
            }),
            Box::new(move |e: &Error| (&mut *on_error.borrow_mut())(e)),
        )
    }

    fn user_query(&self) -> Query {
        Query::collection(MOODS)
            .where_eq("user_id", self.user_id.as_str())
            .order_by("logged_at", Direction::Descending)
    }
}

/// Start of a UTC day and start of the next one
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

fn decode_entry(doc: &Document) -> Result<MoodEntry> {
    let mut entry: MoodEntry = doc.decode()?;
    entry.id = doc.id.clone();
    Ok(entry)
}

fn decode_all(docs: Vec<Document>) -> Result<Vec<MoodEntry>> {
    docs.iter().map(decode_entry).collect()
}
