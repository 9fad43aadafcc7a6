//! Habit records and completion tracking.

use crate::store::{encode, DocumentStore, Direction, Document, Fields, Query, SubscriptionId};
use crate::{Error, Habit, Result};
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

/// Collection holding every user's habits
pub const HABITS: &str = "habits";

/// Partial change to a habit; `None` fields are left as they are
#[derive(Clone, Debug, Default)]
pub struct HabitUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Habits belonging to one user
pub struct HabitRepository<'a, S: DocumentStore + ?Sized> {
    store: &'a mut S,
    user_id: String,
}

impl<'a, S: DocumentStore + ?Sized> HabitRepository<'a, S> {
    pub fn new(store: &'a mut S, user_id: impl Into<String>) -> Self {
        Self {
            store,
            user_id: user_id.into(),
        }
    }

    pub fn add(&mut self, name: &str, description: &str) -> Result<Habit> {
        let mut habit = Habit {
            id: String::new(),
            user_id: self.user_id.clone(),
            name: validate_name(name)?,
            description: description.trim().to_string(),
            created_at: Utc::now(),
            completed_dates: BTreeSet::new(),
        };
        habit.id = self.store.create(HABITS, encode(&habit)?)?;
        tracing::info!("Added habit '{}' ({})", habit.name, habit.id);
        Ok(habit)
    }

    /// All of the user's habits, oldest first
    pub fn list(&self) -> Result<Vec<Habit>> {
        let docs = self.store.query(&self.user_query())?;
        docs.into_iter()
            .map(|doc| {
                let mut habit: Habit = doc.decode()?;
                habit.id = doc.id;
                Ok(habit)
            })
            .collect()
    }

    /// A habit owned by this user; anyone else's is reported as missing
    pub fn get(&self, id: &str) -> Result<Habit> {
        let doc = self
            .store
            .get(HABITS, id)?
            .ok_or_else(|| Error::not_found(HABITS, id))?;
        let mut habit: Habit = doc.decode()?;
        if habit.user_id != self.user_id {
            return Err(Error::not_found(HABITS, id));
        }
        habit.id = doc.id;
        Ok(habit)
    }

    pub fn update(&mut self, id: &str, update: HabitUpdate) -> Result<Habit> {
        let mut habit = self.get(id)?;
        let mut fields = Fields::new();

        if let Some(name) = update.name {
            habit.name = validate_name(&name)?;
            fields.insert("name".into(), Value::String(habit.name.clone()));
        }
        if let Some(description) = update.description {
            habit.description = description.trim().to_string();
            fields.insert(
                "description".into(),
                Value::String(habit.description.clone()),
            );
        }

        if !fields.is_empty() {
            self.store.update(HABITS, id, fields)?;
        }
        Ok(habit)
    }

    pub fn delete(&mut self, id: &str) -> Result<()> {
        self.get(id)?;
        self.store.delete(HABITS, id)?;
        tracing::info!("Deleted habit {}", id);
        Ok(())
    }

    /// Mark or unmark a day as completed
    pub fn set_completed(&mut self, id: &str, date: NaiveDate, done: bool) -> Result<Habit> {
        let mut habit = self.get(id)?;
        let changed = if done {
            habit.completed_dates.insert(date)
        } else {
            habit.completed_dates.remove(&date)
        };

        if changed {
            let mut fields = Fields::new();
            fields.insert(
                "completed_dates".into(),
                serde_json::to_value(&habit.completed_dates)?,
            );
            self.store.update(HABITS, id, fields)?;
            tracing::debug!("Habit {} on {}: done={}", id, date, done);
        }
        Ok(habit)
    }

    /// Live list of the user's habits, redelivered on every change
    ///
    /// Malformed documents are left out and reported to `on_error`.
    pub fn watch<F, E>(&mut self, mut on_snapshot: F, on_error: E) -> Result<SubscriptionId>
    where
        F: FnMut(&[Habit]) + 'static,
        E: FnMut(&Error) + 'static,
    {
        let query = self.user_query();
        let on_error = Rc::new(RefCell::new(on_error));
        let report = Rc::clone(&on_error);
        self.store.subscribe(
            query,
            Box::new(move |docs: &[Document]| {
                let habits: Vec<Habit> = docs
                    .iter()
                    .filter_map(|doc| match doc.decode::<Habit>() {
                        Ok(mut habit) => {
                            habit.id = doc.id.clone();
                            Some(habit)
                        }
                        Err(e) => {
                            tracing::warn!("Skipping habit {}: {}", doc.id, e);
                            (&mut *report.borrow_mut())(&e);
                            None
                        }
                    })
                    .collect();
                on_snapshot(&habits);
            }),
            Box::new(move |e: &Error| (&mut *on_error.borrow_mut())(e)),
        )
    }

    fn user_query(&self) -> Query {
        Query::collection(HABITS)
            .where_eq("user_id", self.user_id.as_str())
            .order_by("created_at", Direction::Ascending)
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("habit name cannot be empty".into()));
    }
    Ok(name.to_string())
}
