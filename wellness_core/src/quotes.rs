//! Motivational quotes with a bundled fallback list.

use crate::store::{encode, DocumentStore, Direction, Query};
use crate::{Error, Quote, Result};
use chrono::{Datelike, NaiveDate, Utc};
use serde_json::Value;

/// Collection holding shared quotes
pub const QUOTES: &str = "quotes";

/// Shown when the store has no quotes or cannot be read
const FALLBACK_QUOTES: &[(&str, &str)] = &[
    ("The secret of getting ahead is getting started.", "Mark Twain"),
    ("It does not matter how slowly you go as long as you do not stop.", "Confucius"),
    ("Take care of your body. It's the only place you have to live.", "Jim Rohn"),
    ("Almost everything will work again if you unplug it for a few minutes, including you.", "Anne Lamott"),
    ("Small daily improvements over time lead to stunning results.", "Robin Sharma"),
    ("You don't have to see the whole staircase, just take the first step.", "Martin Luther King Jr."),
    ("Happiness is not something ready made. It comes from your own actions.", "Dalai Lama"),
];

pub fn fallback_quotes() -> Vec<Quote> {
    FALLBACK_QUOTES
        .iter()
        .map(|(text, author)| Quote {
            text: (*text).to_string(),
            author: (*author).to_string(),
        })
        .collect()
}

pub struct QuoteRepository<'a, S: DocumentStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: DocumentStore + ?Sized> QuoteRepository<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    pub fn add(&mut self, text: &str, author: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Validation("quote text cannot be empty".into()));
        }
        let author = match author.trim() {
            "" => "Unknown",
            name => name,
        };
        let mut fields = encode(&Quote {
            text: text.to_string(),
            author: author.to_string(),
        })?;
        fields.insert(
            "created_at".into(),
            Value::from(Utc::now().timestamp_millis()),
        );
        self.store.create(QUOTES, fields)
    }

    /// Stored quotes in insertion order
    pub fn all(&self) -> Result<Vec<Quote>> {
        let query = Query::collection(QUOTES).order_by("created_at", Direction::Ascending);
        self.store
            .query(&query)?
            .iter()
            .map(|doc| doc.decode())
            .collect()
    }

    /// The same quote all day, cycling through the list day by day
    pub fn quote_for_day(&self, date: NaiveDate) -> Quote {
        let quotes = match self.all() {
            Ok(quotes) if !quotes.is_empty() => quotes,
            Ok(_) => {
                tracing::debug!("No stored quotes, using bundled list");
                fallback_quotes()
            }
            Err(e) => {
                tracing::warn!("Failed to load quotes: {}. Using bundled list.", e);
                fallback_quotes()
            }
        };
        let index = date.num_days_from_ce().rem_euclid(quotes.len() as i32) as usize;
        quotes[index].clone()
    }
}
