#![forbid(unsafe_code)]

//! Core domain model and business logic for the wellness tracker.
//!
//! This crate provides:
//! - Domain types (exercises, routines, playback state, stored records)
//! - Exercise catalog
//! - Routine player state machine and its tick-driven session
//! - Document store and auth service interfaces with local implementations
//! - Repositories (profiles, habits, moods, quotes)
//! - Aggregated statistics

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod player;
pub mod session;
pub mod persist;
pub mod store;
pub mod local_store;
pub mod auth;
pub mod users;
pub mod habits;
pub mod moods;
pub mod quotes;
pub mod stats;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_routine, categories, routine_for_category};
pub use config::Config;
pub use player::{RoutinePlayer, TICK_INTERVAL_MS};
pub use session::RoutineSession;
pub use store::{Direction, Document, DocumentStore, Query, SubscriptionId};
pub use local_store::LocalStore;
pub use auth::{AuthService, LocalAuth};
pub use users::{AccountService, UserRepository};
pub use habits::{HabitRepository, HabitUpdate};
pub use moods::MoodRepository;
pub use quotes::QuoteRepository;
pub use stats::{HabitSummary, MoodSummary};
