//! Course Tracker - local learning progress for a course of lesson modules
//!
//! Tracks completion, bookmarks, reading position, time on page and daily
//! streaks, plus exercise results, reader preferences and per-module notes.
//! Everything is kept in a local key-value store; nothing leaves the machine.

pub mod app;
pub mod clock;
pub mod config;
pub mod content;
pub mod exercises;
pub mod format;
pub mod notes;
pub mod preferences;
pub mod progress;
pub mod storage;
pub mod tracker;

pub use app::{AppContext, Command, Outcome};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use content::{Catalog, Module};
pub use progress::{ProgressState, ProgressStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
