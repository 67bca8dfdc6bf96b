//! Reading progress tracking
//!
//! Completion, bookmarks, the last visited module, scroll progress, time on
//! page and daily streaks. Every mutation is written through to storage
//! before returning.

pub mod streak;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::storage::{KeyValueStore, PROGRESS_KEY, load_record, save_record};

/// Persisted progress record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressState {
    /// Modules the reader marked complete
    pub completed_modules: BTreeSet<String>,

    /// Modules the reader bookmarked
    pub bookmarked_modules: BTreeSet<String>,

    /// Module most recently navigated into
    pub last_visited_module: Option<String>,

    /// When `last_visited_module` was last set
    pub last_visited_at: Option<DateTime<Utc>>,

    /// Scroll progress per module (0-100)
    pub module_progress: BTreeMap<String, f64>,

    /// Foreground seconds per module
    pub time_spent: BTreeMap<String, u64>,

    /// Current run of consecutive active days
    pub streak_days: u32,

    /// Most recent active day
    pub last_activity_date: Option<NaiveDate>,

    /// Longest run ever observed
    pub longest_streak: u32,

    /// Active days, ascending, capped to the most recent 365
    pub activity_history: Vec<NaiveDate>,
}

/// Whole-number percentage of `done` out of `total`, zero when `total` is zero
pub fn percentage(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (done as f64 / total as f64 * 100.0).round() as u32
}

/// Write-through store for [`ProgressState`]
pub struct ProgressStore {
    state: ProgressState,
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl ProgressStore {
    /// Load the persisted record, repairing any broken history invariants
    pub fn load(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let mut state: ProgressState = load_record(storage.as_ref(), PROGRESS_KEY);
        streak::normalize(&mut state);
        Self { state, storage, clock }
    }

    /// Current state
    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Write the whole record to storage
    pub fn flush(&self) {
        save_record(self.storage.as_ref(), PROGRESS_KEY, &self.state);
    }

    /// Mark a module complete. Marking it again changes nothing.
    pub fn mark_complete(&mut self, slug: &str) {
        if self.state.completed_modules.insert(slug.to_string()) {
            tracing::info!("Completed module {}", slug);
            self.flush();
        }
    }

    /// Remove a module from the completed set
    pub fn mark_incomplete(&mut self, slug: &str) {
        if self.state.completed_modules.remove(slug) {
            tracing::info!("Reopened module {}", slug);
            self.flush();
        }
    }

    /// Flip completion, returning the new value
    pub fn toggle_complete(&mut self, slug: &str) -> bool {
        let completed = toggle(&mut self.state.completed_modules, slug);
        self.flush();
        completed
    }

    /// Is the module complete?
    pub fn is_completed(&self, slug: &str) -> bool {
        self.state.completed_modules.contains(slug)
    }

    /// Flip the bookmark, returning the new value
    pub fn toggle_bookmark(&mut self, slug: &str) -> bool {
        let bookmarked = toggle(&mut self.state.bookmarked_modules, slug);
        self.flush();
        bookmarked
    }

    /// Is the module bookmarked?
    pub fn is_bookmarked(&self, slug: &str) -> bool {
        self.state.bookmarked_modules.contains(slug)
    }

    /// Remember the module being read; always refreshes the timestamp
    pub fn set_last_visited(&mut self, slug: &str) {
        self.state.last_visited_module = Some(slug.to_string());
        self.state.last_visited_at = Some(self.clock.now());
        self.flush();
    }

    /// Overwrite the scroll progress of a module, clamped to `[0, 100]`
    pub fn update_module_progress(&mut self, slug: &str, percent: f64) {
        let clamped = if percent.is_nan() { 0.0 } else { percent.clamp(0.0, 100.0) };
        if clamped != percent {
            tracing::warn!("Clamped progress for {} from {} to {}", slug, percent, clamped);
        }
        self.state.module_progress.insert(slug.to_string(), clamped);
        self.flush();
    }

    /// Scroll progress of a module, zero if never scrolled
    pub fn module_progress(&self, slug: &str) -> f64 {
        self.state.module_progress.get(slug).copied().unwrap_or(0.0)
    }

    /// Add foreground seconds to a module
    pub fn add_time_spent(&mut self, slug: &str, seconds: u64) {
        if seconds == 0 {
            tracing::debug!("Ignoring empty time sample for {}", slug);
            return;
        }
        let total = self.state.time_spent.entry(slug.to_string()).or_insert(0);
        *total = total.saturating_add(seconds);
        self.flush();
    }

    /// Seconds spent on a module
    pub fn time_spent(&self, slug: &str) -> u64 {
        self.state.time_spent.get(slug).copied().unwrap_or(0)
    }

    /// Seconds spent across all modules
    pub fn total_time_spent(&self) -> u64 {
        self.state.time_spent.values().fold(0u64, |acc, s| acc.saturating_add(*s))
    }

    /// Record today's activity and recount the streak.
    ///
    /// Returns false if activity was already recorded today.
    pub fn record_activity(&mut self) -> bool {
        let today = self.clock.today();
        let advanced = streak::record_day(&mut self.state, today);
        if advanced {
            tracing::info!(
                "Recorded activity for {} (streak {}, longest {})",
                today,
                self.state.streak_days,
                self.state.longest_streak
            );
            self.flush();
        }
        advanced
    }

    /// Streak as it should be displayed today
    pub fn current_streak(&self) -> u32 {
        streak::current_streak(&self.state, self.clock.today())
    }

    /// Share of `total` modules that are complete
    pub fn completion_percentage(&self, total: usize) -> u32 {
        percentage(self.state.completed_modules.len(), total)
    }
}

fn toggle(set: &mut BTreeSet<String>, slug: &str) -> bool {
    if set.remove(slug) {
        false
    } else {
        set.insert(slug.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::MemoryStore;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn store_on(day: &str) -> (ProgressStore, Arc<MemoryStore>, Arc<FixedClock>) {
        let storage = Arc::new(MemoryStore::default());
        let clock = Arc::new(FixedClock::on(date(day)));
        let store = ProgressStore::load(storage.clone(), clock.clone());
        (store, storage, clock)
    }

    #[test]
    fn starts_empty() {
        let (store, _, _) = store_on("2024-01-01");
        assert_eq!(store.state(), &ProgressState::default());
    }

    #[test]
    fn mark_complete_then_incomplete() {
        let (mut store, _, _) = store_on("2024-01-01");
        store.mark_complete("day-01");
        assert!(store.is_completed("day-01"));

        store.mark_incomplete("day-01");
        assert!(!store.is_completed("day-01"));
    }

    #[test]
    fn mark_complete_is_idempotent() {
        let (mut store, _, _) = store_on("2024-01-01");
        store.mark_complete("day-01");
        let once = store.state().completed_modules.clone();
        store.mark_complete("day-01");
        assert_eq!(store.state().completed_modules, once);
    }

    #[test]
    fn toggles_are_symmetric() {
        let (mut store, _, _) = store_on("2024-01-01");
        store.mark_complete("day-02");
        let original = store.state().clone();

        assert!(store.toggle_complete("day-01"));
        assert!(!store.toggle_complete("day-01"));
        assert!(store.toggle_bookmark("day-03"));
        assert!(!store.toggle_bookmark("day-03"));

        assert_eq!(store.state(), &original);
    }

    #[test]
    fn bookmarks_are_independent_of_completion() {
        let (mut store, _, _) = store_on("2024-01-01");
        store.toggle_bookmark("day-04");
        assert!(store.is_bookmarked("day-04"));
        assert!(!store.is_completed("day-04"));
    }

    #[test]
    fn set_last_visited_refreshes_timestamp() {
        let (mut store, _, clock) = store_on("2024-01-01");
        store.set_last_visited("day-01");
        let first = store.state().last_visited_at;

        clock.advance_days(1);
        store.set_last_visited("day-01");

        assert_eq!(store.state().last_visited_module.as_deref(), Some("day-01"));
        assert!(store.state().last_visited_at > first);
    }

    #[test]
    fn module_progress_is_overwritten_and_clamped() {
        let (mut store, _, _) = store_on("2024-01-01");
        store.update_module_progress("day-01", 40.0);
        store.update_module_progress("day-01", 25.0);
        assert_eq!(store.module_progress("day-01"), 25.0);

        store.update_module_progress("day-01", 140.0);
        assert_eq!(store.module_progress("day-01"), 100.0);

        store.update_module_progress("day-01", -3.0);
        assert_eq!(store.module_progress("day-01"), 0.0);

        store.update_module_progress("day-01", f64::NAN);
        assert_eq!(store.module_progress("day-01"), 0.0);
    }

    #[test]
    fn time_spent_accumulates() {
        let (mut store, _, _) = store_on("2024-01-01");
        store.add_time_spent("day-01", 30);
        store.add_time_spent("day-01", 45);
        store.add_time_spent("day-01", 0);
        store.add_time_spent("day-02", 10);

        assert_eq!(store.time_spent("day-01"), 75);
        assert_eq!(store.total_time_spent(), 85);
    }

    #[test]
    fn completion_percentage_guards_zero() {
        let (mut store, _, _) = store_on("2024-01-01");
        assert_eq!(store.completion_percentage(0), 0);

        for slug in ["day-01", "day-02", "day-03"] {
            store.mark_complete(slug);
        }
        assert_eq!(store.completion_percentage(10), 30);
        assert_eq!(store.completion_percentage(0), 0);
        assert_eq!(store.completion_percentage(9), 33);
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(5, 5), 100);
    }

    #[test]
    fn streak_scenario_through_store() {
        let (mut store, _, clock) = store_on("2024-01-01");
        store.record_activity();
        clock.set_date(date("2024-01-02"));
        store.record_activity();
        clock.set_date(date("2024-01-03"));
        store.record_activity();
        assert_eq!(store.state().streak_days, 3);
        assert_eq!(store.state().longest_streak, 3);

        clock.set_date(date("2024-01-10"));
        assert_eq!(store.current_streak(), 0);
        assert!(store.record_activity());
        assert!(!store.record_activity());
        assert_eq!(store.state().streak_days, 1);
        assert_eq!(store.state().longest_streak, 3);
    }

    #[test]
    fn state_survives_reload() {
        let (mut store, storage, clock) = store_on("2024-01-01");
        store.mark_complete("day-01");
        store.toggle_bookmark("day-02");
        store.set_last_visited("day-02");
        store.update_module_progress("day-02", 55.5);
        store.add_time_spent("day-02", 120);
        store.record_activity();
        let before = store.state().clone();

        let reloaded = ProgressStore::load(storage, clock);
        assert_eq!(reloaded.state(), &before);
    }

    #[test]
    fn persists_camel_case_fields_only() {
        let (mut store, storage, _) = store_on("2024-01-01");
        store.record_activity();

        let raw = storage.get(PROGRESS_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort();

        assert_eq!(
            keys,
            vec![
                "activityHistory",
                "bookmarkedModules",
                "completedModules",
                "lastActivityDate",
                "lastVisitedAt",
                "lastVisitedModule",
                "longestStreak",
                "moduleProgress",
                "streakDays",
                "timeSpent",
            ]
        );
        assert_eq!(value["lastActivityDate"], "2024-01-01");
    }

    #[test]
    fn loads_record_written_by_older_version() {
        let storage = Arc::new(MemoryStore::default());
        storage
            .set(
                PROGRESS_KEY,
                r#"{"completedModules":["day-01","day-01"],"streakDays":2,"lastActivityDate":"2024-01-02","activityHistory":["2024-01-02","2024-01-01"]}"#,
            )
            .unwrap();
        let clock = Arc::new(FixedClock::on(date("2024-01-03")));

        let store = ProgressStore::load(storage, clock);

        assert_eq!(store.state().completed_modules.len(), 1);
        assert_eq!(store.state().longest_streak, 2);
        assert_eq!(store.state().activity_history, vec![date("2024-01-01"), date("2024-01-02")]);
        assert_eq!(store.current_streak(), 2);
    }
}
