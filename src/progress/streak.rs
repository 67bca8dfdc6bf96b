//! Daily activity streaks
//!
//! The streak is never incremented in place: it is recounted from the set of
//! active days every time a new day is recorded, so a stale counter left by a
//! skewed clock or a second process heals on the next recording.

use std::collections::HashSet;

use chrono::NaiveDate;

use super::ProgressState;

/// Most recent active days kept in the history
pub const HISTORY_CAP: usize = 365;

/// Count consecutive active days ending at `day`, walking backwards
pub fn streak_ending_at(history: &[NaiveDate], day: NaiveDate) -> u32 {
    let active: HashSet<NaiveDate> = history.iter().copied().collect();

    let mut streak = 0;
    let mut check = Some(day);
    while let Some(date) = check {
        if !active.contains(&date) {
            break;
        }
        streak += 1;
        check = date.pred_opt();
    }
    streak
}

/// Insert `day` into a sorted history and apply the cap
pub fn insert_day(history: &mut Vec<NaiveDate>, day: NaiveDate) {
    if let Err(pos) = history.binary_search(&day) {
        history.insert(pos, day);
    }
    cap_history(history, day);
}

/// Drop the oldest days beyond [`HISTORY_CAP`], never dropping `keep`
fn cap_history(history: &mut Vec<NaiveDate>, keep: NaiveDate) {
    let excess = history.len().saturating_sub(HISTORY_CAP);
    if excess == 0 {
        return;
    }
    history.drain(..excess);
    // A clock that went backwards can make `keep` older than everything else
    if history.binary_search(&keep).is_err() {
        history[0] = keep;
    }
}

/// Record activity on `today`. Returns false when today was already recorded.
pub fn record_day(state: &mut ProgressState, today: NaiveDate) -> bool {
    if state.last_activity_date == Some(today) {
        return false;
    }

    insert_day(&mut state.activity_history, today);
    state.streak_days = streak_ending_at(&state.activity_history, today);
    state.longest_streak = state.longest_streak.max(state.streak_days);
    state.last_activity_date = Some(today);
    true
}

/// Streak to display on `today`: zero once a full day has been missed
pub fn current_streak(state: &ProgressState, today: NaiveDate) -> u32 {
    match state.last_activity_date {
        Some(last) if today.signed_duration_since(last).num_days() <= 1 => state.streak_days,
        _ => 0,
    }
}

/// Restore the history invariants on a record read back from storage
pub fn normalize(state: &mut ProgressState) {
    state.activity_history.sort_unstable();
    state.activity_history.dedup();

    if let Some(last) = state.last_activity_date {
        insert_day(&mut state.activity_history, last);
    } else if let Some(&newest) = state.activity_history.last() {
        cap_history(&mut state.activity_history, newest);
    }

    state.longest_streak = state.longest_streak.max(state.streak_days);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn plus(day: NaiveDate, n: u64) -> NaiveDate {
        day.checked_add_days(Days::new(n)).unwrap()
    }

    #[test]
    fn first_activity_starts_streak_at_one() {
        let mut state = ProgressState::default();
        assert!(record_day(&mut state, date("2024-01-01")));
        assert_eq!(state.streak_days, 1);
        assert_eq!(state.longest_streak, 1);
        assert_eq!(state.activity_history, vec![date("2024-01-01")]);
    }

    #[test]
    fn consecutive_days_then_gap() {
        let mut state = ProgressState::default();
        record_day(&mut state, date("2024-01-01"));
        record_day(&mut state, date("2024-01-02"));
        record_day(&mut state, date("2024-01-03"));
        assert_eq!(state.streak_days, 3);
        assert_eq!(state.longest_streak, 3);

        record_day(&mut state, date("2024-01-10"));
        assert_eq!(state.streak_days, 1);
        assert_eq!(state.longest_streak, 3);
        assert_eq!(state.last_activity_date, Some(date("2024-01-10")));
    }

    #[test]
    fn same_day_is_recorded_once() {
        let mut state = ProgressState::default();
        assert!(record_day(&mut state, date("2024-05-05")));
        let snapshot = state.clone();

        assert!(!record_day(&mut state, date("2024-05-05")));
        assert_eq!(state, snapshot);
    }

    #[test]
    fn streak_crosses_year_boundary() {
        let mut state = ProgressState::default();
        record_day(&mut state, date("2023-12-31"));
        record_day(&mut state, date("2024-01-01"));
        assert_eq!(state.streak_days, 2);
    }

    #[test]
    fn history_is_capped_to_most_recent_days() {
        let start = date("2023-01-01");
        let mut state = ProgressState::default();
        for i in 0..400 {
            record_day(&mut state, plus(start, i));
        }

        assert_eq!(state.activity_history.len(), HISTORY_CAP);
        assert_eq!(state.activity_history.first(), Some(&plus(start, 35)));
        assert_eq!(state.activity_history.last(), Some(&plus(start, 399)));
        assert_eq!(state.streak_days, 365);
        assert_eq!(state.longest_streak, 365);
    }

    #[test]
    fn backwards_clock_keeps_today_in_full_history() {
        let start = date("2023-01-01");
        let mut state = ProgressState::default();
        for i in 0..365 {
            record_day(&mut state, plus(start, 100 + i));
        }

        record_day(&mut state, start);

        assert_eq!(state.activity_history.len(), HISTORY_CAP);
        assert!(state.activity_history.contains(&start));
        assert_eq!(state.last_activity_date, Some(start));
        assert!(state.activity_history.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn streak_recount_heals_stale_counter() {
        let mut state = ProgressState {
            streak_days: 40,
            longest_streak: 40,
            last_activity_date: Some(date("2024-02-01")),
            activity_history: vec![date("2024-02-01")],
            ..Default::default()
        };

        record_day(&mut state, date("2024-02-02"));
        assert_eq!(state.streak_days, 2);
        assert_eq!(state.longest_streak, 40);
    }

    #[test]
    fn current_streak_lapses_after_missed_day() {
        let mut state = ProgressState::default();
        record_day(&mut state, date("2024-01-01"));
        record_day(&mut state, date("2024-01-02"));

        assert_eq!(current_streak(&state, date("2024-01-02")), 2);
        assert_eq!(current_streak(&state, date("2024-01-03")), 2);
        assert_eq!(current_streak(&state, date("2024-01-04")), 0);
    }

    #[test]
    fn current_streak_without_activity_is_zero() {
        assert_eq!(current_streak(&ProgressState::default(), date("2024-01-01")), 0);
    }

    #[test]
    fn normalize_repairs_history() {
        let mut state = ProgressState {
            streak_days: 5,
            longest_streak: 2,
            last_activity_date: Some(date("2024-01-09")),
            activity_history: vec![date("2024-01-03"), date("2024-01-01"), date("2024-01-03")],
            ..Default::default()
        };

        normalize(&mut state);

        assert_eq!(
            state.activity_history,
            vec![date("2024-01-01"), date("2024-01-03"), date("2024-01-09")]
        );
        assert_eq!(state.longest_streak, 5);
    }

    #[test]
    fn streak_ending_at_stops_at_first_gap() {
        let history = vec![date("2024-01-01"), date("2024-01-03"), date("2024-01-04")];
        assert_eq!(streak_ending_at(&history, date("2024-01-04")), 2);
        assert_eq!(streak_ending_at(&history, date("2024-01-05")), 0);
    }

    proptest! {
        #[test]
        fn unbroken_run_counts_every_day(offset in 0u64..20_000, k in 0u64..120) {
            let start = plus(date("1990-01-01"), offset);
            let mut state = ProgressState::default();
            for i in 0..=k {
                record_day(&mut state, plus(start, i));
            }
            prop_assert_eq!(state.streak_days as u64, k + 1);
        }

        #[test]
        fn invariants_hold_for_any_schedule(gaps in prop::collection::vec(0u64..4, 1..200)) {
            let mut day = date("2022-06-01");
            let mut state = ProgressState::default();
            let mut previous_longest = 0;

            for gap in gaps {
                day = plus(day, gap);
                record_day(&mut state, day);

                prop_assert!(state.longest_streak >= previous_longest);
                prop_assert!(state.streak_days <= state.longest_streak);
                prop_assert!(state.activity_history.len() <= HISTORY_CAP);
                prop_assert!(state.activity_history.windows(2).all(|w| w[0] < w[1]));
                prop_assert!(state.activity_history.contains(&day));
                previous_longest = state.longest_streak;
            }
        }

        #[test]
        fn repeated_same_day_recording_is_stable(repeats in 1usize..10, offset in 0u64..1000) {
            let day = plus(date("2020-01-01"), offset);
            let mut state = ProgressState::default();
            record_day(&mut state, day);
            let snapshot = state.clone();

            for _ in 0..repeats {
                record_day(&mut state, day);
            }
            prop_assert_eq!(state, snapshot);
        }

        #[test]
        fn break_resets_to_one(run in 1u64..30, gap in 2u64..60) {
            let start = date("2024-01-01");
            let mut state = ProgressState::default();
            for i in 0..run {
                record_day(&mut state, plus(start, i));
            }
            let longest = state.longest_streak;

            record_day(&mut state, plus(start, run - 1 + gap));
            prop_assert_eq!(state.streak_days, 1);
            prop_assert_eq!(state.longest_streak, longest);
        }
    }
}
