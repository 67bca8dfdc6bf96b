//! In-lesson exercise and quiz tracking
//!
//! Exercise completion is a ratchet: once an exercise is solved it stays
//! solved. Lesson components show a "completed" marker from it, and there is
//! deliberately no way to take it back, unlike module completion.

pub mod grading;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use grading::{Blank, Exercise, Grade, QuizOption};

use crate::progress::percentage;
use crate::storage::{EXERCISES_KEY, KeyValueStore, load_record, save_record};

/// Persisted exercise record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExerciseState {
    /// Solved exercise ids per module
    pub completed_exercises: BTreeMap<String, BTreeSet<String>>,

    /// Last submitted free-text answer per module and question
    pub quiz_answers: BTreeMap<String, BTreeMap<String, String>>,
}

/// Write-through store for [`ExerciseState`]
pub struct ExerciseStore {
    state: ExerciseState,
    storage: Arc<dyn KeyValueStore>,
}

impl ExerciseStore {
    /// Load the persisted record
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let state = load_record(storage.as_ref(), EXERCISES_KEY);
        Self { state, storage }
    }

    /// Current state
    pub fn state(&self) -> &ExerciseState {
        &self.state
    }

    /// Write the whole record to storage
    pub fn flush(&self) {
        save_record(self.storage.as_ref(), EXERCISES_KEY, &self.state);
    }

    /// Mark an exercise solved. Solving it again changes nothing.
    pub fn mark_exercise_complete(&mut self, module: &str, exercise_id: &str) {
        let inserted = self
            .state
            .completed_exercises
            .entry(module.to_string())
            .or_default()
            .insert(exercise_id.to_string());
        if inserted {
            tracing::info!("Solved exercise {} in {}", exercise_id, module);
            self.flush();
        }
    }

    /// Apply a graded submission; only a correct one completes the exercise
    pub fn submit(&mut self, module: &str, exercise_id: &str, grade: &Grade) -> bool {
        if grade.is_correct() {
            self.mark_exercise_complete(module, exercise_id);
        } else {
            tracing::debug!(
                "Incorrect submission for {} in {} ({}/{})",
                exercise_id,
                module,
                grade.correct,
                grade.total
            );
        }
        self.is_exercise_complete(module, exercise_id)
    }

    /// Is the exercise solved?
    pub fn is_exercise_complete(&self, module: &str, exercise_id: &str) -> bool {
        self.state.completed_exercises.get(module).is_some_and(|ids| ids.contains(exercise_id))
    }

    /// Store the answer to a question, replacing any earlier one
    pub fn save_quiz_answer(&mut self, module: &str, question_id: &str, answer: &str) {
        self.state
            .quiz_answers
            .entry(module.to_string())
            .or_default()
            .insert(question_id.to_string(), answer.to_string());
        self.flush();
    }

    /// Last answer submitted for a question
    pub fn quiz_answer(&self, module: &str, question_id: &str) -> Option<&str> {
        self.state.quiz_answers.get(module)?.get(question_id).map(String::as_str)
    }

    /// Number of solved exercises in a module
    pub fn completed_count(&self, module: &str) -> usize {
        self.state.completed_exercises.get(module).map_or(0, BTreeSet::len)
    }

    /// Share of `total` exercises solved in a module
    pub fn module_exercise_progress(&self, module: &str, total: usize) -> u32 {
        percentage(self.completed_count(module), total)
    }
}
