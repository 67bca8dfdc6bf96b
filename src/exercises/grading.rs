//! Answer checking for quizzes and fill-in-the-blank exercises

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One option of a choice quiz
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// One blank of a fill-in-the-blank template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blank {
    pub id: String,
    pub answer: String,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub case_sensitive: bool,
}

impl Blank {
    /// Does `input` fill this blank?
    pub fn accepts(&self, input: &str) -> bool {
        let (input, answer) = (input.trim(), self.answer.trim());
        if self.case_sensitive {
            input == answer
        } else {
            input.to_lowercase() == answer.to_lowercase()
        }
    }
}

/// Outcome of checking a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grade {
    /// Parts answered correctly
    pub correct: usize,
    /// Parts in the exercise
    pub total: usize,
}

impl Grade {
    /// Fully correct submissions complete the exercise
    pub fn is_correct(&self) -> bool {
        self.total > 0 && self.correct == self.total
    }
}

/// An exercise as authored next to a lesson
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Exercise {
    Choice { options: Vec<QuizOption> },
    MultiSelect { options: Vec<QuizOption> },
    FillInBlank { template: String, blanks: Vec<Blank> },
}

impl Exercise {
    /// Grade positional answers: an option id for a choice quiz, option ids
    /// for multi-select, and one answer per template placeholder for blanks
    pub fn grade(&self, answers: &[String]) -> Grade {
        match self {
            Exercise::Choice { options } => {
                grade_choice(options, answers.first().map_or("", |a| a.trim()))
            }
            Exercise::MultiSelect { options } => {
                let selected: BTreeSet<String> = answers
                    .iter()
                    .flat_map(|a| a.split(','))
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect();
                grade_multi_select(options, &selected)
            }
            Exercise::FillInBlank { template, blanks } => {
                let mut order: Vec<&str> = Vec::new();
                for id in template_blanks(template) {
                    if !order.contains(&id) {
                        order.push(id);
                    }
                }
                if order.is_empty() {
                    order = blanks.iter().map(|b| b.id.as_str()).collect();
                }
                let filled: BTreeMap<String, String> = order
                    .into_iter()
                    .zip(answers)
                    .map(|(id, answer)| (id.to_string(), answer.clone()))
                    .collect();
                grade_blanks(blanks, &filled)
            }
        }
    }

    /// Short label for listings
    pub fn kind(&self) -> &'static str {
        match self {
            Exercise::Choice { .. } => "choice",
            Exercise::MultiSelect { .. } => "multi-select",
            Exercise::FillInBlank { .. } => "fill-in-blank",
        }
    }
}

/// Single-choice quiz: correct when the picked option is marked correct
pub fn grade_choice(options: &[QuizOption], selected: &str) -> Grade {
    let correct = options.iter().any(|o| o.id == selected && o.is_correct);
    Grade { correct: usize::from(correct), total: 1 }
}

/// Multi-select quiz: correct only when the selection is exactly the correct set
pub fn grade_multi_select(options: &[QuizOption], selected: &BTreeSet<String>) -> Grade {
    let expected: BTreeSet<&str> =
        options.iter().filter(|o| o.is_correct).map(|o| o.id.as_str()).collect();
    let picked_right = selected.iter().filter(|id| expected.contains(id.as_str())).count();
    let picked_wrong = selected.len() - picked_right;

    // Any wrong pick keeps the grade below full marks
    let correct = if picked_wrong == 0 {
        picked_right
    } else {
        picked_right.min(expected.len().saturating_sub(1))
    };
    Grade { correct, total: expected.len() }
}

/// Fill-in-the-blank: one point per accepted blank
pub fn grade_blanks(blanks: &[Blank], answers: &BTreeMap<String, String>) -> Grade {
    let correct = blanks
        .iter()
        .filter(|b| b.accepts(answers.get(&b.id).map(String::as_str).unwrap_or("")))
        .count();
    Grade { correct, total: blanks.len() }
}

/// Ids of the `{{id}}` placeholders in a fill-in-the-blank template, in order
pub fn template_blanks(template: &str) -> Vec<&str> {
    let mut ids = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let id = after[..end].trim();
                if !id.is_empty() {
                    ids.push(id);
                }
                rest = &after[end + 2..];
            }
            None => break,
        }
    }
    ids
}
