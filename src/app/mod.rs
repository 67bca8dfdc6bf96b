//! Application context and command execution
//!
//! [`AppContext`] owns every store plus the transient UI state. Front ends
//! build one, feed it [`Command`]s and render the returned [`Outcome`].

pub mod command;
pub mod state;

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::content::{Catalog, Module, StatusFilter};
use crate::exercises::{ExerciseStore, Grade};
use crate::format::{format_duration, format_relative_time};
use crate::notes::NotesStore;
use crate::preferences::PreferencesStore;
use crate::progress::ProgressStore;
use crate::storage::{FileStore, KeyValueStore};
use crate::tracker::TimeSample;

pub use command::{
    Command, PALETTE, PaletteEntry, ParseResult, palette_entries, parse_command,
    unknown_command_message,
};
pub use state::{ContentWidth, UiState};

/// Scroll percentage at which a module counts as read when auto-complete is on
pub const AUTO_COMPLETE_THRESHOLD: f64 = 95.0;

/// What a command produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Text to show the reader
    Message(String),
    /// Leave the palette
    Quit,
    /// Nothing to show
    Silent,
}

impl Outcome {
    fn message(text: impl Into<String>) -> Self {
        Outcome::Message(text.into())
    }
}

/// Stores, UI state and content for one session
pub struct AppContext {
    pub progress: ProgressStore,
    pub exercises: ExerciseStore,
    pub preferences: PreferencesStore,
    pub notes: NotesStore,
    pub ui: UiState,
    catalog: Catalog,
    clock: Arc<dyn Clock>,
}

impl AppContext {
    /// File-backed context using the configured directories
    pub fn init(config: &Config) -> Result<Self> {
        let storage_dir = config.storage_dir()?;
        let storage = FileStore::open(&storage_dir)
            .with_context(|| format!("Failed to open storage at {:?}", storage_dir))?;

        let catalog = match &config.content_dir {
            Some(dir) => Catalog::load(dir)
                .with_context(|| format!("Failed to load course content from {:?}", dir))?,
            None => {
                tracing::warn!("No content_dir configured; module metadata is unavailable");
                Catalog::default()
            }
        };

        tracing::info!("Using storage at {:?} with {} modules", storage_dir, catalog.len());
        Ok(Self::with_backend(Arc::new(storage), Arc::new(SystemClock), catalog))
    }

    /// Context over an explicit storage backend and clock
    pub fn with_backend(
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        catalog: Catalog,
    ) -> Self {
        Self {
            progress: ProgressStore::load(storage.clone(), clock.clone()),
            exercises: ExerciseStore::load(storage.clone()),
            preferences: PreferencesStore::load(storage.clone()),
            notes: NotesStore::new(storage, clock.clone()),
            ui: UiState::default(),
            catalog,
            clock,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Module the reader is on
    pub fn current_module(&self) -> Option<&str> {
        self.progress.state().last_visited_module.as_deref()
    }

    /// Reject slugs the catalog does not know. With no catalog loaded every
    /// slug is accepted.
    pub fn check_module(&self, slug: &str) -> Result<(), String> {
        if self.catalog.is_empty() || self.catalog.get(slug).is_some() {
            Ok(())
        } else {
            Err(format!("Unknown module: {slug}"))
        }
    }

    /// Navigate into a module: remember it and count today as active
    pub fn visit(&mut self, slug: &str) {
        self.progress.set_last_visited(slug);
        self.progress.record_activity();
    }

    /// Record scroll position, completing the module if the reader asked for that
    pub fn scroll(&mut self, slug: &str, percent: f64) {
        self.progress.update_module_progress(slug, percent);
        if self.preferences.state().auto_mark_complete
            && self.progress.module_progress(slug) >= AUTO_COMPLETE_THRESHOLD
            && !self.progress.is_completed(slug)
        {
            tracing::info!("Auto-completing {} at {:.0}%", slug, percent);
            self.progress.mark_complete(slug);
        }
    }

    /// Apply a sample from the time tracker
    pub fn apply_time_sample(&mut self, sample: &TimeSample) {
        self.progress.add_time_spent(&sample.slug, sample.seconds);
    }

    /// Grade answers to one of a module's exercises, completing it when correct
    pub fn check_exercise(
        &mut self,
        slug: &str,
        exercise_id: &str,
        answers: &[String],
    ) -> Result<Grade, String> {
        let module = self.catalog.get(slug).ok_or_else(|| format!("Unknown module: {slug}"))?;
        let exercise = module
            .exercises
            .get(exercise_id)
            .ok_or_else(|| format!("No exercise {exercise_id} in {slug}"))?;

        let grade = exercise.grade(answers);
        self.exercises.submit(slug, exercise_id, &grade);
        Ok(grade)
    }

    /// Defined exercises with their solved state, then any saved quiz answers
    pub fn exercise_report(&self, slug: &str) -> String {
        let mut out = format!("{}\n", self.display_name(slug));
        let defined = self.catalog.get(slug).map(|m| &m.exercises);

        match defined.filter(|d| !d.is_empty()) {
            Some(defined) => {
                let _ = writeln!(
                    out,
                    "Exercises: {}/{} ({}%)",
                    self.exercises.completed_count(slug),
                    defined.len(),
                    self.exercises.module_exercise_progress(slug, defined.len())
                );
                for (id, exercise) in defined {
                    let solved = self.exercises.is_exercise_complete(slug, id);
                    let mark = if solved { "x" } else { " " };
                    let _ = writeln!(out, "  [{mark}] {id} ({})", exercise.kind());
                }
            }
            None => match self.exercises.state().completed_exercises.get(slug) {
                Some(done) if !done.is_empty() => {
                    let _ = writeln!(out, "Completed exercises ({}):", done.len());
                    for id in done {
                        let _ = writeln!(out, "  {id}");
                    }
                }
                _ => out.push_str("No exercises completed\n"),
            },
        }

        if let Some(answers) = self.exercises.state().quiz_answers.get(slug) {
            out.push_str("Quiz answers:\n");
            for (question, answer) in answers {
                let _ = writeln!(out, "  {question}: {answer}");
            }
        }
        out.trim_end().to_string()
    }

    /// Final flush of every store
    pub fn shutdown(&self) {
        self.progress.flush();
        self.exercises.flush();
        self.preferences.flush();
        tracing::debug!("Flushed all stores");
    }

    /// Run a palette command
    pub fn execute(&mut self, command: Command) -> Outcome {
        match command {
            Command::Open(slug) => match self.check_module(&slug) {
                Ok(()) => self.open(&slug),
                Err(e) => Outcome::Message(e),
            },
            Command::Continue => {
                let resume =
                    self.catalog.continue_learning(self.progress.state()).map(|m| m.slug.clone());
                match resume {
                    Some(slug) => self.open(&slug),
                    None => Outcome::message("No modules loaded"),
                }
            }
            Command::List => Outcome::Message(self.render_listing(StatusFilter::All, None)),
            Command::Complete(target) => self.with_target(target, |ctx, slug| {
                ctx.progress.mark_complete(slug);
                format!("Marked {} complete", ctx.display_name(slug))
            }),
            Command::Uncomplete(target) => self.with_target(target, |ctx, slug| {
                ctx.progress.mark_incomplete(slug);
                format!("Marked {} incomplete", ctx.display_name(slug))
            }),
            Command::Toggle(target) => self.with_target(target, |ctx, slug| {
                let done = ctx.progress.toggle_complete(slug);
                let state = if done { "complete" } else { "incomplete" };
                format!("Marked {} {}", ctx.display_name(slug), state)
            }),
            Command::Bookmark(target) => self.with_target(target, |ctx, slug| {
                let saved = ctx.progress.toggle_bookmark(slug);
                let verb = if saved { "Bookmarked" } else { "Removed bookmark from" };
                format!("{} {}", verb, ctx.display_name(slug))
            }),
            Command::Next => self.step(true),
            Command::Prev => self.step(false),
            Command::Search(query) => {
                let found = self.catalog.search(&query);
                if found.is_empty() {
                    Outcome::Message(format!("No modules match {query:?}"))
                } else {
                    Outcome::Message(self.render_modules(&found))
                }
            }
            Command::Notes => {
                self.ui.toggle_notes();
                if !self.ui.notes_open {
                    return Outcome::message("Notes closed");
                }
                match self.current_module().map(str::to_string) {
                    Some(slug) => match self.notes.get(&slug) {
                        Some(note) => Outcome::Message(note.content),
                        None => Outcome::Message(format!("No notes for {slug} yet")),
                    },
                    None => Outcome::message("Notes opened; open a module to see its note"),
                }
            }
            Command::Zen => {
                let open = self.ui.toggle_sidebar();
                Outcome::message(if open { "Zen mode off" } else { "Zen mode on" })
            }
            Command::Width(width) => {
                self.ui.set_content_width(width);
                Outcome::Message(format!("Content width: {width}"))
            }
            Command::Bookmarks => {
                let listing = self.render_listing(StatusFilter::Bookmarked, None);
                if listing.is_empty() {
                    Outcome::message("No bookmarks yet")
                } else {
                    Outcome::Message(listing)
                }
            }
            Command::Status => Outcome::Message(self.status_report()),
            Command::Help => Outcome::Message(help_text()),
            Command::Quit => Outcome::Quit,
            Command::Nop => Outcome::Silent,
        }
    }

    fn open(&mut self, slug: &str) -> Outcome {
        self.visit(slug);
        let mut message = format!("Opened {}", self.display_name(slug));
        if let Some(module) = self.catalog.get(slug) {
            let _ = write!(message, " ({} min read)", module.reading_time);
        }
        Outcome::Message(message)
    }

    fn step(&mut self, forward: bool) -> Outcome {
        let Some(current) = self.current_module().map(str::to_string) else {
            return Outcome::message("No module open");
        };
        let (prev, next) = self.catalog.neighbors(&current);
        let target = if forward { next } else { prev };
        match target.map(|m| m.slug.clone()) {
            Some(slug) => self.open(&slug),
            None if forward => Outcome::message("Already at the last module"),
            None => Outcome::message("Already at the first module"),
        }
    }

    fn with_target(
        &mut self,
        target: Option<String>,
        apply: impl FnOnce(&mut Self, &str) -> String,
    ) -> Outcome {
        let Some(slug) = target.or_else(|| self.current_module().map(str::to_string)) else {
            return Outcome::message("No module open; name one");
        };
        if let Err(e) = self.check_module(&slug) {
            return Outcome::Message(e);
        }
        Outcome::Message(apply(self, &slug))
    }

    /// Title for a slug, falling back to the slug itself
    pub fn display_name(&self, slug: &str) -> String {
        self.catalog.get(slug).map_or_else(|| slug.to_string(), |m| m.title.clone())
    }

    /// One listing line: completion box, bookmark marker, title, reading time
    pub fn module_line(&self, module: &Module) -> String {
        let done = if self.progress.is_completed(&module.slug) { "[x]" } else { "[ ]" };
        let mark = if self.progress.is_bookmarked(&module.slug) { "*" } else { " " };
        let mut line = format!("{done}{mark} {}", module.title);
        if self.preferences.state().show_estimated_time {
            let _ = write!(line, " ({} min)", module.reading_time);
        }
        let percent = self.progress.module_progress(&module.slug);
        if self.preferences.state().show_reading_progress && percent > 0.0 {
            let _ = write!(line, " {percent:.0}%");
        }
        line
    }

    fn render_modules(&self, modules: &[&Module]) -> String {
        modules.iter().map(|m| self.module_line(m)).collect::<Vec<_>>().join("\n")
    }

    /// Modules grouped by week, filtered by status and week
    pub fn render_listing(&self, status: StatusFilter, week: Option<u32>) -> String {
        let matching = self.catalog.filter(status, week, self.progress.state());
        let mut out = String::new();
        let mut current_week = None;
        for module in matching {
            if current_week != Some(module.week) {
                current_week = Some(module.week);
                if !out.is_empty() {
                    out.push('\n');
                }
                let _ = writeln!(out, "Week {}", module.week);
            }
            let _ = writeln!(out, "  {}", self.module_line(module));
        }
        out.trim_end().to_string()
    }

    /// Completion, streak, time and where to resume
    pub fn status_report(&self) -> String {
        let state = self.progress.state();
        let total = self.catalog.len();
        let mut out = String::new();

        if total > 0 {
            let done =
                self.catalog.modules().iter().filter(|m| self.progress.is_completed(&m.slug)).count();
            let _ = writeln!(
                out,
                "Completed: {}/{} modules ({}%)",
                done,
                total,
                crate::progress::percentage(done, total)
            );
        } else {
            let _ = writeln!(out, "Completed: {} modules", state.completed_modules.len());
        }

        let _ = writeln!(
            out,
            "Streak: {} days (longest {})",
            self.progress.current_streak(),
            state.longest_streak
        );
        let _ = writeln!(out, "Time spent: {}", format_duration(self.progress.total_time_spent()));
        let _ = writeln!(out, "Bookmarks: {}", state.bookmarked_modules.len());
        let _ = writeln!(out, "Notes: {}", self.notes.count());

        if let Some(slug) = &state.last_visited_module {
            let when = state
                .last_visited_at
                .map(|at| format!(" ({})", format_relative_time(at, self.clock.now())))
                .unwrap_or_default();
            let _ = writeln!(out, "Last visited: {}{}", self.display_name(slug), when);
        }
        if let Some(next) = self.catalog.continue_learning(state) {
            let _ = writeln!(out, "Continue with: {}", next.title);
        }

        out.trim_end().to_string()
    }
}

fn help_text() -> String {
    let width = PALETTE.iter().map(|e| e.usage.len()).max().unwrap_or(0);
    let mut out = String::from("Commands:\n");
    for entry in PALETTE {
        let _ = writeln!(out, "  {:<width$}  {}", entry.usage, entry.description);
    }
    let _ = write!(out, "  {:<width$}  Leave", "quit");
    out
}
