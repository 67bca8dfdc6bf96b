//! Course content catalog
//!
//! Read-only lookup data about lesson modules. Progress tracking only uses
//! module slugs as opaque keys; the catalog supplies display metadata and
//! ordering.

pub mod loader;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use loader::{ContentError, estimate_reading_time, load_modules};

use crate::exercises::Exercise;
use crate::progress::ProgressState;

/// One lesson unit of the course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Identifier, the lesson file stem
    pub slug: String,
    pub title: String,
    pub description: String,
    pub week: u32,
    pub day: u32,
    /// Estimated minutes to read
    pub reading_time: u32,
    /// Gradable exercises by id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub exercises: BTreeMap<String, Exercise>,
}

/// Completion filter for module listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Incomplete,
    Bookmarked,
}

impl StatusFilter {
    fn matches(self, module: &Module, progress: &ProgressState) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => progress.completed_modules.contains(&module.slug),
            StatusFilter::Incomplete => !progress.completed_modules.contains(&module.slug),
            StatusFilter::Bookmarked => progress.bookmarked_modules.contains(&module.slug),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "completed" | "done" => Ok(StatusFilter::Completed),
            "incomplete" | "in-progress" | "todo" => Ok(StatusFilter::Incomplete),
            "bookmarked" | "bookmarks" => Ok(StatusFilter::Bookmarked),
            other => Err(format!(
                "unknown status {other:?} (all, completed, incomplete, bookmarked)"
            )),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusFilter::All => "all",
            StatusFilter::Completed => "completed",
            StatusFilter::Incomplete => "incomplete",
            StatusFilter::Bookmarked => "bookmarked",
        };
        f.write_str(name)
    }
}

/// Ordered set of modules, keyed by slug
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    modules: Vec<Module>,
}

impl Catalog {
    /// Build a catalog ordered by day
    pub fn new(mut modules: Vec<Module>) -> Self {
        modules.sort_by(|a, b| a.day.cmp(&b.day).then_with(|| a.slug.cmp(&b.slug)));
        Self { modules }
    }

    /// Load every lesson in a content directory
    pub fn load(dir: &Path) -> Result<Self, ContentError> {
        Ok(Self::new(load_modules(dir)?))
    }

    /// All modules in course order
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Find a module by slug
    pub fn get(&self, slug: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.slug == slug)
    }

    /// Distinct weeks, ascending
    pub fn weeks(&self) -> Vec<u32> {
        self.by_week().into_keys().collect()
    }

    /// Modules grouped by week, each group in course order
    pub fn by_week(&self) -> BTreeMap<u32, Vec<&Module>> {
        let mut weeks: BTreeMap<u32, Vec<&Module>> = BTreeMap::new();
        for module in &self.modules {
            weeks.entry(module.week).or_default().push(module);
        }
        weeks
    }

    /// Modules whose title or description contains `query`, case-insensitively
    pub fn search(&self, query: &str) -> Vec<&Module> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.modules
            .iter()
            .filter(|m| {
                m.title.to_lowercase().contains(&query)
                    || m.description.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Modules matching a status filter and optionally a week
    pub fn filter(
        &self,
        status: StatusFilter,
        week: Option<u32>,
        progress: &ProgressState,
    ) -> Vec<&Module> {
        self.modules
            .iter()
            .filter(|m| week.is_none_or(|w| m.week == w))
            .filter(|m| status.matches(m, progress))
            .collect()
    }

    /// Modules immediately before and after `slug`
    pub fn neighbors(&self, slug: &str) -> (Option<&Module>, Option<&Module>) {
        match self.modules.iter().position(|m| m.slug == slug) {
            Some(i) => (i.checked_sub(1).and_then(|p| self.modules.get(p)), self.modules.get(i + 1)),
            None => (None, None),
        }
    }

    /// First module not yet completed
    pub fn next_incomplete(&self, progress: &ProgressState) -> Option<&Module> {
        self.modules.iter().find(|m| !progress.completed_modules.contains(&m.slug))
    }

    /// Where to resume: the last visited module, else the first incomplete
    /// one, else the first module
    pub fn continue_learning(&self, progress: &ProgressState) -> Option<&Module> {
        progress
            .last_visited_module
            .as_deref()
            .and_then(|slug| self.get(slug))
            .or_else(|| self.next_incomplete(progress))
            .or_else(|| self.modules.first())
    }
}
