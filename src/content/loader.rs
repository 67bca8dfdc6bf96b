//! Lesson file loading
//!
//! Lessons are `.mdx` files whose leading `---` block holds `title`,
//! `description` and `week`. The day number comes from the `day-NN` part of
//! the file name. Gradable exercises live beside the lesson in an optional
//! `<slug>.exercises.json` map of exercise id to definition.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use thiserror::Error;

use super::Module;
use crate::exercises::Exercise;

/// Day assigned to files without a `day-NN` marker, sorting them last
pub const UNNUMBERED_DAY: u32 = 999;

const WORDS_PER_MINUTE: f64 = 200.0;
const MINUTES_PER_CODE_BLOCK: f64 = 0.5;

static DAY_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"day-(\d+)").expect("valid regex"));
static CODE_BLOCK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[\s\S]*?```").expect("valid regex"));

/// Errors raised while loading lesson files
#[derive(Debug, Error)]
pub enum ContentError {
    /// A lesson file or directory could not be read
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Load every `.mdx` lesson in `dir`, sorted by day
pub fn load_modules(dir: &Path) -> Result<Vec<Module>, ContentError> {
    let io_err = |source: std::io::Error| ContentError::Io { path: dir.to_path_buf(), source };

    let mut modules = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.extension().is_some_and(|ext| ext == "mdx") {
            modules.push(load_module(&path)?);
        }
    }

    modules.sort_by(|a, b| a.day.cmp(&b.day).then_with(|| a.slug.cmp(&b.slug)));
    tracing::debug!("Loaded {} modules from {:?}", modules.len(), dir);
    Ok(modules)
}

/// Load a single lesson file
pub fn load_module(path: &Path) -> Result<Module, ContentError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ContentError::Io { path: path.to_path_buf(), source })?;
    let slug = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default().to_string();
    let mut module = parse_module(&slug, &raw);
    module.exercises = load_exercises(&path.with_extension("exercises.json"))?;
    Ok(module)
}

/// Exercise definitions from a sidecar file. A missing file means none; a
/// malformed one is logged and skipped.
fn load_exercises(path: &Path) -> Result<BTreeMap<String, Exercise>, ContentError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(source) => return Err(ContentError::Io { path: path.to_path_buf(), source }),
    };

    match serde_json::from_str(&raw) {
        Ok(exercises) => Ok(exercises),
        Err(e) => {
            tracing::warn!("Ignoring exercises in {:?}: {}", path, e);
            Ok(BTreeMap::new())
        }
    }
}

/// Build a module from a slug and the raw lesson text.
///
/// A missing title falls back to the slug and a missing or unreadable week
/// to week 1, so one draft lesson never hides the rest of the course.
pub(crate) fn parse_module(slug: &str, raw: &str) -> Module {
    let (frontmatter, body) = split_frontmatter(raw);
    let fields = parse_fields(&frontmatter);

    let title = match fields.get("title").filter(|t| !t.is_empty()) {
        Some(title) => title.clone(),
        None => {
            tracing::warn!("{} has no title; using the file name", slug);
            slug.to_string()
        }
    };
    let description = fields.get("description").cloned().unwrap_or_default();
    let week = match fields.get("week").map(|value| (value, value.parse::<u32>())) {
        Some((_, Ok(week))) if week > 0 => week,
        Some((value, _)) => {
            tracing::warn!("{} has an invalid week {:?}; using week 1", slug, value);
            1
        }
        None => 1,
    };

    Module {
        slug: slug.to_string(),
        title,
        description,
        week,
        day: day_from_slug(slug),
        reading_time: estimate_reading_time(body),
        exercises: BTreeMap::new(),
    }
}

/// Day number from a `day-NN` slug
pub fn day_from_slug(slug: &str) -> u32 {
    DAY_PATTERN
        .captures(slug)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(UNNUMBERED_DAY)
}

/// Minutes to read `body`: 200 words a minute plus half a minute per code block
pub fn estimate_reading_time(body: &str) -> u32 {
    let words = body.split_whitespace().count() as f64;
    let code_blocks = CODE_BLOCK_PATTERN.find_iter(body).count() as f64;
    let minutes = (words / WORDS_PER_MINUTE + code_blocks * MINUTES_PER_CODE_BLOCK).ceil();
    (minutes as u32).max(1)
}

/// Split the leading metadata block from the body
fn split_frontmatter(raw: &str) -> (String, &str) {
    let parser =
        Parser::new_ext(raw, Options::ENABLE_YAML_STYLE_METADATA_BLOCKS).into_offset_iter();

    let mut in_metadata = false;
    let mut metadata = String::new();
    for (event, range) in parser {
        match event {
            Event::Start(Tag::MetadataBlock(_)) => in_metadata = true,
            Event::Text(text) if in_metadata => metadata.push_str(&text),
            Event::End(TagEnd::MetadataBlock(_)) => {
                let body = raw.get(range.end..).unwrap_or("");
                return (metadata, body);
            }
            // Metadata can only open a document
            _ if !in_metadata => break,
            _ => {}
        }
    }

    (String::new(), raw)
}

/// Parse flat `key: value` lines, dropping surrounding quotes
fn parse_fields(frontmatter: &str) -> HashMap<String, String> {
    frontmatter
        .lines()
        .filter_map(|line| line.split_once(':'))
        .filter(|(key, _)| !key.starts_with(char::is_whitespace))
        .map(|(key, value)| (key.trim().to_string(), unquote(value.trim()).to_string()))
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(quote).and_then(|v| v.strip_suffix(quote)) {
            return inner;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const INTRO: &str =
        "---\ntitle: \"Day 1: Intro\"\ndescription: Day 1 Intro\nweek: 1\n---\n# Content 1\n";

    #[test]
    fn parses_frontmatter() {
        let module = parse_module("day-01-intro", INTRO);
        assert_eq!(module.title, "Day 1: Intro");
        assert_eq!(module.description, "Day 1 Intro");
        assert_eq!(module.week, 1);
        assert_eq!(module.day, 1);
        assert_eq!(module.reading_time, 1);
    }

    #[test]
    fn week_defaults_to_one() {
        let module = parse_module("day-09-x", "---\ntitle: X\n---\nbody");
        assert_eq!(module.week, 1);
    }

    #[test]
    fn missing_title_falls_back_to_slug() {
        assert_eq!(parse_module("day-01", "---\ndescription: d\n---\n").title, "day-01");
        assert_eq!(parse_module("day-01", "---\ntitle: \"\"\n---\n").title, "day-01");

        let bare = parse_module("appendix", "# no frontmatter");
        assert_eq!(bare.title, "appendix");
        assert_eq!(bare.week, 1);
    }

    #[test]
    fn invalid_week_falls_back_to_one() {
        assert_eq!(parse_module("day-01", "---\ntitle: T\nweek: soon\n---\n").week, 1);
        assert_eq!(parse_module("day-01", "---\ntitle: T\nweek: 0\n---\n").week, 1);
        assert_eq!(parse_module("day-01", "---\ntitle: T\nweek: 3\n---\n").week, 3);
    }

    #[test]
    fn day_comes_from_file_name() {
        assert_eq!(day_from_slug("day-12-memory"), 12);
        assert_eq!(day_from_slug("appendix"), UNNUMBERED_DAY);
    }

    #[test]
    fn reading_time_counts_words_and_code() {
        let text = "word ".repeat(200);
        assert_eq!(estimate_reading_time(&text), 1);
        assert_eq!(estimate_reading_time(&format!("{text}```code```")), 2);
        assert_eq!(estimate_reading_time("hi"), 1);
        assert_eq!(estimate_reading_time(""), 1);
    }

    #[test]
    fn loads_directory_sorted_by_day() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("day-02-advanced.mdx"),
            "---\ntitle: Advanced\ndescription: Day 2 Advanced\nweek: 1\n---\n# Content 2",
        )
        .unwrap();
        std::fs::write(dir.path().join("day-01-intro.mdx"), INTRO).unwrap();
        std::fs::write(dir.path().join("ignored.txt"), "nothing").unwrap();

        let modules = load_modules(dir.path()).unwrap();
        let slugs: Vec<&str> = modules.iter().map(|m| m.slug.as_str()).collect();
        assert_eq!(slugs, vec!["day-01-intro", "day-02-advanced"]);
        assert_eq!(modules[1].day, 2);
    }

    #[test]
    fn draft_lesson_does_not_block_the_rest() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("day-01-intro.mdx"), INTRO).unwrap();
        std::fs::write(dir.path().join("day-02-draft.mdx"), "---\nweek: two\n---\nWork in progress")
            .unwrap();

        let modules = load_modules(dir.path()).unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[1].title, "day-02-draft");
        assert_eq!(modules[1].week, 1);
        assert_eq!(modules[1].day, 2);
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nowhere");

        match load_modules(&missing).unwrap_err() {
            ContentError::Io { path, .. } => assert_eq!(path, missing),
        }
    }

    #[test]
    fn exercises_load_from_sidecar() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("day-01-intro.mdx"), INTRO).unwrap();
        std::fs::write(
            dir.path().join("day-01-intro.exercises.json"),
            r#"{ "pick-one": { "type": "choice", "options": [
                { "id": "a", "text": "A loop", "is_correct": true },
                { "id": "b", "text": "A list" }
            ] } }"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("day-02-tools.mdx"), INTRO).unwrap();
        std::fs::write(dir.path().join("day-02-tools.exercises.json"), "{ not json").unwrap();

        let modules = load_modules(dir.path()).unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].exercises.keys().collect::<Vec<_>>(), vec!["pick-one"]);
        assert_eq!(modules[0].exercises["pick-one"].kind(), "choice");
        assert!(modules[1].exercises.is_empty());
    }
}
