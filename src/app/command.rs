//! Command palette parsing

use super::state::ContentWidth;

/// Parsed command from the palette
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open a module: open <slug>
    Open(String),
    /// Resume where the reader left off: continue
    Continue,
    /// List modules: modules
    List,
    /// Mark complete: complete [slug]
    Complete(Option<String>),
    /// Mark incomplete: uncomplete [slug]
    Uncomplete(Option<String>),
    /// Flip completion: toggle [slug]
    Toggle(Option<String>),
    /// Flip bookmark: bookmark [slug]
    Bookmark(Option<String>),
    /// Next module in course order: next or j
    Next,
    /// Previous module in course order: prev or k
    Prev,
    /// Search titles and descriptions: search <query> or /query
    Search(String),
    /// Toggle the notes panel: notes
    Notes,
    /// Toggle the sidebar: zen
    Zen,
    /// Set the reading column width: width <standard|wide|narrow>
    Width(ContentWidth),
    /// List bookmarked modules: bookmarks
    Bookmarks,
    /// Show overall progress: status
    Status,
    /// Show help: help or ?
    Help,
    /// Quit the palette: q or quit
    Quit,
    /// Empty input
    Nop,
}

/// Result of parsing a command
#[derive(Debug)]
pub enum ParseResult {
    /// Successfully parsed command
    Ok(Command),
    /// Unknown command
    UnknownCommand(String),
    /// Command needs an argument
    MissingArgument(String),
    /// Argument could not be understood
    InvalidArgument(String),
}

/// Parse a palette line
pub fn parse_command(input: &str) -> ParseResult {
    let input = input.trim();

    if input.is_empty() {
        return ParseResult::Ok(Command::Nop);
    }

    // "/query" searches without a space
    if let Some(query) = input.strip_prefix('/') {
        return required("search", query, |q| Command::Search(q.to_string()));
    }

    let mut parts = input.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("");
    let args = parts.next().map(|s| s.trim()).unwrap_or("");
    let target = (!args.is_empty()).then(|| args.to_string());

    match cmd.to_lowercase().as_str() {
        "open" | "o" | "goto" => required("open", args, |slug| Command::Open(slug.to_string())),
        "continue" | "c" | "home" => ParseResult::Ok(Command::Continue),
        "modules" | "list" | "ls" => ParseResult::Ok(Command::List),
        "complete" | "done" => ParseResult::Ok(Command::Complete(target)),
        "uncomplete" | "undo" => ParseResult::Ok(Command::Uncomplete(target)),
        "toggle" | "t" => ParseResult::Ok(Command::Toggle(target)),
        "bookmark" | "bm" => ParseResult::Ok(Command::Bookmark(target)),
        "next" | "j" => ParseResult::Ok(Command::Next),
        "prev" | "k" => ParseResult::Ok(Command::Prev),
        "search" | "s" => required("search", args, |q| Command::Search(q.to_string())),
        "notes" | "n" => ParseResult::Ok(Command::Notes),
        "zen" | "sidebar" => ParseResult::Ok(Command::Zen),
        "width" | "w" => {
            if args.is_empty() {
                ParseResult::MissingArgument("width".to_string())
            } else {
                match args.parse() {
                    Ok(width) => ParseResult::Ok(Command::Width(width)),
                    Err(e) => ParseResult::InvalidArgument(e),
                }
            }
        }
        "bookmarks" => ParseResult::Ok(Command::Bookmarks),
        "status" => ParseResult::Ok(Command::Status),
        "help" | "h" | "?" => ParseResult::Ok(Command::Help),
        "quit" | "q" | "exit" => ParseResult::Ok(Command::Quit),
        _ => ParseResult::UnknownCommand(cmd.to_string()),
    }
}

fn required(name: &str, args: &str, build: impl FnOnce(&str) -> Command) -> ParseResult {
    let args = args.trim();
    if args.is_empty() {
        ParseResult::MissingArgument(name.to_string())
    } else {
        ParseResult::Ok(build(args))
    }
}

/// One action offered by the palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    pub title: &'static str,
    pub description: &'static str,
    /// What to type to run it
    pub usage: &'static str,
    pub keywords: &'static [&'static str],
}

impl PaletteEntry {
    fn matches(&self, query: &str) -> bool {
        self.title.to_lowercase().contains(query)
            || self.description.to_lowercase().contains(query)
            || self.keywords.iter().any(|k| k.contains(query))
    }
}

pub const PALETTE: &[PaletteEntry] = &[
    PaletteEntry {
        title: "Continue Learning",
        description: "Resume the last visited module",
        usage: "continue",
        keywords: &["home", "resume", "start"],
    },
    PaletteEntry {
        title: "All Modules",
        description: "Browse the course by week",
        usage: "modules",
        keywords: &["list", "browse", "course"],
    },
    PaletteEntry {
        title: "Bookmarks",
        description: "Modules you saved for later",
        usage: "bookmarks",
        keywords: &["saved", "favorites"],
    },
    PaletteEntry {
        title: "Search",
        description: "Find modules by title or description",
        usage: "search <query>",
        keywords: &["find", "lookup"],
    },
    PaletteEntry {
        title: "Toggle Notes",
        description: "Show or hide the notes panel",
        usage: "notes",
        keywords: &["write", "annotate"],
    },
    PaletteEntry {
        title: "Zen Mode",
        description: "Hide the sidebar for distraction-free reading",
        usage: "zen",
        keywords: &["focus", "sidebar", "distraction"],
    },
    PaletteEntry {
        title: "Content Width",
        description: "Switch between standard, wide and narrow columns",
        usage: "width <standard|wide|narrow>",
        keywords: &["layout", "column"],
    },
    PaletteEntry {
        title: "Mark Complete",
        description: "Toggle completion of the current module",
        usage: "toggle [slug]",
        keywords: &["done", "finish"],
    },
    PaletteEntry {
        title: "Next Module",
        description: "Go to the next module in course order",
        usage: "next",
        keywords: &["forward", "j"],
    },
    PaletteEntry {
        title: "Previous Module",
        description: "Go to the previous module in course order",
        usage: "prev",
        keywords: &["back", "k"],
    },
    PaletteEntry {
        title: "Progress",
        description: "Completion, streak and time spent",
        usage: "status",
        keywords: &["streak", "stats"],
    },
    PaletteEntry {
        title: "Help",
        description: "List every command",
        usage: "help",
        keywords: &["?", "commands"],
    },
];

/// Palette actions matching `query`; an empty query lists everything
pub fn palette_entries(query: &str) -> Vec<&'static PaletteEntry> {
    let query = query.trim().to_lowercase();
    PALETTE.iter().filter(|entry| query.is_empty() || entry.matches(&query)).collect()
}

/// Reply to an unrecognized command, suggesting palette actions that match it
pub fn unknown_command_message(cmd: &str) -> String {
    let suggestions: Vec<&str> = palette_entries(cmd).iter().map(|e| e.usage).collect();
    if cmd.trim().is_empty() || suggestions.is_empty() {
        format!("Unknown command: {cmd} (try help)")
    } else {
        format!("Unknown command: {cmd}. Did you mean: {}", suggestions.join(", "))
    }
}
