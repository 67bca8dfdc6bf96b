use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use course_tracker::app::{ParseResult, parse_command, unknown_command_message};
use course_tracker::content::StatusFilter;
use course_tracker::format::{format_duration, format_relative_time, truncate};
use course_tracker::preferences::FontSize;
use course_tracker::preferences::smart_copy::{
    API_PROVIDERS, has_smart_content, inject_keys, provider as api_provider,
};
use course_tracker::tracker::{Visibility, spawn_time_tracker};
use course_tracker::{AppContext, Command, Config, Outcome};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "course")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Lesson directory, overriding the configured one
    #[arg(long, global = true)]
    content: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show overall progress and streak
    Status,
    /// List modules by week
    Modules {
        /// Only this week
        #[arg(short, long)]
        week: Option<u32>,
        /// all, completed, incomplete or bookmarked
        #[arg(short, long, default_value = "all")]
        status: StatusFilter,
    },
    /// Search module titles and descriptions
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Open a module and count today toward the streak
    Open { slug: String },
    /// Open a module and track reading time until Ctrl-C
    Read { slug: String },
    /// Mark a module complete
    Complete { slug: String },
    /// Mark a module incomplete
    Incomplete { slug: String },
    /// Flip a module's completion
    Toggle { slug: String },
    /// Flip a module's bookmark
    Bookmark { slug: String },
    /// Record how far a module has been scrolled
    Scroll {
        slug: String,
        /// Percentage, 0 to 100
        percent: f64,
    },
    /// Exercise and quiz results
    Exercise {
        #[command(subcommand)]
        action: ExerciseAction,
    },
    /// Per-module notes
    Notes {
        #[command(subcommand)]
        action: NotesAction,
    },
    /// Reader preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Copy a code file with stored API keys filled in
    Copy {
        file: PathBuf,
        /// Print instead of using the clipboard
        #[arg(long)]
        stdout: bool,
    },
    /// Interactive command palette
    Shell,
}

#[derive(Subcommand)]
enum ExerciseAction {
    /// Grade answers to an exercise, completing it when all are right
    Check {
        module: String,
        exercise: String,
        /// Option ids, or one answer per blank in order
        #[arg(required = true)]
        answers: Vec<String>,
    },
    /// Save a quiz answer
    Answer { module: String, question: String, answer: String },
    /// Show a module's exercise results
    Show { module: String },
}

#[derive(Subcommand)]
enum NotesAction {
    /// Print a module's note
    Show { slug: String },
    /// Replace a module's note; reads stdin when no text is given
    Save { slug: String, text: Vec<String> },
    /// Delete a module's note
    Delete { slug: String },
    /// List every note, newest first
    List,
}

#[derive(Subcommand)]
enum PrefsAction {
    /// Print current preferences
    Show,
    /// small, medium or large
    FontSize { size: FontSize },
    /// on or off
    ReducedMotion {
        #[arg(value_parser = parse_switch)]
        value: bool,
    },
    /// Complete modules automatically once scrolled to the end
    AutoComplete {
        #[arg(value_parser = parse_switch)]
        value: bool,
    },
    /// Fill stored API keys into copied code
    InjectKeys {
        #[arg(value_parser = parse_switch)]
        value: bool,
    },
    /// Store an API key for a provider; omit the key to remove it
    ApiKey { provider: String, key: Option<String> },
}

fn parse_switch(value: &str) -> Result<bool, String> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("expected on or off, got {other:?}")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "course_tracker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(dir) = cli.content {
        config.content_dir = Some(dir);
    }
    let mut ctx = AppContext::init(&config)?;

    match cli.command {
        Some(Commands::Status) => println!("{}", ctx.status_report()),
        Some(Commands::Modules { week, status }) => {
            let listing = ctx.render_listing(status, week);
            if listing.is_empty() {
                println!("No {status} modules");
            } else {
                println!("{listing}");
            }
        }
        Some(Commands::Search { query }) => run(&mut ctx, Command::Search(query.join(" "))),
        Some(Commands::Open { slug }) => run(&mut ctx, Command::Open(slug)),
        Some(Commands::Read { slug }) => read(&mut ctx, &config, slug).await?,
        Some(Commands::Complete { slug }) => run(&mut ctx, Command::Complete(Some(slug))),
        Some(Commands::Incomplete { slug }) => run(&mut ctx, Command::Uncomplete(Some(slug))),
        Some(Commands::Toggle { slug }) => run(&mut ctx, Command::Toggle(Some(slug))),
        Some(Commands::Bookmark { slug }) => run(&mut ctx, Command::Bookmark(Some(slug))),
        Some(Commands::Scroll { slug, percent }) => {
            known(&ctx, &slug)?;
            ctx.scroll(&slug, percent);
            println!(
                "{} at {:.0}%{}",
                ctx.display_name(&slug),
                ctx.progress.module_progress(&slug),
                if ctx.progress.is_completed(&slug) { " (complete)" } else { "" }
            );
        }
        Some(Commands::Exercise { action }) => exercise(&mut ctx, action)?,
        Some(Commands::Notes { action }) => notes(&mut ctx, action)?,
        Some(Commands::Prefs { action }) => prefs(&mut ctx, action),
        Some(Commands::Copy { file, stdout }) => copy(&ctx, &file, stdout)?,
        Some(Commands::Shell) | None => shell(&mut ctx)?,
    }

    ctx.shutdown();
    Ok(())
}

fn known(ctx: &AppContext, slug: &str) -> Result<()> {
    ctx.check_module(slug).map_err(anyhow::Error::msg)
}

/// Run one palette command and print what it says
fn run(ctx: &mut AppContext, command: Command) {
    if let Outcome::Message(text) = ctx.execute(command) {
        println!("{text}");
    }
}

async fn read(ctx: &mut AppContext, config: &Config, slug: String) -> Result<()> {
    known(ctx, &slug)?;
    run(ctx, Command::Open(slug.clone()));
    if let Some(module) = ctx.catalog().get(&slug) {
        for line in textwrap::wrap(&module.description, 80) {
            println!("{line}");
        }
    }
    println!("Tracking reading time, press Ctrl-C to stop");

    let (_visibility, visibility_rx) = watch::channel(Visibility::Visible);
    let cancel = CancellationToken::new();
    let (handle, mut samples) =
        spawn_time_tracker(slug.clone(), config.flush_interval(), visibility_rx, cancel.clone());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                cancel.cancel();
                break;
            }
            sample = samples.recv() => match sample {
                Some(sample) => ctx.apply_time_sample(&sample),
                None => break,
            },
        }
    }

    handle.await.context("Time tracker stopped unexpectedly")?;
    while let Ok(sample) = samples.try_recv() {
        ctx.apply_time_sample(&sample);
    }

    println!(
        "\nTotal time on {}: {}",
        ctx.display_name(&slug),
        format_duration(ctx.progress.time_spent(&slug))
    );
    Ok(())
}

fn exercise(ctx: &mut AppContext, action: ExerciseAction) -> Result<()> {
    match action {
        ExerciseAction::Check { module, exercise, answers } => {
            let grade =
                ctx.check_exercise(&module, &exercise, &answers).map_err(anyhow::Error::msg)?;
            if grade.is_correct() {
                println!("Correct! {exercise} is complete");
            } else {
                println!("{}/{} correct, try again", grade.correct, grade.total);
            }
        }
        ExerciseAction::Answer { module, question, answer } => {
            known(ctx, &module)?;
            ctx.exercises.save_quiz_answer(&module, &question, &answer);
            println!("Saved answer to {question}");
        }
        ExerciseAction::Show { module } => println!("{}", ctx.exercise_report(&module)),
    }
    Ok(())
}

fn notes(ctx: &mut AppContext, action: NotesAction) -> Result<()> {
    match action {
        NotesAction::Show { slug } => match ctx.notes.get(&slug) {
            Some(note) => println!("{}", note.content),
            None => println!("No notes for {}", ctx.display_name(&slug)),
        },
        NotesAction::Save { slug, text } => {
            known(ctx, &slug)?;
            let content = if text.is_empty() {
                let mut buf = String::new();
                io::stdin().read_to_string(&mut buf).context("Failed to read note from stdin")?;
                buf
            } else {
                text.join(" ")
            };
            let saved = ctx
                .notes
                .save(&slug, &content)
                .with_context(|| format!("Failed to save note for {slug}"))?;
            match saved {
                Some(note) => println!("Saved note ({} words)", note.word_count()),
                None => println!("Note was empty; removed"),
            }
        }
        NotesAction::Delete { slug } => {
            if ctx.notes.delete(&slug) {
                println!("Deleted note for {}", ctx.display_name(&slug));
            } else {
                println!("No notes for {}", ctx.display_name(&slug));
            }
        }
        NotesAction::List => {
            let notes = ctx.notes.list();
            if notes.is_empty() {
                println!("No notes yet");
            }
            let now = chrono::Utc::now();
            for note in notes {
                println!(
                    "{} ({}): {}",
                    ctx.display_name(&note.slug),
                    format_relative_time(note.updated_at, now),
                    truncate(note.headline(), 60)
                );
            }
        }
    }
    Ok(())
}

fn prefs(ctx: &mut AppContext, action: PrefsAction) {
    let prefs = &mut ctx.preferences;
    match action {
        PrefsAction::Show => {}
        PrefsAction::FontSize { size } => prefs.set_font_size(size),
        PrefsAction::ReducedMotion { value } => prefs.set_reduced_motion(value),
        PrefsAction::AutoComplete { value } => prefs.set_auto_mark_complete(value),
        PrefsAction::InjectKeys { value } => prefs.set_inject_keys(value),
        PrefsAction::ApiKey { provider, key } => {
            match api_provider(&provider) {
                Some(known) if key.is_none() => println!("Removed {} key", known.name),
                Some(_) => {}
                None => tracing::warn!("{} is not a known provider", provider),
            }
            prefs.set_api_key(&provider, key.as_deref().unwrap_or(""));
        }
    }

    let state = prefs.state();
    let switch = |on: bool| if on { "on" } else { "off" };
    println!("font size:       {}", state.font_size);
    println!("reduced motion:  {}", switch(state.reduced_motion));
    println!("reading progress {}", switch(state.show_reading_progress));
    println!("estimated time:  {}", switch(state.show_estimated_time));
    println!("auto complete:   {}", switch(state.auto_mark_complete));
    println!("inject keys:     {}", switch(state.inject_keys));
    for provider in API_PROVIDERS {
        let stored = if prefs.api_key(provider.id).is_some() { "set" } else { "-" };
        println!("{:<17}{}", format!("{} key:", provider.id), stored);
    }
}

fn copy(ctx: &AppContext, file: &Path, stdout: bool) -> Result<()> {
    let raw = std::fs::read_to_string(file).with_context(|| format!("Failed to read {:?}", file))?;
    let prefs = ctx.preferences.state();
    let injected = has_smart_content(&raw, prefs);
    let content = inject_keys(&raw, prefs);

    if stdout {
        print!("{content}");
        return Ok(());
    }

    let mut clipboard = arboard::Clipboard::new().context("Clipboard unavailable")?;
    clipboard.set_text(content).context("Failed to copy to clipboard")?;
    if injected {
        println!("Copied {:?} with your API keys filled in", file);
    } else {
        println!("Copied {:?}", file);
    }
    Ok(())
}

/// Read palette commands from stdin until quit or end of input
fn shell(ctx: &mut AppContext) -> Result<()> {
    println!("Type a command, or help for the list");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to write prompt")?;

        let Some(line) = lines.next() else { break };
        let line = line.context("Failed to read command")?;

        match parse_command(&line) {
            ParseResult::Ok(command) => match ctx.execute(command) {
                Outcome::Message(text) => println!("{text}"),
                Outcome::Quit => break,
                Outcome::Silent => {}
            },
            ParseResult::UnknownCommand(cmd) => println!("{}", unknown_command_message(&cmd)),
            ParseResult::MissingArgument(cmd) => println!("{cmd} needs an argument"),
            ParseResult::InvalidArgument(reason) => println!("{reason}"),
        }
    }

    Ok(())
}
