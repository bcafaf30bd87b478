//! `topicdex`: command-line front end for the topic catalog.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Init logger at the configured level
//!   4. Load content and build the catalog index
//!   5. Open the durable store (in-memory fallback)
//!   6. Run one command and exit
//!
//! # Usage
//!
//! ```text
//! topicdex [--config <path>] <command>
//!
//! Commands:
//!   list [--difficulty <d>] [--tag <t>]... [--learned|--unlearned] [text...]
//!   show <id>              print a topic with its related and next topics
//!   learn <id>             toggle the learned flag of a topic
//!   learned                list learned topics
//!   clear-learned          forget every learned flag
//!   tags                   list all tags
//!   categories             list categories with topic counts
//!   notes                  print the number of saved notes
//!   ask [--echo] <id> <message...>
//!                          ask the chat assistant about a topic
//! ```

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use tracing::{info, warn};

use topicdex::catalog::{content, query, CatalogIndex, Category, DifficultyFilter, ProgressFilter, Topic};
use topicdex::chat::echo::EchoBackend;
use topicdex::chat::{ChatBackend, ChatHistory, ChatReply, ChatSession};
use topicdex::config::{self, Config};
use topicdex::error::AppError;
use topicdex::logger;
use topicdex::state::Preferences;
use topicdex::storage::{file::FileStore, notes_count, Storage};

// ── CLI arg parsing ────────────────────────────────────────────────────────

struct Args {
    config: Option<PathBuf>,
    command: Option<String>,
    rest: Vec<String>,
}

fn parse_args() -> Args {
    let mut config = None;
    let mut command = None;
    let mut rest = Vec::new();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        if command.is_some() {
            rest.push(arg);
            continue;
        }
        match arg.as_str() {
            "--config" | "-c" => config = iter.next().map(PathBuf::from),
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            _ => command = Some(arg),
        }
    }

    Args { config, command, rest }
}

fn print_help() {
    println!(
        "topicdex [--config <path>] <command>\n\n\
         Commands:\n  \
           list [--difficulty <d>] [--tag <t>]... [--learned|--unlearned] [text...]\n  \
           show <id>\n  \
           learn <id>\n  \
           learned\n  \
           clear-learned\n  \
           tags\n  \
           categories\n  \
           notes\n  \
           ask [--echo] <id> <message...>"
    );
}

// ── Entry point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // .env is optional.
    let _ = dotenvy::dotenv();

    let args = parse_args();
    let config = config::load(args.config.as_deref())?;
    logger::init(config.log_level)?;
    info!(app = %config.app_name, work_dir = %config.work_dir.display(), "config loaded");

    let Some(command) = args.command else {
        print_help();
        return Ok(());
    };

    let (categories, index) = content::load_catalog(&config.content_dir)?;
    let storage = open_storage(&config);
    let mut prefs = Preferences::new(storage.clone());

    match command.as_str() {
        "list" => cmd_list(&index, &mut prefs, &args.rest),
        "show" => cmd_show(&index, &prefs, first_arg(&args.rest, "show <id>")?),
        "learn" => {
            let id = first_arg(&args.rest, "learn <id>")?;
            let topic = lookup(&index, id)?;
            let now = prefs.learned().toggle_learned(&topic.id);
            println!("{} {}", if now { "learned" } else { "unlearned" }, topic.id);
            Ok(())
        }
        "learned" => {
            for id in prefs.learned().learned_ids() {
                let title = index.lookup_by_id(&id).map_or("(not in catalog)", |t| t.title.as_str());
                println!("{id}\t{title}");
            }
            Ok(())
        }
        "clear-learned" => {
            prefs.learned().clear_all_learned();
            println!("cleared");
            Ok(())
        }
        "tags" => {
            for tag in index.tags() {
                println!("{tag}");
            }
            Ok(())
        }
        "categories" => {
            print_categories(&categories);
            Ok(())
        }
        "notes" => {
            println!("{}", notes_count(&storage));
            Ok(())
        }
        "ask" => cmd_ask(&config, &index, &storage, &args.rest).await,
        other => Err(AppError::Config(format!("unknown command '{other}' (try --help)"))),
    }
}

/// File-backed store under the work dir; in-memory when it cannot be opened.
fn open_storage(config: &Config) -> Storage {
    match FileStore::open(&config.work_dir) {
        Ok(store) => Storage::new(Arc::new(store)),
        Err(e) => {
            warn!(error = %e, "durable storage unavailable; progress will not be saved");
            Storage::in_memory()
        }
    }
}

fn first_arg<'a>(rest: &'a [String], usage: &str) -> Result<&'a str, AppError> {
    rest.first()
        .map(String::as_str)
        .ok_or_else(|| AppError::Config(format!("usage: topicdex {usage}")))
}

fn lookup<'a>(index: &'a CatalogIndex, id: &str) -> Result<&'a Topic, AppError> {
    index
        .lookup_by_id(id)
        .ok_or_else(|| AppError::Config(format!("no topic with id '{id}'")))
}

// ── Commands ───────────────────────────────────────────────────────────────

fn cmd_list(index: &CatalogIndex, prefs: &mut Preferences, rest: &[String]) -> Result<(), AppError> {
    let mut words = Vec::new();
    let mut iter = rest.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--difficulty" | "-d" => {
                let value = iter
                    .next()
                    .ok_or_else(|| AppError::Config("--difficulty needs a value".into()))?;
                let filter: DifficultyFilter = value.parse().map_err(AppError::Config)?;
                prefs.update(|s| s.set_selected_difficulty(filter));
            }
            "--tag" | "-t" => {
                let tag = iter
                    .next()
                    .ok_or_else(|| AppError::Config("--tag needs a value".into()))?;
                prefs.update(|s| s.toggle_tag(tag));
            }
            "--learned" => prefs.update(|s| s.set_progress(ProgressFilter::LearnedOnly)),
            "--unlearned" => prefs.update(|s| s.set_progress(ProgressFilter::UnlearnedOnly)),
            word => words.push(word),
        }
    }
    let text = words.join(" ");
    prefs.update(|s| s.set_search_query(text));

    let ids = prefs.visible_topics(index);
    for id in &ids {
        if let Some(t) = index.lookup_by_id(id) {
            let mark = if prefs.learned().is_learned(id) { "✓" } else { " " };
            println!("{mark} {:<28} {:<13} {}", t.id, t.difficulty, t.title);
        }
    }
    println!("{} of {} topics", ids.len(), index.len());
    let tags = query::tags_of(index, &ids);
    if !tags.is_empty() && ids.len() < index.len() {
        println!("tags in results: {}", tags.join(", "));
    }
    Ok(())
}

fn cmd_show(index: &CatalogIndex, prefs: &Preferences, id: &str) -> Result<(), AppError> {
    let t = lookup(index, id)?;
    let learned = if prefs.learned().is_learned(&t.id) { " [learned]" } else { "" };
    println!("{} ({}){learned}", t.title, t.difficulty);
    if t.is_frontend_essential == Some(true) {
        println!("frontend essential");
    }
    println!("tags: {}\n", t.tags.join(", "));
    println!("{}", t.description);
    if !t.additional_description.is_empty() {
        println!("\n{}", t.additional_description);
    }
    if !t.key_points.is_empty() {
        println!("\nKey points:");
        for p in &t.key_points {
            println!("  - {p}");
        }
    }
    for ex in &t.examples {
        println!("\n// {}\n{}", ex.title, ex.code);
    }
    if let Some(fact) = &t.fun_fact {
        println!("\nFun fact: {fact}");
    }
    let related = index.related(&t.id);
    if !related.is_empty() {
        let titles: Vec<_> = related.iter().map(|r| format!("{} ({})", r.title, r.id)).collect();
        println!("\nRelated: {}", titles.join(", "));
    }
    if let Some(next) = index.next(&t.id) {
        println!("Next: {} ({})", next.title, next.id);
    }
    Ok(())
}

async fn cmd_ask(config: &Config, index: &CatalogIndex, storage: &Storage, rest: &[String]) -> Result<(), AppError> {
    let (echo, rest) = match rest.split_first() {
        Some((flag, tail)) if flag == "--echo" => (true, tail),
        _ => (false, rest),
    };
    let id = first_arg(rest, "ask [--echo] <id> <message...>")?;
    let topic = lookup(index, id)?;
    let message = rest[1..].join(" ");
    if message.trim().is_empty() {
        return Err(AppError::Config("usage: topicdex ask [--echo] <id> <message...>".into()));
    }

    let backend = build_backend(config, echo)?;
    let history = ChatHistory::new(storage.clone(), config.chat.history_cap);
    let session = ChatSession::new(backend, history, config.chat.system_prompt.clone(), topic);

    match session.ask(&message).await {
        Ok(ChatReply::Answer(answer)) => println!("{answer}"),
        Ok(ChatReply::Stale) => {}
        Err(e) => eprintln!("[{}] {}", e.code, e.message),
    }
    Ok(())
}

#[cfg(feature = "chat")]
fn build_backend(config: &Config, echo: bool) -> Result<ChatBackend, AppError> {
    if echo {
        return Ok(ChatBackend::Echo(EchoBackend));
    }
    Ok(ChatBackend::Http(topicdex::chat::client::ChatClient::new(&config.chat)?))
}

#[cfg(not(feature = "chat"))]
fn build_backend(_config: &Config, _echo: bool) -> Result<ChatBackend, AppError> {
    Ok(ChatBackend::Echo(EchoBackend))
}

fn print_categories(categories: &[Category]) {
    for c in categories {
        println!("{:<32} {}", c.name, c.topics.len());
    }
}
