//! Command-line front end for snipdex.
//!
//! Every command runs against a [`Session`], which owns the mode dispatcher,
//! so one-shot invocations and the interactive shell share the same code
//! paths. Inside the shell a search stays active until `clear`.

pub mod commands;
pub mod tree;

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::search::RecentSearches;
use crate::store::JsonSnippetStore;
use colored::Colorize;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::io::{self, BufRead, Write};

static ARGUMENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]*)"|(\S+)"#).expect("argument pattern is valid"));

/// State shared by the commands of one run
pub struct Session {
    pub dispatcher: Dispatcher<JsonSnippetStore>,
    pub config: Config,
    pub recent: RecentSearches,
}

impl Session {
    pub fn new(store: JsonSnippetStore, config: Config) -> Self {
        Self {
            dispatcher: Dispatcher::new(store),
            config,
            recent: RecentSearches::new(),
        }
    }
}

/// Splits a shell line into arguments, keeping double-quoted runs together
pub fn split_command(line: &str) -> Vec<String> {
    ARGUMENT_PATTERN
        .captures_iter(line)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Executes CLI commands based on the provided arguments
pub fn execute_cli(args: &[String], session: &mut Session) -> Result<(), Box<dyn Error>> {
    if args.is_empty() || args[0] == "shell" {
        return shell(session);
    }
    execute_command(args, session)
}

fn execute_command(args: &[String], session: &mut Session) -> Result<(), Box<dyn Error>> {
    let Some(command) = args.first() else {
        return Ok(());
    };
    let rest = &args[1..];

    match command.as_str() {
        "list" | "ls" => {
            tree::display_tree(&session.dispatcher, rest.first().map(String::as_str))?;
        }
        "categories" | "cats" => {
            commands::list_categories(session, rest)?;
        }
        "show" | "view" | "cat" => {
            let Some(name) = rest.first() else {
                println!("{}  Error: Missing snippet name", "┃".bright_magenta());
                println!("{}  Usage: snipdex show <NAME>", "┃".bright_magenta());
                return Ok(());
            };
            commands::show_snippet(session, name)?;
        }
        "add" | "new" => commands::add_snippet(session, rest)?,
        "edit" => commands::edit_snippet(session, rest)?,
        "rm" | "remove" => {
            let Some(name) = rest.first() else {
                println!("{}  Error: Missing snippet name", "┃".bright_magenta());
                println!("{}  Usage: snipdex rm <NAME>", "┃".bright_magenta());
                return Ok(());
            };
            commands::remove_snippet(session, name)?;
        }
        "rename-category" => {
            let [old_name, new_name, ..] = rest else {
                println!(
                    "{}  Usage: snipdex rename-category <OLD> <NEW>",
                    "┃".bright_magenta()
                );
                return Ok(());
            };
            commands::rename_category(session, old_name, new_name)?;
        }
        "rm-category" => {
            let Some(name) = rest.first() else {
                println!("{}  Usage: snipdex rm-category <CATEGORY>", "┃".bright_magenta());
                return Ok(());
            };
            commands::remove_category(session, name)?;
        }
        "set-syntax" => {
            let [syntax, category, excluded @ ..] = rest else {
                println!(
                    "{}  Usage: snipdex set-syntax <SYNTAX> <CATEGORY> [EXCLUDED]",
                    "┃".bright_magenta()
                );
                return Ok(());
            };
            commands::set_syntax(
                session,
                syntax,
                category,
                excluded.first().map(String::as_str),
            )?;
        }
        "lock" | "unlock" => {
            let Some(name) = rest.first() else {
                println!("{}  Usage: snipdex {} <NAME>", "┃".bright_magenta(), command);
                return Ok(());
            };
            commands::lock_snippet(session, name, command == "lock")?;
        }
        "search" | "find" => {
            if rest.is_empty() {
                println!("{}  Error: Missing search query", "┃".bright_magenta());
                println!("{}  Usage: snipdex search <KEYWORDS>", "┃".bright_magenta());
                return Ok(());
            }
            commands::search_snippets(session, rest)?;
        }
        "clear" => {
            session.dispatcher.clear_search();
            println!("{}  Search cleared", "┃".bright_magenta());
        }
        "history" => commands::show_history(session),
        "count" => commands::show_counts(session)?,
        "syntaxes" => commands::list_syntaxes(),
        "config" => commands::show_config(session, rest)?,
        "help" => print_help(),
        _ => {
            println!("{}  Unknown command: {}", "┃".bright_magenta(), command);
            print_help();
        }
    }

    Ok(())
}

/// Reads commands from stdin until `exit` or end of input. Command errors are
/// reported and the shell keeps going.
fn shell(session: &mut Session) -> Result<(), Box<dyn Error>> {
    println!(
        "{}  {} {}",
        "┃".bright_magenta(),
        "snipdex shell".bold(),
        "(type help for commands, exit to quit)".bright_black()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        let prompt = if session.dispatcher.is_search_active() {
            "search> "
        } else {
            "snipdex> "
        };
        print!("{}", prompt.bright_magenta());
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }

        let args = split_command(&line);
        match args.first().map(String::as_str) {
            None => continue,
            Some("exit" | "quit" | "q") => break,
            Some(_) => {
                if let Err(err) = execute_command(&args, session) {
                    log::debug!("Command {:?} failed: {}", args, err);
                    println!("{}  {} {}", "┃".bright_magenta(), "Error:".red(), err);
                }
            }
        }
    }

    Ok(())
}

const COMMANDS: &[(&str, &str)] = &[
    ("list, ls [CATEGORY]", "List categories and snippets in tree format"),
    ("categories [--all]", "List categories with snippet counts"),
    ("show, view <NAME>", "Display a snippet with highlighting"),
    ("add <NAME> [OPTIONS]", "Add a snippet (--category --syntax --tags --comment --file --code)"),
    ("edit <NAME> [OPTIONS]", "Edit a snippet (same options plus --rename)"),
    ("rm <NAME>", "Remove a snippet"),
    ("rename-category <OLD> <NEW>", "Rename a category"),
    ("rm-category <CATEGORY>", "Remove a category (deletes members while searching)"),
    ("set-syntax <SYNTAX> <CAT> [EX]", "Set the syntax of a category, skipping EX"),
    ("lock, unlock <NAME>", "Protect a snippet from edits and removal"),
    ("search <KEYWORDS>", "Search (--fields code,name,comment,tags --case-sensitive)"),
    ("clear", "Leave search mode"),
    ("history", "Show recent searches"),
    ("count", "Count snippets and categories in the current view"),
    ("syntaxes", "List syntaxes available for highlighting"),
    ("config [--init]", "Show settings, or write them to the config file"),
    ("shell", "Start the interactive shell"),
    ("help", "Display this help message"),
];

/// Prints the help message with available commands
fn print_help() {
    println!(
        "{}  {}",
        "┃".bright_magenta(),
        "SNIPDEX - CATEGORIZED SNIPPET INDEX".bold()
    );

    println!("{}  {}", "┃".bright_magenta(), "USAGE:".bright_yellow());
    println!("{}  snipdex [COMMAND] [ARGS]", "┃".bright_magenta());
    println!("{}  {}", "┃".bright_magenta(), "COMMANDS:".bright_yellow());
    for (usage, description) in COMMANDS {
        println!(
            "{}  {:<31} {}",
            "┃".bright_magenta(),
            usage.bright_white(),
            description
        );
    }

    println!("{}  {}", "┃".bright_magenta(), "TIP:".bright_green());
    println!(
        "{}  Run with no arguments to start the interactive shell, where searches stay active until clear",
        "┃".bright_magenta()
    );
}
