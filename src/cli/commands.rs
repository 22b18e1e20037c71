use crate::cli::Session;
use crate::config::Config;
use crate::error::IndexError;
use crate::highlight;
use crate::models::{PLAIN_TEXT, Snippet, tags};
use crate::search::{FieldMask, parse_keywords};
use crate::store::SnippetStore;
use anyhow::Context;
use colored::Colorize;
use std::collections::HashMap;
use std::error::Error;
use std::fs;

/// Positional arguments and `--flag [value]` options of a command
#[derive(Debug, Default)]
pub struct Options {
    pub positional: Vec<String>,
    values: HashMap<String, String>,
    switches: Vec<String>,
}

impl Options {
    /// Splits `args` into positionals and options. Flags listed in
    /// `value_flags` consume the following argument.
    pub fn parse(args: &[String], value_flags: &[&str]) -> Result<Self, IndexError> {
        let mut options = Options::default();
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            match arg.strip_prefix("--") {
                Some(flag) if value_flags.contains(&flag) => {
                    let value = iter
                        .next()
                        .ok_or_else(|| IndexError::invalid(format!("--{flag} needs a value")))?;
                    options.values.insert(flag.to_string(), value.clone());
                }
                Some(flag) => options.switches.push(flag.to_string()),
                None => options.positional.push(arg.clone()),
            }
        }

        Ok(options)
    }

    pub fn value(&self, flag: &str) -> Option<&str> {
        self.values.get(flag).map(String::as_str)
    }

    pub fn has(&self, flag: &str) -> bool {
        self.switches.iter().any(|s| s == flag)
    }
}

const SNIPPET_FLAGS: &[&str] = &["category", "syntax", "tags", "comment", "file", "code", "rename"];

/// Shows the content of a snippet by name, highlighted with its syntax
pub fn show_snippet(session: &Session, name: &str) -> Result<(), Box<dyn Error>> {
    let Some(snippet) = session.dispatcher.get_snippet(name)? else {
        println!("{}  No snippet found with name: {}", "┃".bright_magenta(), name);
        return Ok(());
    };

    let in_results = session
        .dispatcher
        .active_index()
        .is_some_and(|index| index.contains(&snippet.name));

    println!(
        "{}  {} {}{}{}",
        "┃".bright_magenta(),
        "SNIPPET".bright_green().bold(),
        snippet.name.bold(),
        if snippet.locked { "  (locked)".yellow() } else { "".normal() },
        if in_results { "  (search result)".bright_cyan() } else { "".normal() }
    );
    println!("{}", "─".repeat(60).bright_magenta());
    println!(
        "{}  {}: {}",
        "┃".bright_magenta(),
        "Category".bright_blue(),
        snippet.category
    );
    println!(
        "{}  {}: {}",
        "┃".bright_magenta(),
        "Syntax".bright_yellow(),
        snippet.syntax
    );
    println!(
        "{}  {}: {}",
        "┃".bright_magenta(),
        "Lines".bright_yellow(),
        snippet.get_line_count()
    );
    if !snippet.tags.is_empty() {
        println!(
            "{}  {}: {}",
            "┃".bright_magenta(),
            "Tags".bright_cyan(),
            snippet.tags_as_string()
        );
    }
    if !snippet.comment.is_empty() {
        println!(
            "{}  {}: {}",
            "┃".bright_magenta(),
            "Comment".bright_cyan(),
            snippet.comment
        );
    }
    println!(
        "{}  {}: {}",
        "┃".bright_magenta(),
        "Updated".bright_black(),
        snippet.updated_at.format("%Y-%m-%d %H:%M")
    );
    println!("{}", "─".repeat(60).bright_magenta());

    let rendered = highlight::highlight_for_terminal(&snippet, &session.config.display.theme)?;
    for line in rendered.lines() {
        println!("{}  {}", "┃".bright_magenta(), line);
    }

    Ok(())
}

/// Reads the code body from `--file` or `--code`
fn code_from(options: &Options) -> anyhow::Result<Option<String>> {
    if let Some(path) = options.value("file") {
        let code =
            fs::read_to_string(path).with_context(|| format!("Failed to read code from {path}"))?;
        return Ok(Some(code));
    }
    Ok(options.value("code").map(str::to_string))
}

/// Canonical syntax name from `--syntax`, rejecting names the highlighter
/// does not know
fn syntax_from(options: &Options) -> Result<Option<String>, IndexError> {
    match options.value("syntax") {
        Some(input) => highlight::resolve_syntax(input)
            .map(Some)
            .ok_or_else(|| IndexError::invalid(format!("unknown syntax '{input}'"))),
        None => Ok(None),
    }
}

/// Guesses a syntax from the extension of a file or snippet name
fn guess_syntax(name: &str) -> Option<String> {
    name.rsplit_once('.')
        .and_then(|(_, ext)| highlight::resolve_syntax(ext))
}

pub fn add_snippet(session: &mut Session, args: &[String]) -> Result<(), Box<dyn Error>> {
    let options = Options::parse(args, SNIPPET_FLAGS)?;
    let Some(name) = options.positional.first() else {
        println!("{}  Error: Missing snippet name", "┃".bright_magenta());
        println!(
            "{}  Usage: snipdex add <NAME> [--category C] [--syntax S] [--tags a,b] [--comment TEXT] [--file PATH | --code TEXT]",
            "┃".bright_magenta()
        );
        return Ok(());
    };

    let syntax = match syntax_from(&options)? {
        Some(syntax) => syntax,
        None => options
            .value("file")
            .and_then(guess_syntax)
            .or_else(|| guess_syntax(name))
            .unwrap_or_else(|| PLAIN_TEXT.to_string()),
    };

    let snippet = Snippet::new(name.clone(), options.value("category").unwrap_or_default())
        .with_syntax(syntax)
        .with_code(code_from(&options)?.unwrap_or_default())
        .with_comment(options.value("comment").unwrap_or_default())
        .with_tags(tags::parse_tag_list(options.value("tags").unwrap_or_default()));

    let category = snippet.category.clone();
    session.dispatcher.insert_snippet(snippet)?;

    println!(
        "{}  Added {} to {}",
        "┃".bright_magenta(),
        name.bright_white().bold(),
        category.bright_blue()
    );
    Ok(())
}

pub fn edit_snippet(session: &mut Session, args: &[String]) -> Result<(), Box<dyn Error>> {
    let options = Options::parse(args, SNIPPET_FLAGS)?;
    let Some(name) = options.positional.first() else {
        println!("{}  Error: Missing snippet name", "┃".bright_magenta());
        println!(
            "{}  Usage: snipdex edit <NAME> [--rename NEW] [--category C] [--syntax S] [--tags a,b] [--comment TEXT] [--file PATH | --code TEXT]",
            "┃".bright_magenta()
        );
        return Ok(());
    };

    let Some(old) = session.dispatcher.get_snippet(name)? else {
        println!("{}  No snippet found with name: {}", "┃".bright_magenta(), name);
        return Ok(());
    };

    if old.locked {
        println!(
            "{}  {} is locked, unlock it before editing",
            "┃".bright_magenta(),
            old.name.bright_white()
        );
        return Ok(());
    }

    let mut new = old.clone();
    if let Some(rename) = options.value("rename") {
        new.name = rename.to_string();
    }
    if let Some(category) = options.value("category") {
        new.category = category.to_string();
    }
    if let Some(syntax) = syntax_from(&options)? {
        new.syntax = syntax;
    }
    if let Some(list) = options.value("tags") {
        new.tags = tags::parse_tag_list(list);
    }
    if let Some(comment) = options.value("comment") {
        new.comment = comment.to_string();
    }
    if let Some(code) = code_from(&options)? {
        new.code = code;
    }

    session.dispatcher.update_snippet(&old, &new)?;
    println!(
        "{}  Updated {}",
        "┃".bright_magenta(),
        new.name.bright_white().bold()
    );
    Ok(())
}

pub fn remove_snippet(session: &mut Session, name: &str) -> Result<(), Box<dyn Error>> {
    let Some(snippet) = session.dispatcher.get_snippet(name)? else {
        println!("{}  No snippet found with name: {}", "┃".bright_magenta(), name);
        return Ok(());
    };

    if snippet.locked {
        println!(
            "{}  {} is locked, unlock it before removing",
            "┃".bright_magenta(),
            snippet.name.bright_white()
        );
        return Ok(());
    }

    session.dispatcher.remove_snippet(&snippet)?;
    println!("{}  Removed {}", "┃".bright_magenta(), name.bright_white());
    Ok(())
}

pub fn remove_category(session: &mut Session, name: &str) -> Result<(), Box<dyn Error>> {
    let searching = session.dispatcher.is_search_active();
    let affected = session.dispatcher.snippets_in(name)?.len();
    session.dispatcher.remove_category(name)?;

    if searching {
        println!(
            "{}  Deleted {} snippets of {} found by the current search",
            "┃".bright_magenta(),
            affected.to_string().bright_yellow(),
            name.bright_blue()
        );
    } else {
        println!(
            "{}  Moved {} snippets of {} to {}",
            "┃".bright_magenta(),
            affected.to_string().bright_yellow(),
            name.bright_blue(),
            crate::models::UNCATEGORIZED.bright_blue()
        );
    }
    Ok(())
}

pub fn rename_category(
    session: &mut Session,
    old_name: &str,
    new_name: &str,
) -> Result<(), Box<dyn Error>> {
    let affected = session.dispatcher.snippets_in(old_name)?.len();
    session.dispatcher.rename_category(old_name, new_name)?;
    println!(
        "{}  Renamed {} to {} ({} snippets)",
        "┃".bright_magenta(),
        old_name.bright_blue(),
        new_name.bright_blue(),
        affected
    );
    Ok(())
}

pub fn set_syntax(
    session: &mut Session,
    syntax: &str,
    category: &str,
    excluded: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let syntax = highlight::resolve_syntax(syntax)
        .ok_or_else(|| IndexError::invalid(format!("unknown syntax '{syntax}'")))?;
    session.dispatcher.set_syntax(&syntax, category, excluded)?;
    println!(
        "{}  Set syntax {} on {}",
        "┃".bright_magenta(),
        syntax.bright_yellow(),
        category.bright_blue()
    );
    Ok(())
}

pub fn lock_snippet(session: &mut Session, name: &str, locked: bool) -> Result<(), Box<dyn Error>> {
    let Some(category) = session.dispatcher.category_of(name)? else {
        println!("{}  No snippet found with name: {}", "┃".bright_magenta(), name);
        return Ok(());
    };

    session.dispatcher.lock_snippet(name, locked)?;
    println!(
        "{}  {} {} in {}",
        "┃".bright_magenta(),
        if locked { "Locked" } else { "Unlocked" },
        name.bright_white(),
        category.bright_blue()
    );
    Ok(())
}

/// Runs a keyword search and switches the session into search mode
pub fn search_snippets(session: &mut Session, args: &[String]) -> Result<(), Box<dyn Error>> {
    let options = Options::parse(args, &["fields"])?;
    let keywords = parse_keywords(&options.positional.join(" "));

    let mut query = session.config.search.query(keywords);
    if let Some(fields) = options.value("fields") {
        query = query.fields(FieldMask::parse(fields)?);
    }
    if options.has("case-sensitive") {
        query = query.case_sensitive(true);
    }

    let found = session.dispatcher.search(&query)?;
    session.recent.record(&query.display(), found);

    println!(
        "{}  {} '{}'",
        "┃".bright_magenta(),
        "SEARCH RESULTS FOR".bold(),
        query.display().bright_white()
    );

    if found == 0 {
        println!(
            "{}  No snippets found matching query: {}",
            "┃".bright_magenta(),
            query.display()
        );
        return Ok(());
    }

    println!(
        "{}  Found {} snippets in {} categories",
        "┃".bright_magenta(),
        found,
        session.dispatcher.count_categories()?
    );
    println!("{}", "─".repeat(60).bright_magenta());
    crate::cli::tree::display_tree(&session.dispatcher, None)
}

pub fn show_history(session: &Session) {
    if session.recent.is_empty() {
        println!("{}  No recent searches.", "┃".bright_magenta());
        return;
    }

    for (idx, entry) in session.recent.entries().iter().enumerate() {
        println!(
            "{}  {}. {} {} {}",
            "┃".bright_magenta(),
            (idx + 1).to_string().bright_yellow(),
            entry.query.bright_white(),
            format!("({} results)", entry.result_count).bright_black(),
            entry.formatted_time().bright_black()
        );
    }
}

pub fn show_counts(session: &Session) -> Result<(), Box<dyn Error>> {
    let dispatcher = &session.dispatcher;

    match dispatcher.active_index() {
        Some(index) => println!(
            "{}  {} snippets in {} categories in search results ({} in database)",
            "┃".bright_magenta(),
            index.count().to_string().bright_yellow(),
            index.count_categories().to_string().bright_yellow(),
            dispatcher.store().count_snippets()?
        ),
        None => println!(
            "{}  {} snippets in {} categories in database",
            "┃".bright_magenta(),
            dispatcher.count_snippets()?.to_string().bright_yellow(),
            dispatcher.count_categories()?.to_string().bright_yellow()
        ),
    }
    Ok(())
}

/// Lists the categories of the current view, or of the whole database with
/// `--all`
pub fn list_categories(session: &Session, args: &[String]) -> Result<(), Box<dyn Error>> {
    let options = Options::parse(args, &[])?;
    let all = options.has("all");
    let categories = if all {
        session.dispatcher.all_categories()?
    } else {
        session.dispatcher.categories()?
    };

    for category in categories {
        let count = if all {
            session.dispatcher.store().snippets_by_category(&category)?.len()
        } else {
            session.dispatcher.snippets_in(&category)?.len()
        };
        println!(
            "{}  {} {}",
            "┃".bright_magenta(),
            category.bright_blue(),
            format!("({count})").bright_black()
        );
    }
    Ok(())
}

/// Shows where the configuration lives, writing the current settings there
/// with `--init`
pub fn show_config(session: &Session, args: &[String]) -> Result<(), Box<dyn Error>> {
    let options = Options::parse(args, &[])?;
    let Some(path) = Config::default_path() else {
        println!("{}  No configuration directory on this platform", "┃".bright_magenta());
        return Ok(());
    };

    if options.has("init") {
        if path.exists() {
            println!(
                "{}  Config already exists at {}",
                "┃".bright_magenta(),
                path.display()
            );
            return Ok(());
        }
        session.config.save_to(&path)?;
        println!("{}  Wrote {}", "┃".bright_magenta(), path.display());
        return Ok(());
    }

    let search = &session.config.search;
    println!("{}  {}: {}", "┃".bright_magenta(), "Config".bright_blue(), path.display());
    println!(
        "{}  {}: {}",
        "┃".bright_magenta(),
        "Search fields".bright_cyan(),
        search
            .field_mask()
            .enabled()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "{}  {}: {}",
        "┃".bright_magenta(),
        "Case sensitive".bright_cyan(),
        search.case_sensitive
    );
    println!(
        "{}  {}: {:?}",
        "┃".bright_magenta(),
        "Case folding".bright_cyan(),
        search.folding
    );
    println!(
        "{}  {}: {}",
        "┃".bright_magenta(),
        "Theme".bright_yellow(),
        session.config.display.theme
    );
    Ok(())
}

pub fn list_syntaxes() {
    for name in highlight::syntax_names() {
        println!("{}  {}", "┃".bright_magenta(), name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_options_parse() {
        let options = Options::parse(
            &args(&["hello.rs", "--category", "Rust", "--case-sensitive", "--tags", "a,b"]),
            SNIPPET_FLAGS,
        )
        .unwrap();

        assert_eq!(options.positional, vec!["hello.rs"]);
        assert_eq!(options.value("category"), Some("Rust"));
        assert_eq!(options.value("tags"), Some("a,b"));
        assert!(options.has("case-sensitive"));
        assert!(Options::parse(&args(&["x", "--category"]), SNIPPET_FLAGS).is_err());
    }

    #[test]
    fn test_guess_syntax() {
        assert_eq!(guess_syntax("main.rs").as_deref(), Some("Rust"));
        assert_eq!(guess_syntax("README"), None);
    }
}
