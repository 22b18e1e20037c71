use crate::dispatcher::Dispatcher;
use crate::index::CategoryIndex;
use crate::models::Snippet;
use crate::store::SnippetStore;
use colored::Colorize;
use std::error::Error;

/// Displays categories and their snippets in a tree-like structure, reading
/// from whichever view the dispatcher currently routes to
pub fn display_tree<S: SnippetStore>(
    dispatcher: &Dispatcher<S>,
    category: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    if dispatcher.active_index().is_some_and(CategoryIndex::is_empty) {
        println!("{}  No snippets in the current search results.", "┃".bright_magenta());
        return Ok(());
    }

    let categories = match category {
        Some(name) => vec![name.to_string()],
        None => dispatcher.categories()?,
    };

    if categories.is_empty() {
        println!("{}  No snippets found in database.", "┃".bright_magenta());
        return Ok(());
    }

    for name in &categories {
        let snippets = dispatcher.snippets_in(name)?;
        if category.is_some() && snippets.is_empty() {
            println!("{}  No snippets in category: {}", "┃".bright_magenta(), name);
            continue;
        }

        println!(
            "{}  {} {} {}",
            "┃".bright_magenta(),
            "󰉋".bright_blue(),
            name.bold(),
            format!("({})", snippets.len()).bright_black()
        );
        print_category_contents(&snippets);
    }

    Ok(())
}

fn print_category_contents(snippets: &[Snippet]) {
    for (i, snippet) in snippets.iter().enumerate() {
        let connector = if i == snippets.len() - 1 {
            "└── "
        } else {
            "├── "
        };

        let lock = if snippet.locked {
            " ".yellow()
        } else {
            "".normal()
        };

        println!(
            "{}  {}{}{} {}",
            "┃".bright_magenta(),
            connector,
            snippet.name.bright_white(),
            lock,
            format!("[{}]", snippet.syntax).bright_black()
        );
    }
}
