use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use syntect::{
    easy::HighlightLines,
    highlighting::{Theme, ThemeSet},
    parsing::{SyntaxReference, SyntaxSet},
    util::{LinesWithEndings, as_24_bit_terminal_escaped},
};

use crate::models::{PLAIN_TEXT, Snippet};

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

const FALLBACK_THEME: &str = "base16-ocean.dark";

/// Names of every syntax that can be assigned to a snippet, sorted
pub fn syntax_names() -> Vec<String> {
    let mut names: Vec<String> = SYNTAX_SET
        .syntaxes()
        .iter()
        .map(|syntax| syntax.name.clone())
        .collect();
    names.sort_by_key(|name| name.to_lowercase());
    names.dedup();
    names
}

/// Canonical syntax name for user input: a syntax name in any case
/// (`"rust"`) or a file extension (`"py"`)
pub fn resolve_syntax(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    SYNTAX_SET
        .syntaxes()
        .iter()
        .find(|syntax| syntax.name.eq_ignore_ascii_case(input))
        .or_else(|| SYNTAX_SET.find_syntax_by_extension(input))
        .map(|syntax| syntax.name.clone())
}

/// Syntax used to render `snippet`: its assigned syntax, else a guess from
/// the extension of its name, else plain text. An explicit plain text syntax
/// counts as unassigned.
fn syntax_for(snippet: &Snippet) -> &'static SyntaxReference {
    let syntax_set: &'static SyntaxSet = &SYNTAX_SET;

    let assigned = if snippet.syntax == PLAIN_TEXT {
        None
    } else {
        syntax_set.find_syntax_by_name(&snippet.syntax)
    };

    assigned
        .or_else(|| {
            snippet
                .name
                .rsplit_once('.')
                .and_then(|(_, ext)| syntax_set.find_syntax_by_extension(ext))
        })
        .unwrap_or_else(|| syntax_set.find_syntax_plain_text())
}

fn theme(name: &str) -> &'static Theme {
    let theme_set: &'static ThemeSet = &THEME_SET;

    theme_set.themes.get(name).unwrap_or_else(|| {
        log::warn!("Unknown theme '{}', using {}", name, FALLBACK_THEME);
        &theme_set.themes[FALLBACK_THEME]
    })
}

/// Renders the snippet's code with 24-bit terminal colors
pub fn highlight_for_terminal(snippet: &Snippet, theme_name: &str) -> Result<String> {
    let syntax = syntax_for(snippet);
    let mut highlighter = HighlightLines::new(syntax, theme(theme_name));
    let mut output = String::new();

    for line in LinesWithEndings::from(&snippet.code) {
        let ranges = highlighter
            .highlight_line(line, &SYNTAX_SET)
            .with_context(|| format!("Failed to highlight '{}'", snippet.name))?;
        output.push_str(&as_24_bit_terminal_escaped(&ranges[..], false));
    }

    // reset colors so the terminal is left clean
    output.push_str("\x1b[0m");
    Ok(output)
}
