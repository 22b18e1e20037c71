//! snipdex - Categorized Snippet Index
//!
//! A terminal tool for organizing code snippets by category, with a search
//! mode that narrows every view to the snippets matching a keyword query.
//!
//! snipdex provides developers with:
//! - A category tree over a JSON snippet database
//! - Keyword search across code, names, comments and tags
//! - Category operations (rename, remove, bulk syntax) that act on the
//!   search results while a search is active
//! - Syntax highlighted snippet display

use crate::cli::Session;
use crate::config::Config;
use crate::models::StorageManager;
use crate::store::JsonSnippetStore;
use env_logger::Env;
use std::error::Error;

mod cli;
mod config;
mod dispatcher;
mod error;
mod highlight;
mod index;
mod models;
mod search;
mod store;

/// Application entry point and initialization
/// Loads the configuration, opens the snippet database and hands the
/// arguments to the CLI. With no arguments the interactive shell starts.
fn main() -> Result<(), Box<dyn Error>> {
    color_eyre::install()?;

    let config = Config::load()?;
    env_logger::Builder::from_env(Env::default().default_filter_or(config.logging.level.as_str()))
        .init();

    let storage = match &config.storage.data_dir {
        Some(dir) => StorageManager::with_data_dir(dir.clone())?,
        None => StorageManager::new()?,
    };
    log::info!("Using data directory {}", storage.data_directory().display());

    let store = JsonSnippetStore::open(storage)?;
    let mut session = Session::new(store, config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    cli::execute_cli(&args, &mut session)
}
