use crate::models::Snippet;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DATABASE_VERSION: u32 = 1;

/// On-disk layout of the snippet database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetDatabase {
    pub version: u32,
    pub snippets: Vec<Snippet>,
}

impl Default for SnippetDatabase {
    fn default() -> Self {
        Self {
            version: DATABASE_VERSION,
            snippets: Vec::new(),
        }
    }
}

/// Storage Manager for disk operations
#[derive(Debug, Clone)]
pub struct StorageManager {
    data_dir: PathBuf,
    database_file: PathBuf,
}

impl StorageManager {
    /// Uses the platform data directory (`~/.local/share/snipdex` on Linux)
    pub fn new() -> Result<Self> {
        let data_dir = dirs::data_dir()
            .context("Failed to get data directory")?
            .join("snipdex");

        Self::with_data_dir(data_dir)
    }

    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).with_context(|| {
            format!("Failed to create data directory {}", data_dir.display())
        })?;

        Ok(Self {
            database_file: data_dir.join("database.json"),
            data_dir,
        })
    }

    pub fn load_database(&self) -> Result<SnippetDatabase> {
        if !self.database_file.exists() {
            return Ok(SnippetDatabase::default());
        }

        let content =
            fs::read_to_string(&self.database_file).context("Failed to read database file")?;

        let database: SnippetDatabase =
            serde_json::from_str(&content).context("Failed to parse database JSON")?;

        if database.version > DATABASE_VERSION {
            anyhow::bail!(
                "Database version {} is newer than supported version {}",
                database.version,
                DATABASE_VERSION
            );
        }

        Ok(database)
    }

    /// Writes the database through a temporary file so a crash never leaves
    /// a truncated database behind
    pub fn save_database(&self, db: &SnippetDatabase) -> Result<()> {
        let content = serde_json::to_string_pretty(db).context("Failed to serialize database")?;

        let temp_path = self.database_file.with_extension("json.tmp");
        fs::write(&temp_path, content).context("Failed to write database file")?;
        fs::rename(&temp_path, &self.database_file).context("Failed to replace database file")?;

        log::debug!(
            "Saved {} snippets to {}",
            db.snippets.len(),
            self.database_file.display()
        );
        Ok(())
    }

    pub fn data_directory(&self) -> &Path {
        &self.data_dir
    }

    pub fn database_path(&self) -> &Path {
        &self.database_file
    }
}
