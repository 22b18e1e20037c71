pub mod snippet;
pub mod storage;
pub mod tags;

pub use snippet::{PLAIN_TEXT, Snippet, UNCATEGORIZED};
pub use storage::StorageManager;
