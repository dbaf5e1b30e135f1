mod config;
pub mod database;
pub mod kv;
pub mod session_log;

pub use config::{Config, TimerConfig};
pub use database::Database;
pub use kv::{KvStore, MemoryStore};
pub use session_log::{SessionLog, SessionRecord, TaskContext};

use std::path::PathBuf;

/// Returns `~/.config/pomotick[-dev]/` based on POMOTICK_ENV.
///
/// Set POMOTICK_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("POMOTICK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("pomotick-dev")
    } else {
        base_dir.join("pomotick")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
