mod config;
pub mod database;
pub mod migrations;
pub mod repository;

pub use config::{Config, LoggingConfig, ScreensConfig, SessionsConfig, TimerConfig};
pub use database::Database;
pub use repository::{SessionRepository, StudyStore, SubjectRepository, TaskRepository};

use std::path::PathBuf;

/// Returns `~/.config/studymaestro[-dev]/` based on STUDYMAESTRO_ENV.
///
/// Set STUDYMAESTRO_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STUDYMAESTRO_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("studymaestro-dev")
    } else {
        base_dir.join("studymaestro")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
