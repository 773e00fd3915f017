//! Error types shared by the shell modules.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    /// Preference or window-state file could not be read or written
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Tauri error: {0}")]
    Tauri(#[from] tauri::Error),

    /// A live window operation failed
    #[error("Window error: {0}")]
    Window(String),
}

pub type Result<T> = std::result::Result<T, ShellError>;
