use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON report data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid report data: {0}")]
    InvalidInput(String),

    #[error("method step dependency cycle through steps {0:?}")]
    DependencyCycle(Vec<u32>),

    #[error("font {}: {reason}", path.display())]
    Font { path: PathBuf, reason: String },
}
