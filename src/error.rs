use std::path::PathBuf;
use thiserror::Error;

/// Preparation error types
#[derive(Error, Debug)]
pub enum PrepError {
    #[error("No project has been set up; call existing() or new_project() first")]
    NoProject,

    #[error("Source directory not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("No space left on device for {path}")]
    DiskFull { path: PathBuf },

    #[error("Failed to copy {src} to {dst}")]
    CopyFailed {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory: {path}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove directory: {path}")]
    RemoveDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk directory: {path}")]
    WalkFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Line {line:?} not found in {path}")]
    LineNotFound { path: PathBuf, line: String },

    #[error("Invalid project file: {path}")]
    InvalidProjectXml {
        path: PathBuf,
        #[source]
        source: quick_xml::Error,
    },

    #[error("Failed to start {program}")]
    ToolSpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed with exit code {code}")]
    ToolFailed { command: String, code: i32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PrepError {
    /// Process exit code to report for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            PrepError::ToolFailed { code, .. } => u8::try_from(*code)
                .ok()
                .filter(|c| *c != 0)
                .unwrap_or(1),
            _ => 1,
        }
    }
}
