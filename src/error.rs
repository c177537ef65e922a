use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SorterError {
    #[error("missing config file agilent-sorter.toml in current directory")]
    #[diagnostic(help("pass --config <path> or create agilent-sorter.toml"))]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse TOML config: {0}")]
    ConfigParse(String),

    #[error("invalid config value for {key}: {message}")]
    InvalidConfig { key: &'static str, message: String },

    #[error("the source path {0} does not exist or is not a directory")]
    SourceNotFound(PathBuf),

    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),

    #[error("failed to read metadata file {path}: {message}")]
    MetadataRead { path: PathBuf, message: String },

    #[error("ledger error at {path}: {message}")]
    Ledger { path: PathBuf, message: String },

    #[error("copy of {source_dir} to {destination} failed: {message}")]
    Copy {
        source_dir: PathBuf,
        destination: PathBuf,
        message: String,
    },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
