use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while auditing a site.
///
/// Most of these never escape a run: per-file and per-link failures are
/// folded into the report of the component that hit them. Only argument and
/// configuration errors are fatal.
#[derive(Debug, Error)]
pub enum Error {
    /// The site root given on the command line is missing or not a directory
    #[error("the directory '{}' does not exist or is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// A file could not be read
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Walking the site tree failed
    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    /// HTTP transport failure
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// An exclude pattern in the configuration is not a valid regex
    #[error("invalid URL pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The configuration file could not be parsed
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid URL '{0}'")]
    InvalidUrl(String),

    /// A redirect chain exceeded the configured hop limit
    #[error("too many redirects (more than {0}), probably a redirect loop")]
    TooManyRedirects(usize),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wraps an I/O error with the path that caused it
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Read {
            path: path.into(),
            source,
        }
    }
}
