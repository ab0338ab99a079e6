//! Error taxonomy for a scraping run.
//!
//! Everything except [`ScrapeError::Usage`] is fatal: the run stops and no
//! partial book is written for the book that was in progress.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// `-b` was given something other than a book number in range.
    #[error("Please enter a number between 1 and {max} when using the -b argument (got '{given}').")]
    Usage { given: String, max: usize },

    /// The title block mentions a book but does not follow the
    /// `Book N: Title — Chapter` layout.
    #[error("Malformed title block '{title}': {reason}")]
    MetadataParse { title: String, reason: String },

    /// A page or image could not be fetched.
    #[error("Failed to fetch '{url}': {reason}")]
    Fetch { url: String, reason: String },

    /// The page was fetched but an expected element is missing or unusable.
    #[error("Page '{url}' is missing {what}")]
    MissingElement { url: String, what: String },

    #[error("Failed to write '{}': {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to package '{}': {source}", .path.display())]
    Packaging {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Terminal output failed: {0}")]
    Terminal(#[source] io::Error),
}

impl ScrapeError {
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        ScrapeError::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn metadata(title: impl Into<String>, reason: impl Into<String>) -> Self {
        ScrapeError::MetadataParse {
            title: title.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
