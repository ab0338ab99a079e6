//! Walks a paginated webcomic one strip at a time and packages each book as
//! an EPUB, one chapter document per chapter.

pub mod book;
pub mod books;
pub mod chapter;
pub mod debug;
pub mod epub;
pub mod error;
pub mod models;
pub mod parser;
pub mod sanitize;
pub mod scraper;
pub mod tui;
pub mod walker;

pub use error::{Result, ScrapeError};
pub use walker::{PageWalker, WalkOptions, WalkSummary};
