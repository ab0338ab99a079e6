use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io;
use std::path::Path;

/// Milestone lines printed whatever the verbosity: book and chapter starts,
/// saved books and the final summary.
#[derive(Debug, Clone, Copy)]
pub struct ProgressReporter {
    enabled: bool,
}

impl ProgressReporter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn line(&self, color: Color, text: String) -> io::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        execute!(
            io::stdout(),
            SetForegroundColor(color),
            Print(text),
            Print("\n"),
            ResetColor
        )
    }

    pub fn begin_book(&self, number: u32, title: &str) -> io::Result<()> {
        self.line(Color::Cyan, format!("Beginning Book {}: {}...", number, title))
    }

    pub fn begin_chapter(&self, index: u32, title: &str) -> io::Result<()> {
        self.line(Color::White, format!("   Beginning Chapter {}: {}...", index, title))
    }

    pub fn book_saved(&self, path: &Path) -> io::Result<()> {
        self.line(Color::Green, format!("Saved {}", path.display()))
    }

    pub fn finished(&self, books: usize, pages: usize, images: usize) -> io::Result<()> {
        self.line(
            Color::Green,
            format!(
                "Scraping complete. {} books, {} pages, {} images.",
                books, pages, images
            ),
        )
    }
}
