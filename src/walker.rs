//! The page walk: follows "next" links from a start page, tracks book and
//! chapter boundaries, and hands finished chapters and books to the
//! [`BookAssembler`].

use crate::book::{BookAssembler, BookStart, PackagedBook};
use crate::chapter::ChapterAccumulator;
use crate::error::{Result, ScrapeError};
use crate::models::{PageMetadata, StripTitle, TitleBlock};
use crate::parser::parse_title_block;
use crate::tui::ProgressReporter;
use crate::{books, debug_println, info_println};
use std::collections::VecDeque;
use std::path::PathBuf;

/// A browser-like session positioned on one page at a time.
pub trait PageSource {
    fn navigate(&mut self, url: &str) -> Result<()>;
    fn read_title_block(&self) -> Result<String>;
    fn read_image_sources(&self) -> Result<Vec<String>>;
    fn read_footnote_html(&self) -> Result<Option<String>>;
    fn read_next_page_url(&self) -> Result<Option<String>>;
}

/// Fetches raw image bytes. No retries; non-2xx is an error.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Persists a finished book and reports where it went.
pub trait BookSink {
    fn persist(&mut self, book: &PackagedBook) -> Result<PathBuf>;
}

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub start_url: String,
    pub single_book: bool,
    pub author: String,
    pub language: String,
    pub user_agent: String,
    pub show_progress: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            start_url: books::FIRST_PAGE_URL.to_string(),
            single_book: false,
            author: "Howard Taylor".to_string(),
            language: "en".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            show_progress: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkerState {
    AwaitingFirstPage,
    Traversing,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// A page without a book in its title block was reached.
    EndOfSequence,
    /// The requested single book was written.
    SingleBookComplete,
    /// The last page had no usable next link.
    QueueExhausted,
}

/// Everything the walk carries from one page to the next.
#[derive(Debug, Clone)]
pub struct TraversalState {
    pub visit_queue: VecDeque<String>,
    pub previous_book: Option<(u32, String)>,
    pub previous_chapter: Option<String>,
    pub current_chapter_index: u32,
    pub current_page_in_book: u32,
    pub current_page_in_chapter: u32,
    pub phase: WalkerState,
    pub termination: Option<TerminationReason>,
    pub pages_visited: usize,
    pub images_fetched: usize,
}

impl TraversalState {
    pub fn new(start_url: impl Into<String>) -> Self {
        let mut visit_queue = VecDeque::new();
        visit_queue.push_back(start_url.into());
        Self {
            visit_queue,
            previous_book: None,
            previous_chapter: None,
            current_chapter_index: 1,
            current_page_in_book: 1,
            current_page_in_chapter: 1,
            phase: WalkerState::AwaitingFirstPage,
            termination: None,
            pages_visited: 0,
            images_fetched: 0,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == WalkerState::Terminated
    }

    fn starts_new_chapter(&self, title: &StripTitle) -> bool {
        self.previous_chapter.as_deref() != Some(title.chapter_title.as_str())
    }

    fn starts_new_book(&self, title: &StripTitle) -> bool {
        self.previous_book.as_ref().map(|(_, t)| t.as_str()) != Some(title.book_title.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkSummary {
    pub books_written: Vec<PathBuf>,
    pub pages_visited: usize,
    pub images_fetched: usize,
    pub reason: TerminationReason,
}

pub struct PageWalker<P: PageSource, F: ImageFetcher, S: BookSink> {
    source: P,
    fetcher: F,
    assembler: BookAssembler<S>,
    accumulator: ChapterAccumulator,
    state: TraversalState,
    reporter: ProgressReporter,
}

impl<P: PageSource, F: ImageFetcher, S: BookSink> PageWalker<P, F, S> {
    pub fn new(source: P, fetcher: F, sink: S, options: &WalkOptions) -> Self {
        Self {
            source,
            fetcher,
            assembler: BookAssembler::new(
                sink,
                options.author.clone(),
                options.language.clone(),
                options.single_book,
            ),
            accumulator: ChapterAccumulator::new(options.author.clone()),
            state: TraversalState::new(options.start_url.clone()),
            reporter: ProgressReporter::new(options.show_progress),
        }
    }

    pub fn state(&self) -> &TraversalState {
        &self.state
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn assembler(&self) -> &BookAssembler<S> {
        &self.assembler
    }

    pub fn into_sink(self) -> S {
        self.assembler.into_sink()
    }

    /// Walk until terminated.
    pub fn run(&mut self) -> Result<WalkSummary> {
        while self.step()? != WalkerState::Terminated {}

        let summary = WalkSummary {
            books_written: self.assembler.written().to_vec(),
            pages_visited: self.state.pages_visited,
            images_fetched: self.state.images_fetched,
            reason: self
                .state
                .termination
                .unwrap_or(TerminationReason::QueueExhausted),
        };
        self.reporter
            .finished(
                summary.books_written.len(),
                summary.pages_visited,
                summary.images_fetched,
            )
            .map_err(ScrapeError::Terminal)?;
        Ok(summary)
    }

    /// Visit the next queued page.
    pub fn step(&mut self) -> Result<WalkerState> {
        if self.state.is_terminated() {
            return Ok(WalkerState::Terminated);
        }
        let Some(url) = self.state.visit_queue.pop_front() else {
            debug_println!("No pages left in the queue");
            self.finish(TerminationReason::QueueExhausted)?;
            return Ok(self.state.phase);
        };
        self.state.phase = WalkerState::Traversing;

        debug_println!("Navigating to {}...", url);
        self.source.navigate(&url)?;
        debug_println!("Acquiring book and chapter...");
        let title = match parse_title_block(&self.source.read_title_block()?)? {
            TitleBlock::Strip(title) => title,
            TitleBlock::EndOfSequence => {
                info_println!("Reached a page outside the comic at {}", url);
                self.finish(TerminationReason::EndOfSequence)?;
                return Ok(self.state.phase);
            }
        };
        debug_println!(
            "{}: Chapter {}, page {}",
            title.book_title,
            title.chapter_title,
            self.state.current_page_in_chapter
        );

        let new_chapter = self.state.starts_new_chapter(&title);
        let new_book = self.state.starts_new_book(&title);

        if new_chapter || new_book {
            self.close_chapter();
        }
        if new_book {
            self.close_book()?;
            let started = self.assembler.start_book(title.book_number, &title.book_title);
            if started == BookStart::Suppressed {
                self.finish(TerminationReason::SingleBookComplete)?;
                return Ok(self.state.phase);
            }
            self.accumulator.open_book(&title.book_title);
        }

        if self.state.current_page_in_chapter == 1 {
            if self.state.current_chapter_index == 1 {
                self.reporter
                    .begin_book(title.book_number, &title.book_title)
                    .map_err(ScrapeError::Terminal)?;
            }
            self.reporter
                .begin_chapter(self.state.current_chapter_index, &title.chapter_title)
                .map_err(ScrapeError::Terminal)?;
            self.accumulator
                .open_chapter(&title.chapter_title, self.state.current_chapter_index);
        }

        let page = PageMetadata {
            title,
            image_sources: self.source.read_image_sources()?,
            footnote_html: self.source.read_footnote_html()?,
            next_page_url: self.source.read_next_page_url()?,
        };
        debug_println!(
            "      Writing page {} of Book {}: {}",
            self.state.current_page_in_book,
            page.book_number(),
            page.book_title()
        );
        let images = self.accumulator.add_page(
            &page,
            self.state.current_page_in_book,
            &self.fetcher,
            &mut self.assembler,
        )?;
        info_println!("      Wrote page {} to book.", self.state.current_page_in_book);

        match page.next_page_url {
            Some(next) if next != url => self.state.visit_queue.push_back(next),
            Some(_) => debug_println!("Next link points back at {}, stopping", url),
            None => debug_println!("No next link on {}", url),
        }

        self.state.previous_book = Some((page.title.book_number, page.title.book_title));
        self.state.previous_chapter = Some(page.title.chapter_title);
        self.state.current_page_in_book += 1;
        self.state.current_page_in_chapter += 1;
        self.state.pages_visited += 1;
        self.state.images_fetched += images;
        Ok(self.state.phase)
    }

    fn close_chapter(&mut self) {
        if self.accumulator.is_empty() {
            return;
        }
        self.assembler.close_chapter(self.accumulator.take());
        self.state.current_chapter_index += 1;
        self.state.current_page_in_chapter = 1;
    }

    fn close_book(&mut self) -> Result<()> {
        if let Some(path) = self.assembler.close_book()? {
            self.reporter
                .book_saved(&path)
                .map_err(ScrapeError::Terminal)?;
        }
        self.state.current_chapter_index = 1;
        self.state.current_page_in_book = 1;
        self.state.current_page_in_chapter = 1;
        Ok(())
    }

    /// Close whatever is open and stop.
    fn finish(&mut self, reason: TerminationReason) -> Result<()> {
        self.close_chapter();
        self.close_book()?;
        self.state.visit_queue.clear();
        self.state.phase = WalkerState::Terminated;
        self.state.termination = Some(reason);
        Ok(())
    }
}
