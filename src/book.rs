use crate::chapter::{ChapterBuffer, ImageRegistry};
use crate::error::Result;
use crate::models::ImageId;
use crate::walker::BookSink;
use crate::{debug_println, info_println};
use std::path::PathBuf;

/// Prefix of every book's package identifier.
pub const IDENTIFIER_PREFIX: &str = "schlock";

/// A closed chapter, ready to become one content document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterDocument {
    pub title: String,
    pub index: u32,
    pub file_name: String,
    pub body: String,
    pub pages: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResource {
    pub id: ImageId,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct BookInProgress {
    pub book_number: u32,
    pub book_title: String,
    pub chapters: Vec<ChapterDocument>,
    pub images: Vec<ImageResource>,
    pub total_page_count: u32,
}

/// A finished book handed to the persistence collaborator. Chapter order is
/// both the table of contents and the reading order.
#[derive(Debug, Clone)]
pub struct PackagedBook {
    pub identifier: String,
    pub number: u32,
    pub title: String,
    pub author: String,
    pub language: String,
    pub chapters: Vec<ChapterDocument>,
    pub images: Vec<ImageResource>,
}

impl PackagedBook {
    /// `NN. Title.epub`; path separators in the title become dashes.
    pub fn file_name(&self) -> String {
        format!("{:02}. {}.epub", self.number, self.title.replace(['/', '\\'], "-"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookStart {
    Started,
    /// Single-book run already produced its book.
    Suppressed,
}

/// Owns the book being assembled and persists it when it closes.
pub struct BookAssembler<S: BookSink> {
    sink: S,
    author: String,
    language: String,
    single_book: bool,
    current: Option<BookInProgress>,
    books_started: usize,
    written: Vec<PathBuf>,
}

impl<S: BookSink> BookAssembler<S> {
    pub fn new(
        sink: S,
        author: impl Into<String>,
        language: impl Into<String>,
        single_book: bool,
    ) -> Self {
        Self {
            sink,
            author: author.into(),
            language: language.into(),
            single_book,
            current: None,
            books_started: 0,
            written: Vec::new(),
        }
    }

    pub fn has_open_book(&self) -> bool {
        self.current.is_some()
    }

    pub fn books_started(&self) -> usize {
        self.books_started
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Whether a new book may begin; false once a single-book run has one.
    fn accepts_new_book(&self) -> bool {
        !(self.single_book && self.books_started > 0)
    }

    /// Begin a new book, discarding anything unfinished.
    pub fn start_book(&mut self, book_number: u32, book_title: &str) -> BookStart {
        if !self.accepts_new_book() {
            debug_println!("Single-book run: not starting Book {}", book_number);
            return BookStart::Suppressed;
        }
        if let Some(stale) = self.current.take() {
            debug_println!(
                "Discarding unfinished Book {}: {}",
                stale.book_number,
                stale.book_title
            );
        }
        self.current = Some(BookInProgress {
            book_number,
            book_title: book_title.to_string(),
            ..BookInProgress::default()
        });
        self.books_started += 1;
        BookStart::Started
    }

    /// Append a finished chapter to the current book. Empty buffers and
    /// chapters arriving with no open book are ignored.
    pub fn close_chapter(&mut self, chapter: ChapterBuffer) {
        if chapter.is_empty() {
            return;
        }
        let Some(book) = self.current.as_mut() else {
            debug_println!("No open book for chapter '{}', dropping it", chapter.chapter_title);
            return;
        };
        let pages = chapter.pages();
        info_println!(
            "   Finished Chapter {} of Book {}, with {} pages.",
            chapter.chapter_index_in_book,
            book.book_number,
            pages
        );
        book.total_page_count += pages;
        book.chapters.push(ChapterDocument {
            file_name: format!("chapter-{:02}.xhtml", chapter.chapter_index_in_book),
            title: chapter.chapter_title,
            index: chapter.chapter_index_in_book,
            pages,
            body: chapter.markup,
        });
    }

    /// Finalize and persist the current book. Returns the written path, or
    /// `None` when no book was open.
    pub fn close_book(&mut self) -> Result<Option<PathBuf>> {
        let Some(book) = self.current.take() else {
            return Ok(None);
        };
        info_println!(
            "Finished Book {}, with {} pages.",
            book.book_number,
            book.total_page_count
        );

        let packaged = PackagedBook {
            identifier: format!("{}{:02}", IDENTIFIER_PREFIX, book.book_number),
            number: book.book_number,
            title: book.book_title,
            author: self.author.clone(),
            language: self.language.clone(),
            chapters: book.chapters,
            images: book.images,
        };
        info_println!("Saving Book {}, {}...", packaged.number, packaged.title);
        let path = self.sink.persist(&packaged)?;
        self.written.push(path.clone());
        Ok(Some(path))
    }
}

impl<S: BookSink> ImageRegistry for BookAssembler<S> {
    fn register_image(&mut self, id: ImageId, bytes: Vec<u8>) {
        match self.current.as_mut() {
            Some(book) => book.images.push(ImageResource { id, bytes }),
            None => debug_println!("No open book for image {}, dropping it", id),
        }
    }
}
