//! Scripted collaborators for driving `PageWalker` without a network.

#![allow(dead_code)]

use schlockbook::book::PackagedBook;
use schlockbook::walker::{BookSink, ImageFetcher, PageSource};
use schlockbook::{Result, ScrapeError, WalkOptions};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FakePage {
    pub title: String,
    pub images: Vec<String>,
    pub footnote: Option<String>,
    pub next: Option<String>,
}

#[derive(Debug, Default)]
pub struct ScriptedSource {
    pages: HashMap<String, FakePage>,
    current: Option<String>,
    pub visited: Vec<String>,
}

impl ScriptedSource {
    fn page(&self) -> Result<&FakePage> {
        let url = self
            .current
            .as_ref()
            .ok_or_else(|| ScrapeError::fetch("<none>", "no page loaded"))?;
        Ok(&self.pages[url])
    }
}

impl PageSource for ScriptedSource {
    fn navigate(&mut self, url: &str) -> Result<()> {
        if !self.pages.contains_key(url) {
            return Err(ScrapeError::fetch(url, "404 Not Found"));
        }
        self.visited.push(url.to_string());
        self.current = Some(url.to_string());
        Ok(())
    }

    fn read_title_block(&self) -> Result<String> {
        Ok(self.page()?.title.clone())
    }

    fn read_image_sources(&self) -> Result<Vec<String>> {
        Ok(self.page()?.images.clone())
    }

    fn read_footnote_html(&self) -> Result<Option<String>> {
        Ok(self.page()?.footnote.clone())
    }

    fn read_next_page_url(&self) -> Result<Option<String>> {
        Ok(self.page()?.next.clone())
    }
}

/// Returns a JPEG-looking payload tagged with the URL; fails for one URL if asked.
#[derive(Debug, Default)]
pub struct RecordingFetcher {
    pub requested: RefCell<Vec<String>>,
    pub fail_on: Option<String>,
}

impl ImageFetcher for RecordingFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.requested.borrow_mut().push(url.to_string());
        if self.fail_on.as_deref() == Some(url) {
            return Err(ScrapeError::fetch(url, "connection reset"));
        }
        let mut bytes = b"\xFF\xD8\xFF\xE0".to_vec();
        bytes.extend_from_slice(url.as_bytes());
        Ok(bytes)
    }
}

#[derive(Debug, Default)]
pub struct MemorySink {
    pub books: Vec<PackagedBook>,
}

impl BookSink for MemorySink {
    fn persist(&mut self, book: &PackagedBook) -> Result<PathBuf> {
        self.books.push(book.clone());
        Ok(PathBuf::from(book.file_name()))
    }
}

/// A linear comic: page `page-N` links to `page-(N+1)`, the last page has no
/// next link. Each entry is a title block and its image count.
pub fn linear_comic(pages: &[(String, usize)]) -> ScriptedSource {
    let mut source = ScriptedSource::default();
    for (index, (title, images)) in pages.iter().enumerate() {
        let n = index + 1;
        let next = (n < pages.len()).then(|| format!("page-{}", n + 1));
        source.pages.insert(
            format!("page-{n}"),
            FakePage {
                title: title.clone(),
                images: (1..=*images).map(|i| format!("img-{n}-{i}.jpg")).collect(),
                footnote: None,
                next,
            },
        );
    }
    source
}

impl ScriptedSource {
    pub fn page_mut(&mut self, url: &str) -> &mut FakePage {
        self.pages.get_mut(url).expect("scripted page")
    }
}

pub fn options(single_book: bool) -> WalkOptions {
    WalkOptions {
        start_url: "page-1".to_string(),
        single_book,
        show_progress: false,
        ..WalkOptions::default()
    }
}

pub fn title(book: u32, book_title: &str, chapter: &str) -> String {
    format!("Book {book}: {book_title} \u{2014} {chapter}")
}
