use std::fmt;

/// Book and chapter a strip belongs to, as read from its title block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripTitle {
    pub book_number: u32,
    pub book_title: String,
    pub chapter_title: String,
}

/// Outcome of reading a page's title block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleBlock {
    Strip(StripTitle),
    /// The page is a post-comic extra; the main sequence is over.
    EndOfSequence,
}

/// Everything the walker needs from one visited page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: StripTitle,
    pub image_sources: Vec<String>,
    pub footnote_html: Option<String>,
    pub next_page_url: Option<String>,
}

impl PageMetadata {
    pub fn book_number(&self) -> u32 {
        self.title.book_number
    }

    pub fn book_title(&self) -> &str {
        &self.title.book_title
    }

    pub fn chapter_title(&self) -> &str {
        &self.title.chapter_title
    }
}

/// Deterministic identifier of one strip image inside a book,
/// rendered as `BB-CC-PPPP-II`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId {
    pub book: u32,
    pub chapter: u32,
    pub page: u32,
    pub image: u32,
}

impl ImageId {
    pub fn new(book: u32, chapter: u32, page: u32, image: u32) -> Self {
        Self {
            book,
            chapter,
            page,
            image,
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.jpg", self)
    }

    /// Manifest id; XML ids may not start with a digit.
    pub fn manifest_id(&self) -> String {
        format!("img-{}", self)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}-{:02}-{:04}-{:02}",
            self.book, self.chapter, self.page, self.image
        )
    }
}
