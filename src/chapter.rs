use crate::debug_println;
use crate::error::Result;
use crate::models::{ImageId, PageMetadata};
use crate::sanitize::{clean_fragment, escape_xml};
use crate::walker::ImageFetcher;

/// Receives fetched image bytes under their deterministic identifier.
pub trait ImageRegistry {
    fn register_image(&mut self, id: ImageId, bytes: Vec<u8>);
}

/// Markup of the chapter currently being built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterBuffer {
    pub chapter_title: String,
    pub chapter_index_in_book: u32,
    pub markup: String,
    /// Number of the next page to be added; starts at 1.
    pub page_count_in_chapter: u32,
}

impl ChapterBuffer {
    pub fn is_empty(&self) -> bool {
        self.markup.is_empty()
    }

    /// Pages already added to this chapter.
    pub fn pages(&self) -> u32 {
        self.page_count_in_chapter.saturating_sub(1)
    }
}

/// Builds one chapter at a time from the pages handed to it.
#[derive(Debug)]
pub struct ChapterAccumulator {
    author: String,
    buffer: ChapterBuffer,
}

impl ChapterAccumulator {
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            buffer: ChapterBuffer {
                page_count_in_chapter: 1,
                ..ChapterBuffer::default()
            },
        }
    }

    pub fn buffer(&self) -> &ChapterBuffer {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Title page for a new book; precedes the first chapter's title block.
    pub fn open_book(&mut self, book_title: &str) {
        self.buffer.markup.push_str(&format!(
            r#"
<div style="display: block; margin: auto; box-shadow: 5px 5px 10px black;">
    <h1>{}</h1>
    <h2><i>by {}</i></h2>
</div>

<div class="pagebreak" style="page-break-after: always"></div>
"#,
            escape_xml(book_title),
            escape_xml(&self.author)
        ));
    }

    pub fn open_chapter(&mut self, chapter_title: &str, chapter_index: u32) {
        self.buffer.chapter_title = chapter_title.to_string();
        self.buffer.chapter_index_in_book = chapter_index;
        self.buffer.markup.push_str(&format!(
            r#"
<div style="display: block; margin: auto;">
    <h3 style="text-align: center">{}</h3>
</div>

<div class="pagebreak" style="page-break-after: always"></div>
"#,
            escape_xml(chapter_title)
        ));
    }

    /// Append one strip: page marker, its images in order, then the footnote
    /// rebuilt by [`clean_fragment`].
    ///
    /// Every image is fetched and handed to `registry` before the next one is
    /// requested. Fetch failures abort the page. Returns the number of images.
    pub fn add_page<F, R>(
        &mut self,
        page: &PageMetadata,
        page_in_book: u32,
        fetcher: &F,
        registry: &mut R,
    ) -> Result<usize>
    where
        F: ImageFetcher + ?Sized,
        R: ImageRegistry + ?Sized,
    {
        let page_in_chapter = self.buffer.page_count_in_chapter;
        let mut markup = format!(
            "\n<div style=\"text-align: center\">\n    <p>{}: Page {}</p>\n",
            escape_xml(page.chapter_title()),
            page_in_chapter
        );

        for (index, source) in page.image_sources.iter().enumerate() {
            let id = ImageId::new(
                page.book_number(),
                self.buffer.chapter_index_in_book,
                page_in_book,
                index as u32 + 1,
            );
            debug_println!("         Acquiring comic {}...", id);
            let bytes = fetcher.fetch(source)?;
            registry.register_image(id, bytes);
            markup.push_str(&format!(
                "    <img src=\"{}\" alt=\"{}\" style=\"max-width: 95vw\" />\n    <br />\n",
                id.file_name(),
                id
            ));
            debug_println!("            Wrote image {} to book.", index + 1);
        }
        markup.push_str("</div>\n");

        match &page.footnote_html {
            Some(footnote) => {
                debug_println!("         Found footnotes. Writing to book...");
                markup.push_str(&format!(
                    "\n<div class=\"footnote\">\n{}\n</div>\n",
                    clean_fragment(footnote)
                ));
            }
            None => debug_println!("         No footnotes found for page {}.", page_in_book),
        }

        self.buffer.markup.push_str(&markup);
        self.buffer.page_count_in_chapter += 1;
        Ok(page.image_sources.len())
    }

    /// Hand over the finished chapter and start an empty one.
    pub fn take(&mut self) -> ChapterBuffer {
        std::mem::replace(
            &mut self.buffer,
            ChapterBuffer {
                page_count_in_chapter: 1,
                ..ChapterBuffer::default()
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use crate::models::StripTitle;
    use std::cell::RefCell;

    struct CountingFetcher {
        requested: RefCell<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl CountingFetcher {
        fn new() -> Self {
            Self {
                requested: RefCell::new(Vec::new()),
                fail_on: None,
            }
        }
    }

    impl ImageFetcher for CountingFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.requested.borrow_mut().push(url.to_string());
            if self.fail_on == Some(url) {
                return Err(ScrapeError::fetch(url, "404 Not Found"));
            }
            Ok(url.as_bytes().to_vec())
        }
    }

    #[derive(Default)]
    struct Registry(Vec<(ImageId, Vec<u8>)>);

    impl ImageRegistry for Registry {
        fn register_image(&mut self, id: ImageId, bytes: Vec<u8>) {
            self.0.push((id, bytes));
        }
    }

    fn page(images: &[&str], footnote: Option<&str>) -> PageMetadata {
        PageMetadata {
            title: StripTitle {
                book_number: 2,
                book_title: "The Blackness Between".to_string(),
                chapter_title: "Fleet & Friends".to_string(),
            },
            image_sources: images.iter().map(|s| s.to_string()).collect(),
            footnote_html: footnote.map(str::to_string),
            next_page_url: None,
        }
    }

    #[test]
    fn registers_images_in_order_with_ids() {
        let mut acc = ChapterAccumulator::new("Howard Taylor");
        acc.open_chapter("Fleet & Friends", 3);
        let fetcher = CountingFetcher::new();
        let mut registry = Registry::default();

        let count = acc
            .add_page(&page(&["a.jpg", "b.jpg"], None), 15, &fetcher, &mut registry)
            .unwrap();

        assert_eq!(count, 2);
        let ids: Vec<String> = registry.0.iter().map(|(id, _)| id.to_string()).collect();
        assert_eq!(ids, ["02-03-0015-01", "02-03-0015-02"]);
        assert_eq!(registry.0[1].1, b"b.jpg");
        let markup = &acc.buffer().markup;
        let first = markup.find("02-03-0015-01.jpg").unwrap();
        let second = markup.find("02-03-0015-02.jpg").unwrap();
        assert!(first < second);
        assert!(markup.contains("Fleet &amp; Friends: Page 1"));
    }

    #[test]
    fn book_block_precedes_chapter_block() {
        let mut acc = ChapterAccumulator::new("Howard Taylor");
        acc.open_book("Under New Management");
        acc.open_chapter("Chapter One", 1);
        let markup = &acc.buffer().markup;
        let book = markup.find("<h1>Under New Management</h1>").unwrap();
        let chapter = markup.find("<h3 style=\"text-align: center\">Chapter One</h3>").unwrap();
        assert!(book < chapter);
        assert!(markup.contains("by Howard Taylor"));
    }

    #[test]
    fn footnote_is_sanitized_and_last() {
        let mut acc = ChapterAccumulator::new("Howard Taylor");
        acc.open_chapter("Fleet & Friends", 1);
        let fetcher = CountingFetcher::new();
        let mut registry = Registry::default();
        acc.add_page(
            &page(&["a.jpg"], Some("It\u{2019}s <b>fine</b> -- really")),
            1,
            &fetcher,
            &mut registry,
        )
        .unwrap();

        let markup = &acc.buffer().markup;
        assert!(markup.contains("It's <b>fine</b> - really"));
        assert!(markup.find("footnote").unwrap() > markup.find("02-01-0001-01.jpg").unwrap());
    }

    #[test]
    fn footnote_markup_stays_well_formed() {
        let mut acc = ChapterAccumulator::new("Howard Taylor");
        acc.open_chapter("Fleet & Friends", 1);
        let fetcher = CountingFetcher::new();
        let mut registry = Registry::default();
        let footnote = concat!(
            "<!-- wp:paragraph --><p>Hi -- there</p>",
            r#"<img src="a.png" alt="1 > 0"><a href="https://x.com/a--b">l</a>"#
        );
        acc.add_page(&page(&[], Some(footnote)), 1, &fetcher, &mut registry)
            .unwrap();

        let markup = &acc.buffer().markup;
        assert!(!markup.contains("<!-"));
        assert!(markup.contains(concat!(
            "<div class=\"footnote\">\n<p>Hi - there</p>",
            r#"<img alt="1 &gt; 0" src="a.png" /><a href="https://x.com/a--b">l</a>"#,
            "\n</div>"
        )));
    }

    #[test]
    fn pages_accumulate_in_visit_order() {
        let mut acc = ChapterAccumulator::new("Howard Taylor");
        acc.open_chapter("Fleet & Friends", 1);
        let fetcher = CountingFetcher::new();
        let mut registry = Registry::default();
        for n in 1..=4 {
            acc.add_page(&page(&["x.jpg"], None), n, &fetcher, &mut registry)
                .unwrap();
        }

        let chapter = acc.take();
        assert_eq!(chapter.pages(), 4);
        let positions: Vec<usize> = (1..=4)
            .map(|n| chapter.markup.find(&format!("Page {n}</p>")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(acc.is_empty());
        assert_eq!(acc.buffer().page_count_in_chapter, 1);
    }

    #[test]
    fn fetch_failure_propagates_and_leaves_buffer_untouched() {
        let mut acc = ChapterAccumulator::new("Howard Taylor");
        acc.open_chapter("Fleet & Friends", 1);
        let before = acc.buffer().clone();
        let fetcher = CountingFetcher {
            requested: RefCell::new(Vec::new()),
            fail_on: Some("b.jpg"),
        };
        let mut registry = Registry::default();

        let err = acc
            .add_page(&page(&["a.jpg", "b.jpg", "c.jpg"], None), 1, &fetcher, &mut registry)
            .unwrap_err();

        assert!(matches!(err, ScrapeError::Fetch { .. }));
        assert_eq!(*fetcher.requested.borrow(), ["a.jpg", "b.jpg"]);
        assert_eq!(acc.buffer(), &before);
    }
}
