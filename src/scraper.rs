use crate::error::{Result, ScrapeError};
use crate::walker::{ImageFetcher, PageSource};
use crate::{debug_eprintln, debug_println};
use ::scraper::{Html, Selector};
use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use reqwest::Url;

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".strip-book").unwrap());
static IMAGE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".strip-image-wrapper img").unwrap());
static FOOTNOTE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".strip-footnote").unwrap());
static NEXT_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(".next-strip").unwrap());

struct CurrentPage {
    url: Url,
    document: Html,
}

/// Page session over plain HTTP: each navigation downloads the page and
/// keeps its parsed document until the next one.
pub struct HttpPageSource {
    client: Client,
    current: Option<CurrentPage>,
}

impl HttpPageSource {
    pub fn new(user_agent: &str) -> Result<Self> {
        debug_println!("Opening page session...");
        let client = Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .build()
            .map_err(|e| ScrapeError::fetch("<session>", e))?;
        Ok(Self::from_client(client))
    }

    /// Session over an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            current: None,
        }
    }

    /// Image fetcher sharing this session's connection pool and cookies.
    pub fn image_fetcher(&self) -> HttpImageFetcher {
        HttpImageFetcher {
            client: self.client.clone(),
        }
    }

    /// Use already-downloaded HTML as the current page.
    pub fn load_html(&mut self, url: &str, html: &str) -> Result<()> {
        let url = Url::parse(url).map_err(|e| ScrapeError::fetch(url, e))?;
        self.current = Some(CurrentPage {
            url,
            document: Html::parse_document(html),
        });
        Ok(())
    }

    fn page(&self) -> Result<&CurrentPage> {
        self.current.as_ref().ok_or_else(|| ScrapeError::MissingElement {
            url: "<none>".to_string(),
            what: "a loaded page (navigate first)".to_string(),
        })
    }

    fn resolve(page: &CurrentPage, href: &str) -> Result<String> {
        page.url
            .join(href.trim())
            .map(String::from)
            .map_err(|e| ScrapeError::fetch(href, e))
    }
}

impl PageSource for HttpPageSource {
    fn navigate(&mut self, url: &str) -> Result<()> {
        if self.current.as_ref().map(|p| p.url.as_str()) == Some(url) {
            return Ok(());
        }
        let body = self
            .client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|e| ScrapeError::fetch(url, e))?;
        debug_println!("Arrived at page {}", url);
        self.load_html(url, &body)
    }

    fn read_title_block(&self) -> Result<String> {
        let page = self.page()?;
        let element = page
            .document
            .select(&TITLE_SELECTOR)
            .next()
            .ok_or_else(|| ScrapeError::MissingElement {
                url: page.url.to_string(),
                what: "the .strip-book title block".to_string(),
            })?;
        let text: String = element.text().collect();
        Ok(text.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    fn read_image_sources(&self) -> Result<Vec<String>> {
        let page = self.page()?;
        let mut sources = Vec::new();
        for img in page.document.select(&IMAGE_SELECTOR) {
            match img.value().attr("src").or_else(|| img.value().attr("data-src")) {
                Some(src) => sources.push(Self::resolve(page, src)?),
                None => debug_eprintln!("Strip image without src on {}", page.url),
            }
        }
        Ok(sources)
    }

    fn read_footnote_html(&self) -> Result<Option<String>> {
        let page = self.page()?;
        Ok(page
            .document
            .select(&FOOTNOTE_SELECTOR)
            .next()
            .map(|element| element.inner_html().trim().to_string())
            .filter(|html| !html.is_empty()))
    }

    fn read_next_page_url(&self) -> Result<Option<String>> {
        let page = self.page()?;
        match page
            .document
            .select(&NEXT_SELECTOR)
            .next()
            .and_then(|element| element.value().attr("href"))
        {
            Some(href) => Ok(Some(Self::resolve(page, href)?)),
            None => Ok(None),
        }
    }
}

impl Drop for HttpPageSource {
    fn drop(&mut self) {
        debug_println!("Closing page session.");
    }
}

/// Blocking image download over a shared client.
#[derive(Clone)]
pub struct HttpImageFetcher {
    client: Client,
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let bytes = self
            .client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.bytes())
            .map_err(|e| ScrapeError::fetch(url, e))?;
        Ok(bytes.to_vec())
    }
}
