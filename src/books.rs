use crate::error::{Result, ScrapeError};

/// First strip of the comic.
pub const FIRST_PAGE_URL: &str = "https://www.schlockmercenary.com/2000-06-12";

/// First strip of each book, indexed by book number - 1.
pub const BOOK_START_URLS: [&str; 20] = [
    "https://www.schlockmercenary.com/2000-06-12",
    "https://www.schlockmercenary.com/2001-11-11",
    "https://www.schlockmercenary.com/2003-03-09",
    "https://www.schlockmercenary.com/2003-08-24",
    "https://www.schlockmercenary.com/2004-03-15",
    "https://www.schlockmercenary.com/2004-09-12",
    "https://www.schlockmercenary.com/2005-07-24",
    "https://www.schlockmercenary.com/2006-08-17",
    "https://www.schlockmercenary.com/2007-05-20",
    "https://www.schlockmercenary.com/2008-02-29",
    "https://www.schlockmercenary.com/2009-03-02",
    "https://www.schlockmercenary.com/2010-11-29",
    "https://www.schlockmercenary.com/2011-11-13",
    "https://www.schlockmercenary.com/2013-01-01",
    "https://www.schlockmercenary.com/2014-03-16",
    "https://www.schlockmercenary.com/2015-03-30",
    "https://www.schlockmercenary.com/2016-12-05",
    "https://www.schlockmercenary.com/2017-09-18",
    "https://www.schlockmercenary.com/2018-07-25",
    "https://www.schlockmercenary.com/2019-06-16",
];

/// Start URL for the `-b` argument, which must be a book number in 1..=20.
pub fn start_url_for_book(arg: &str) -> Result<&'static str> {
    let usage = || ScrapeError::Usage {
        given: arg.to_string(),
        max: BOOK_START_URLS.len(),
    };
    let book: usize = arg.trim().parse().map_err(|_| usage())?;
    if book == 0 {
        return Err(usage());
    }
    BOOK_START_URLS.get(book - 1).copied().ok_or_else(usage)
}
