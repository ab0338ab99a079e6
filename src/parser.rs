use crate::error::{Result, ScrapeError};
use crate::models::{StripTitle, TitleBlock};

/// Separator between the book title and the chapter title.
pub const CHAPTER_SEPARATOR: &str = " \u{2014} ";

/// Parse a strip's title block, formatted as `Book N: Book Title — Chapter`.
///
/// A block that does not mention "Book" at all belongs to the extras posted
/// after the comic ended and yields [`TitleBlock::EndOfSequence`]. A block that
/// does mention it but breaks the layout is an error.
pub fn parse_title_block(text: &str) -> Result<TitleBlock> {
    let text = text.trim();
    if !text.contains("Book") {
        return Ok(TitleBlock::EndOfSequence);
    }

    let (head, rest) = text
        .split_once(": ")
        .ok_or_else(|| ScrapeError::metadata(text, "no ': ' after the book number"))?;

    let book_number = extract_book_number(head)
        .ok_or_else(|| ScrapeError::metadata(text, "no positive book number before ': '"))?;

    let (book_title, chapter_title) = rest
        .split_once(CHAPTER_SEPARATOR)
        .ok_or_else(|| ScrapeError::metadata(text, "no em-dash between book and chapter title"))?;

    let book_title = filesystem_safe(book_title);
    let chapter_title = filesystem_safe(chapter_title);
    if book_title.is_empty() {
        return Err(ScrapeError::metadata(text, "empty book title"));
    }
    if chapter_title.is_empty() {
        return Err(ScrapeError::metadata(text, "empty chapter title"));
    }

    Ok(TitleBlock::Strip(StripTitle {
        book_number,
        book_title,
        chapter_title,
    }))
}

/// All digits before the first colon, joined.
fn extract_book_number(head: &str) -> Option<u32> {
    let digits: String = head.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n),
    }
}

fn filesystem_safe(title: &str) -> String {
    title.replace(": ", " - ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(text: &str) -> StripTitle {
        match parse_title_block(text).unwrap() {
            TitleBlock::Strip(title) => title,
            TitleBlock::EndOfSequence => panic!("expected a strip for {text:?}"),
        }
    }

    #[test]
    fn parses_book_and_chapter() {
        let title = strip("Book 5: Blood and Metal \u{2014} Worlds Enough and Time");
        assert_eq!(title.book_number, 5);
        assert_eq!(title.book_title, "Blood and Metal");
        assert_eq!(title.chapter_title, "Worlds Enough and Time");
    }

    #[test]
    fn round_trips_titles() {
        let cases = [
            (1, "The Tub of Happiness", "The Tub"),
            (12, "Force Multiplication", "Overture"),
            (20, "The Longshoreman of the Apocalypse", "Part 1 of 2"),
        ];
        for (number, book, chapter) in cases {
            let text = format!("Book {number}: {book}{CHAPTER_SEPARATOR}{chapter}");
            assert_eq!(
                strip(&text),
                StripTitle {
                    book_number: number,
                    book_title: book.to_string(),
                    chapter_title: chapter.to_string(),
                }
            );
        }
    }

    #[test]
    fn replaces_inner_colons() {
        let title = strip("Book 3: The Teraport Wars: Redux \u{2014} Act: One");
        assert_eq!(title.book_number, 3);
        assert_eq!(title.book_title, "The Teraport Wars - Redux");
        assert_eq!(title.chapter_title, "Act - One");
    }

    #[test]
    fn keeps_later_separators_in_chapter() {
        let title = strip("Book 7: A \u{2014} B \u{2014} C");
        assert_eq!(title.book_title, "A");
        assert_eq!(title.chapter_title, "B \u{2014} C");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let title = strip("  Book 2: The Blackness Between \u{2014} Chapter Two \n");
        assert_eq!(title.book_number, 2);
        assert_eq!(title.chapter_title, "Chapter Two");
    }

    #[test]
    fn page_without_book_ends_sequence() {
        assert_eq!(
            parse_title_block("Bonus Story: Extras").unwrap(),
            TitleBlock::EndOfSequence
        );
        assert_eq!(parse_title_block("").unwrap(), TitleBlock::EndOfSequence);
    }

    #[test]
    fn malformed_blocks_are_errors() {
        for text in [
            "Book 5 Blood and Metal \u{2014} Worlds",
            "Book: Blood and Metal \u{2014} Worlds",
            "Book 5: Blood and Metal - Worlds",
            "Book 0: Blood and Metal \u{2014} Worlds",
            "Book 5:  \u{2014} Worlds",
        ] {
            let err = parse_title_block(text).unwrap_err();
            assert!(
                matches!(err, ScrapeError::MetadataParse { .. }),
                "unexpected error for {text:?}: {err}"
            );
        }
    }
}
