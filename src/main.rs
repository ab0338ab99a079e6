use anyhow::{Context, Result};
use clap::Parser;
use schlockbook::books;
use schlockbook::debug::{self, Verbosity};
use schlockbook::epub::EpubWriter;
use schlockbook::scraper::HttpPageSource;
use schlockbook::{info_println, PageWalker, WalkOptions};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    about = "Schlockbook - Schlock Mercenary to EPUB, one file per book",
    disable_version_flag = true
)]
struct Args {
    /// Print basic progress information
    #[arg(short = 'v')]
    verbose: bool,

    /// Print detailed debugging information (supersedes -v)
    #[arg(short = 'V')]
    debug: bool,

    /// Download only book N (1-20)
    #[arg(short = 'b', value_name = "N", allow_hyphen_values = true)]
    book: Option<String>,

    /// Directory the .epub files are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Start the full walk from this strip instead of the first one
    #[arg(long, conflicts_with = "book")]
    start_url: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    debug::set_verbosity(Verbosity::from_flags(args.verbose, args.debug));

    let mut options = WalkOptions::default();
    if let Some(book) = args.book.as_deref() {
        match books::start_url_for_book(book) {
            Ok(url) => {
                options.start_url = url.to_string();
                options.single_book = true;
            }
            Err(e) => {
                println!("{}", e);
                return Ok(());
            }
        }
    } else if let Some(url) = args.start_url {
        options.start_url = url;
    }

    println!("Schlockbook - Schlock Mercenary to EPUB");
    println!("=======================================");
    info_println!("Starting at {}", options.start_url);

    let source = HttpPageSource::new(&options.user_agent)?;
    let fetcher = source.image_fetcher();
    let sink = EpubWriter::new(&args.output_dir);
    let mut walker = PageWalker::new(source, fetcher, sink, &options);
    let summary = walker
        .run()
        .with_context(|| format!("Scraping stopped after {} pages", walker.state().pages_visited))?;

    println!("\n=== Summary ===");
    println!("Pages visited: {}", summary.pages_visited);
    println!("Images fetched: {}", summary.images_fetched);
    for path in &summary.books_written {
        println!("Saved to: {}", path.display());
    }

    Ok(())
}
