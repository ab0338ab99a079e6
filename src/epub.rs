//! EPUB 3 packaging for finished books.
//!
//! A book is written to `<output_dir>/.<name>.part` and renamed into place
//! once the archive is complete, so an interrupted run never leaves a
//! truncated `.epub` behind.

use crate::book::{ChapterDocument, PackagedBook};
use crate::debug_println;
use crate::error::{Result, ScrapeError};
use crate::sanitize::escape_xml;
use crate::walker::BookSink;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

/// Writes each packaged book as an `.epub` file in one directory.
#[derive(Debug, Clone)]
pub struct EpubWriter {
    output_dir: PathBuf,
}

impl EpubWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn write_archive(&self, book: &PackagedBook, path: &Path) -> Result<()> {
        let io_err = |source: std::io::Error| ScrapeError::Persistence {
            path: path.to_path_buf(),
            source,
        };
        let zip_err = |source: zip::result::ZipError| ScrapeError::Packaging {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(io_err)?;
        let mut zip = ZipWriter::new(file);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        // The mimetype entry must come first and be uncompressed.
        let mut entries: Vec<(String, Vec<u8>, SimpleFileOptions)> = vec![
            ("mimetype".to_string(), b"application/epub+zip".to_vec(), stored),
            ("META-INF/container.xml".to_string(), CONTAINER_XML.as_bytes().to_vec(), deflated),
            ("OEBPS/content.opf".to_string(), package_document(book).into_bytes(), deflated),
            ("OEBPS/toc.ncx".to_string(), ncx_document(book).into_bytes(), deflated),
            ("OEBPS/nav.xhtml".to_string(), nav_document(book).into_bytes(), deflated),
        ];
        for chapter in &book.chapters {
            entries.push((
                format!("OEBPS/{}", chapter.file_name),
                chapter_document(chapter, &book.language).into_bytes(),
                deflated,
            ));
        }

        for (name, bytes, options) in entries {
            zip.start_file(name, options).map_err(zip_err)?;
            zip.write_all(&bytes).map_err(io_err)?;
        }
        for image in &book.images {
            zip.start_file(format!("OEBPS/{}", image.id.file_name()), stored)
                .map_err(zip_err)?;
            zip.write_all(&image.bytes).map_err(io_err)?;
        }

        let mut file = zip.finish().map_err(zip_err)?;
        file.flush().map_err(io_err)?;
        Ok(())
    }
}

impl BookSink for EpubWriter {
    fn persist(&mut self, book: &PackagedBook) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).map_err(|source| ScrapeError::Persistence {
            path: self.output_dir.clone(),
            source,
        })?;

        let file_name = book.file_name();
        let path = self.output_dir.join(&file_name);
        let partial = self.output_dir.join(format!(".{}.part", file_name));

        if let Err(e) = self.write_archive(book, &partial) {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        fs::rename(&partial, &path).map_err(|source| ScrapeError::Persistence {
            path: path.clone(),
            source,
        })?;

        debug_println!(
            "Wrote {} ({} chapters, {} images)",
            path.display(),
            book.chapters.len(),
            book.images.len()
        );
        Ok(path)
    }
}

/// Media type from the leading magic bytes; strips are JPEG unless they say otherwise.
pub fn image_media_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/jpeg"
    }
}

fn chapter_id(chapter: &ChapterDocument) -> String {
    chapter
        .file_name
        .trim_end_matches(".xhtml")
        .to_string()
}

fn package_document(book: &PackagedBook) -> String {
    let modified = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");

    let mut manifest = String::new();
    manifest.push_str(
        "    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n",
    );
    manifest.push_str(concat!(
        "    <item id=\"nav\" href=\"nav.xhtml\" media-type=\"application/xhtml+xml\"",
        " properties=\"nav\"/>\n"
    ));
    for chapter in &book.chapters {
        manifest.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"application/xhtml+xml\"/>\n",
            chapter_id(chapter),
            chapter.file_name
        ));
    }
    for image in &book.images {
        manifest.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"/>\n",
            image.id.manifest_id(),
            image.id.file_name(),
            image_media_type(&image.bytes)
        ));
    }

    let mut spine = String::from("    <itemref idref=\"nav\"/>\n");
    for chapter in &book.chapters {
        spine.push_str(&format!("    <itemref idref=\"{}\"/>\n", chapter_id(chapter)));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="id" xml:lang="{lang}">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="id">{identifier}</dc:identifier>
    <dc:title>{title}</dc:title>
    <dc:language>{lang}</dc:language>
    <dc:creator id="creator">{author}</dc:creator>
    <meta property="dcterms:modified">{modified}</meta>
  </metadata>
  <manifest>
{manifest}  </manifest>
  <spine toc="ncx">
{spine}  </spine>
</package>
"#,
        lang = escape_xml(&book.language),
        identifier = escape_xml(&book.identifier),
        title = escape_xml(&book.title),
        author = escape_xml(&book.author),
    )
}

fn ncx_document(book: &PackagedBook) -> String {
    let mut nav_points = String::new();
    for (order, chapter) in book.chapters.iter().enumerate() {
        nav_points.push_str(&format!(
            r#"    <navPoint id="np-{id}" playOrder="{order}">
      <navLabel><text>{title}</text></navLabel>
      <content src="{href}"/>
    </navPoint>
"#,
            id = chapter_id(chapter),
            order = order + 1,
            title = escape_xml(&chapter.title),
            href = chapter.file_name,
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{identifier}"/>
    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle><text>{title}</text></docTitle>
  <navMap>
{nav_points}  </navMap>
</ncx>
"#,
        identifier = escape_xml(&book.identifier),
        title = escape_xml(&book.title),
    )
}

fn nav_document(book: &PackagedBook) -> String {
    let mut items = String::new();
    for chapter in &book.chapters {
        items.push_str(&format!(
            "      <li><a href=\"{}\">{}</a></li>\n",
            chapter.file_name,
            escape_xml(&chapter.title)
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{lang}" xml:lang="{lang}">
<head>
  <title>{title}</title>
</head>
<body>
  <nav epub:type="toc" id="toc">
    <h1>{title}</h1>
    <ol>
{items}    </ol>
  </nav>
</body>
</html>
"#,
        lang = escape_xml(&book.language),
        title = escape_xml(&book.title),
    )
}

fn chapter_document(chapter: &ChapterDocument, language: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{lang}" xml:lang="{lang}">
<head>
  <title>{title}</title>
</head>
<body>
{body}
</body>
</html>
"#,
        lang = escape_xml(language),
        title = escape_xml(&chapter.title),
        body = chapter.body,
    )
}
