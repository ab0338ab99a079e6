use ::scraper::node::Node;
use ::scraper::{ElementRef, Html};
use once_cell::sync::Lazy;
use regex::Regex;

/// Numeric references that read better as plain ASCII, applied in order.
const TYPOGRAPHIC_REPLACEMENTS: &[(&str, &str)] = &[
    ("&#180;", "'"),
    ("&#8216;", "'"),
    ("&#8217;", "'"),
    ("&#8220;", "\""),
    ("&#8221;", "\""),
    ("&#8222;", "\""),
    ("&#8230;", "..."),
];

static DASH_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").unwrap());

/// Make extracted text safe for ASCII-only targets.
///
/// Non-ASCII code points become numeric character references, common
/// typographic quotes and the ellipsis are folded back to ASCII, and runs of
/// hyphens collapse to one. Running it twice gives the same result as once.
pub fn clean_text(text: &str) -> String {
    let mut cleaned = encode_ascii_with_char_refs(text);
    for (from, to) in TYPOGRAPHIC_REPLACEMENTS {
        cleaned = cleaned.replace(from, to);
    }
    DASH_RUN.replace_all(&cleaned, "-").into_owned()
}

fn encode_ascii_with_char_refs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            out.push_str(&format!("&#{};", c as u32));
        }
    }
    out
}

/// Elements written self-closed in XHTML.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements dropped from fragments along with their content.
const DROPPED_ELEMENTS: &[&str] = &["script", "style"];

/// Rebuild an HTML fragment as well-formed XHTML with [`clean_text`] applied
/// to its text nodes only.
///
/// Comments are dropped, void elements are self-closed and attribute values
/// are escaped but otherwise kept as-is.
pub fn clean_fragment(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    write_children(fragment.root_element(), &mut out);
    out.trim().to_string()
}

fn write_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&clean_text(&escape_text(text))),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    write_element(child, out);
                }
            }
            _ => {}
        }
    }
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if DROPPED_ELEMENTS.contains(&name) {
        return;
    }
    out.push('<');
    out.push_str(name);
    let mut attrs: Vec<(&str, &str)> = element.value().attrs().collect();
    attrs.sort_by(|a, b| a.0.cmp(b.0));
    for (attr, value) in attrs {
        out.push_str(&format!(" {}=\"{}\"", attr, escape_xml(value)));
    }
    if VOID_ELEMENTS.contains(&name) {
        out.push_str(" />");
        return;
    }
    out.push('>');
    write_children(element, out);
    out.push_str(&format!("</{}>", name));
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape text for interpolation into XHTML content or attributes.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
