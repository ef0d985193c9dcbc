use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

use crate::error::{ExtractionError, Result};

static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(<h1.*/h1>)").expect("valid regex"));

// Strips tags and decodes entities of an HTML fragment
pub fn strip_html(fragment: &str) -> String {
    let fragment = fragment.replace('\n', " ");
    let parsed = Html::parse_fragment(&fragment);
    parsed.root_element().text().collect::<String>().trim().to_string()
}

// Page title: the first <h1> fragment on a single line, without markup
pub fn page_heading(page: &str) -> Result<String> {
    let tag = HEADING
        .captures(page)
        .and_then(|cap| cap.get(1))
        .ok_or(ExtractionError::MissingHeading)?;

    Ok(strip_html(tag.as_str()))
}

// Reverses the &amp; escaping of hrefs copied out of raw markup
pub fn unescape_href(href: &str) -> String {
    href.replace("&amp;", "&")
}
