//! Utility functions and helpers.

pub mod http;
pub mod time;

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use unicode_segmentation::UnicodeSegmentation;
use url::Url;

/// Maximum length, in graphemes, of a generated content snippet.
pub const SNIPPET_LENGTH: usize = 120;

static IMAGE_LINK: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(https?)(://[-_.!~*'()a-zA-Z0-9;/?:@&=+$,%#]+)\.(jpg|jpeg)").ok()
});

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Resolve a URL string against a base URL string.
///
/// Absolute links and unparseable bases are returned unchanged.
pub fn resolve(base_url: &str, href: &str) -> String {
    match Url::parse(base_url) {
        Ok(base) => resolve_url(&base, href),
        Err(_) => href.to_string(),
    }
}

/// First `http(s)://....jpg|jpeg` URL found in `text`, or an empty string.
pub fn extract_image_link(text: &str) -> String {
    IMAGE_LINK
        .as_ref()
        .and_then(|re| re.find(text))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// First keyword (in the given order) contained in `text`.
pub fn find_matching_word<'a>(text: &str, keywords: &'a [String]) -> Option<&'a str> {
    keywords
        .iter()
        .find(|keyword| !keyword.is_empty() && text.contains(keyword.as_str()))
        .map(String::as_str)
}

/// Plain-text snippet of an HTML fragment, whitespace collapsed and cut to
/// [`SNIPPET_LENGTH`] graphemes.
pub fn snippet(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.graphemes(true).take(SNIPPET_LENGTH).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://example.com/path/").unwrap();
        assert_eq!(
            resolve_url(&base, "page.html"),
            "https://example.com/path/page.html"
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x"),
            "https://other.com/x"
        );
        assert_eq!(resolve("not a url", "/x"), "/x");
    }

    #[test]
    fn test_extract_image_link() {
        let content = r#"<p>see <img src="http://img.example/pic.jpg"> and https://b.example/two.jpeg</p>"#;
        assert_eq!(extract_image_link(content), "http://img.example/pic.jpg");
        assert_eq!(
            extract_image_link("https://cdn.example/a/b.jpeg?x=1"),
            "https://cdn.example/a/b.jpeg"
        );
        assert_eq!(extract_image_link("<img src='/local.png'>"), "");
    }

    #[test]
    fn test_find_matching_word_first_wins() {
        let dict = vec!["Bar".to_string(), "Foo".to_string()];
        assert_eq!(find_matching_word("Foo and Bar", &dict), Some("Bar"));
        assert_eq!(find_matching_word("Foo only", &dict), Some("Foo"));
        assert_eq!(find_matching_word("nothing", &dict), None);
    }

    #[test]
    fn test_find_matching_word_ignores_empty_keyword() {
        let dict = vec![String::new()];
        assert_eq!(find_matching_word("anything", &dict), None);
    }

    #[test]
    fn test_snippet_strips_markup() {
        let html = "<p>Hello   <b>world</b></p>\n<p>again</p>";
        assert_eq!(snippet(html), "Hello world again");
    }

    #[test]
    fn test_snippet_truncates() {
        let long = "あ".repeat(SNIPPET_LENGTH + 10);
        assert_eq!(snippet(&long).graphemes(true).count(), SNIPPET_LENGTH);
    }
}
