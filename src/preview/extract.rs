//! Preview metadata extraction from HTML.
//!
//! Each field is filled from an ordered list of sources; the first source
//! yielding a non-empty value wins. Extraction never fails: a page with no
//! usable metadata produces the documented defaults.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use super::{PreviewResult, NO_TITLE};

/// Currency symbol or ISO code, an amount, and an optional trailing code.
/// The amount is digits, commas and points, ending on a digit.
static PRICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<currency>[$₹€£¥]|\b(?:USD|EUR|GBP|INR))\s*(?P<amount>\.?\d(?:[\d,.]*\d)?)(?:\s?(?:USD|EUR|GBP|INR)\b)?",
    )
    .expect("price pattern is valid")
});

/// Elements whose text never counts as visible page text.
const NON_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// A parsed page plus the URL it came from.
pub struct Page {
    html: Html,
    source_url: String,
}

impl Page {
    pub fn parse(html: &str, source_url: &str) -> Self {
        Self {
            html: Html::parse_document(html),
            source_url: source_url.to_string(),
        }
    }

    /// Content of the first `<meta>` whose `property` or `name` equals `key`.
    fn meta(&self, key: &str) -> Option<String> {
        let selector = format!(r#"meta[property="{key}"], meta[name="{key}"]"#);
        self.first_attr(&selector, "content")
    }

    fn first_attr(&self, selector: &str, attr: &str) -> Option<String> {
        let selector = Selector::parse(selector).ok()?;
        self.html
            .select(&selector)
            .find_map(|el| el.value().attr(attr))
            .and_then(non_empty)
    }

    fn has_oembed_link(&self) -> bool {
        Selector::parse(r#"link[type="application/json+oembed"]"#)
            .map(|s| self.html.select(&s).next().is_some())
            .unwrap_or(false)
    }

    /// Visible text of the document, one space between text nodes.
    fn text(&self) -> String {
        let mut parts = Vec::new();
        for node in self.html.root_element().descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node
                .parent()
                .and_then(|p| p.value().as_element().map(|e| e.name()))
                .is_some_and(|name| NON_TEXT_ELEMENTS.contains(&name));
            let text = text.trim();
            if !hidden && !text.is_empty() {
                parts.push(text);
            }
        }
        parts.join(" ")
    }
}

/// A named source for one preview field.
pub type FieldSource = (&'static str, fn(&Page) -> Option<String>);

pub const TITLE_SOURCES: &[FieldSource] = &[
    ("og:title", og_title),
    ("twitter:title", twitter_title),
    ("oembed:title", oembed_title),
    ("title", document_title),
];

pub const IMAGE_SOURCES: &[FieldSource] = &[
    ("og:image", og_image),
    ("twitter:image", twitter_image),
    ("oembed:image", oembed_image),
    ("img", first_image_src),
];

pub const SITE_NAME_SOURCES: &[FieldSource] = &[
    ("og:site_name", og_site_name),
    ("hostname", source_hostname),
];

/// Evaluate sources in order, returning the first non-empty value and its source name.
pub fn first_match(page: &Page, sources: &[FieldSource]) -> Option<(&'static str, String)> {
    sources
        .iter()
        .find_map(|(name, source)| source(page).map(|value| (*name, value)))
}

/// Extract a complete preview from HTML.
pub fn extract(html: &str, source_url: &str) -> PreviewResult {
    let page = Page::parse(html, source_url);

    let title = pick(&page, "title", TITLE_SOURCES).unwrap_or_else(|| NO_TITLE.to_string());
    let image = pick(&page, "image", IMAGE_SOURCES).unwrap_or_default();
    let site_name = pick(&page, "siteName", SITE_NAME_SOURCES).unwrap_or_default();
    let (price, currency) = find_price(&page.text()).unwrap_or_default();

    PreviewResult {
        title,
        image,
        price,
        currency,
        site_name,
        source_url: source_url.to_string(),
    }
}

fn pick(page: &Page, field: &str, sources: &[FieldSource]) -> Option<String> {
    let (source, value) = first_match(page, sources)?;
    debug!("{} taken from {}", field, source);
    Some(value)
}

/// Find the first price in text, returning `(price, currency)`.
pub fn find_price(text: &str) -> Option<(String, String)> {
    let caps = PRICE_PATTERN.captures(text)?;
    let price = caps.get(0)?.as_str().trim().to_string();
    let currency = caps.name("currency")?.as_str().to_string();
    Some((price, currency))
}

fn og_title(page: &Page) -> Option<String> {
    page.meta("og:title")
}

fn og_image(page: &Page) -> Option<String> {
    page.meta("og:image")
}

fn og_site_name(page: &Page) -> Option<String> {
    page.meta("og:site_name")
}

fn twitter_title(page: &Page) -> Option<String> {
    page.meta("twitter:title")
}

fn twitter_image(page: &Page) -> Option<String> {
    page.meta("twitter:image")
}

// oEmbed metadata only counts on pages that advertise an oEmbed endpoint.
fn oembed_title(page: &Page) -> Option<String> {
    page.has_oembed_link()
        .then(|| page.meta("oembed:title"))
        .flatten()
}

fn oembed_image(page: &Page) -> Option<String> {
    page.has_oembed_link()
        .then(|| page.meta("oembed:image"))
        .flatten()
}

fn document_title(page: &Page) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let title = page.html.select(&selector).next()?;
    non_empty(&title.text().collect::<String>())
}

/// `src` of the first `<img>` element, if that element has one.
fn first_image_src(page: &Page) -> Option<String> {
    let selector = Selector::parse("img").ok()?;
    let img = page.html.select(&selector).next()?;
    img.value().attr("src").and_then(non_empty)
}

fn source_hostname(page: &Page) -> Option<String> {
    let url = Url::parse(&page.source_url).ok()?;
    url.host_str().and_then(non_empty)
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Fallback Title</title>
  <meta property="og:title" content="Amazing Product">
  <meta property="og:image" content="https://example.com/product.jpg">
  <meta property="og:site_name" content="Example Store">
  <meta name="twitter:title" content="Twitter Title">
</head>
<body>
  <img src="https://example.com/other.jpg">
  <p class="price">$29.99</p>
</body>
</html>"#;

    const BASIC_PAGE: &str = r#"<html>
<head><title>Basic Page No OG</title></head>
<body>
  <img src="https://example.com/basic.jpg" alt="basic">
  <span>Only €15.50 today</span>
</body>
</html>"#;

    #[test]
    fn test_open_graph_wins_over_title() {
        let result = extract(PRODUCT_PAGE, "https://example.com/product");
        assert_eq!(result.title, "Amazing Product");
        assert_eq!(result.image, "https://example.com/product.jpg");
        assert_eq!(result.site_name, "Example Store");
        assert_eq!(result.price, "$29.99");
        assert_eq!(result.currency, "$");
        assert_eq!(result.source_url, "https://example.com/product");
    }

    #[test]
    fn test_basic_html_fallbacks() {
        let result = extract(BASIC_PAGE, "https://example.com/basic");
        assert_eq!(result.title, "Basic Page No OG");
        assert_eq!(result.image, "https://example.com/basic.jpg");
        assert_eq!(result.site_name, "example.com");
        assert_eq!(result.price, "€15.50");
        assert_eq!(result.currency, "€");
    }

    #[test]
    fn test_empty_document_defaults() {
        let result = extract("", "https://shop.example.org/x");
        assert_eq!(result.title, "No Title");
        assert_eq!(result.image, "");
        assert_eq!(result.price, "");
        assert_eq!(result.currency, "");
        assert_eq!(result.site_name, "shop.example.org");
    }

    #[test]
    fn test_unparseable_source_url_gives_empty_site_name() {
        let result = extract("<title>t</title>", "not a url");
        assert_eq!(result.site_name, "");
        assert_eq!(result.source_url, "not a url");
    }

    #[test]
    fn test_twitter_card_before_title() {
        let html = r#"<title>Doc</title><meta name="twitter:title" content="Card Title">
            <meta name="twitter:image" content="https://cdn.example.com/card.png">"#;
        let page = Page::parse(html, "https://example.com");
        assert_eq!(
            first_match(&page, TITLE_SOURCES),
            Some(("twitter:title", "Card Title".to_string()))
        );
        assert_eq!(
            first_match(&page, IMAGE_SOURCES),
            Some(("twitter:image", "https://cdn.example.com/card.png".to_string()))
        );
    }

    #[test]
    fn test_blank_og_value_falls_through() {
        let html = r#"<meta property="og:title" content="   "><title>Real Title</title>"#;
        let page = Page::parse(html, "https://example.com");
        assert_eq!(
            first_match(&page, TITLE_SOURCES),
            Some(("title", "Real Title".to_string()))
        );
    }

    #[test]
    fn test_oembed_meta_requires_discovery_link() {
        let without_link = r#"<meta name="oembed:title" content="Embedded">"#;
        let page = Page::parse(without_link, "https://example.com");
        assert_eq!(first_match(&page, TITLE_SOURCES), None);

        let with_link = r#"<link rel="alternate" type="application/json+oembed" href="https://example.com/oembed">
            <meta name="oembed:title" content="Embedded">
            <meta name="oembed:image" content="https://example.com/thumb.jpg">
            <title>Page</title>"#;
        let page = Page::parse(with_link, "https://example.com");
        assert_eq!(
            first_match(&page, TITLE_SOURCES),
            Some(("oembed:title", "Embedded".to_string()))
        );
        assert_eq!(
            first_match(&page, IMAGE_SOURCES),
            Some(("oembed:image", "https://example.com/thumb.jpg".to_string()))
        );
    }

    #[test]
    fn test_first_img_without_src_gives_empty_image() {
        let html = r#"<img alt="no source"><img src="https://example.com/second.jpg">"#;
        let result = extract(html, "https://example.com");
        assert_eq!(result.image, "");
    }

    #[test]
    fn test_price_patterns() {
        assert_eq!(
            find_price("now ₹1,299.00 only"),
            Some(("₹1,299.00".to_string(), "₹".to_string()))
        );
        assert_eq!(
            find_price("Price: USD 45.10"),
            Some(("USD 45.10".to_string(), "USD".to_string()))
        );
        assert_eq!(
            find_price("£ 12 GBP"),
            Some(("£ 12 GBP".to_string(), "£".to_string()))
        );
        assert_eq!(
            find_price("only $.99 today"),
            Some(("$.99".to_string(), "$".to_string()))
        );
        assert_eq!(
            find_price("€1.299.00 inkl. MwSt."),
            Some(("€1.299.00".to_string(), "€".to_string()))
        );
        assert_eq!(
            find_price("It costs $5."),
            Some(("$5".to_string(), "$".to_string()))
        );
        assert_eq!(find_price("no prices here"), None);
        assert_eq!(find_price("THUSD 12"), None);
    }

    #[test]
    fn test_first_price_in_document_order() {
        let html = "<p>Was €20.00</p><p>Now $15.00</p>";
        let result = extract(html, "https://example.com");
        assert_eq!(result.price, "€20.00");
        assert_eq!(result.currency, "€");
    }

    #[test]
    fn test_script_text_ignored_for_price() {
        let html = r#"<script>var p = "$99.99";</script><p>¥500</p>"#;
        let result = extract(html, "https://example.com");
        assert_eq!(result.price, "¥500");
        assert_eq!(result.currency, "¥");
    }

    #[test]
    fn test_unquoted_attributes() {
        let html = "<meta property=og:title content='Amazing Product'><meta property=og:image content='https://example.com/product.jpg'>$29.99";
        let result = extract(html, "https://example.com/product");
        assert_eq!(result.title, "Amazing Product");
        assert_eq!(result.image, "https://example.com/product.jpg");
        assert_eq!(result.price, "$29.99");
        assert_eq!(result.currency, "$");
    }
}
