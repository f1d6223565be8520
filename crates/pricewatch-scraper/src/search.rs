//! Search result pages: build the query URL and pick product links out of
//! the returned HTML.

use std::collections::HashSet;
use std::sync::LazyLock;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Url;
use scraper::{Html, Selector};

use crate::error::ScraperError;
use crate::extract::element_text;

/// Placeholder replaced by the encoded query.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Path fragment that marks a product detail link.
const PRODUCT_PATH_MARKER: &str = "/produto";

/// RFC 3986 unreserved characters stay as-is.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductLink {
    pub url: String,
    pub title: String,
}

/// Substitute the percent-encoded `query` into `template`.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidSearchTemplate`] if the template has no
/// `{query}` placeholder or the result is not a valid URL.
pub fn search_url(template: &str, query: &str) -> Result<String, ScraperError> {
    let invalid = |reason: String| ScraperError::InvalidSearchTemplate {
        template: template.to_owned(),
        reason,
    };
    if !template.contains(QUERY_PLACEHOLDER) {
        return Err(invalid(format!("missing {QUERY_PLACEHOLDER} placeholder")));
    }
    let encoded = utf8_percent_encode(query.trim(), QUERY_ENCODE_SET).to_string();
    let url = template.replace(QUERY_PLACEHOLDER, &encoded);
    Url::parse(&url).map_err(|e| invalid(e.to_string()))?;
    Ok(url)
}

/// Up to `limit` unique absolute product links from a search results page,
/// in document order.
#[must_use]
pub fn extract_product_links(html: &str, base_url: &str, limit: usize) -> Vec<ProductLink> {
    let Ok(base) = Url::parse(base_url) else {
        tracing::warn!(base_url, "search base URL is not absolute; no links resolved");
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&ANCHOR) {
        if links.len() >= limit {
            break;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(mut resolved) = base.join(href.trim()) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https")
            || !resolved.path().contains(PRODUCT_PATH_MARKER)
        {
            continue;
        }
        resolved.set_fragment(None);
        let url = resolved.to_string();
        if !seen.insert(url.clone()) {
            continue;
        }

        let title = Some(element_text(anchor))
            .filter(|t| !t.is_empty())
            .or_else(|| {
                anchor
                    .value()
                    .attr("title")
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_owned)
            })
            .unwrap_or_else(|| url.clone());
        links.push(ProductLink { url, title });
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "https://www.comprasparaguai.com.br/busca/?s={query}";

    #[test]
    fn search_url_encodes_query() {
        let url = search_url(TEMPLATE, " iphone 15 pro&max ").unwrap();
        assert_eq!(
            url,
            "https://www.comprasparaguai.com.br/busca/?s=iphone%2015%20pro%26max"
        );
    }

    #[test]
    fn search_url_keeps_unreserved_and_encodes_utf8() {
        let url = search_url(TEMPLATE, "café-1.0_x~").unwrap();
        assert!(url.ends_with("?s=caf%C3%A9-1.0_x~"));
    }

    #[test]
    fn search_url_requires_placeholder() {
        let err = search_url("https://shop.example.com/search", "x").unwrap_err();
        assert!(matches!(err, ScraperError::InvalidSearchTemplate { .. }));
    }

    #[test]
    fn search_url_rejects_relative_template() {
        assert!(search_url("/busca?s={query}", "x").is_err());
    }

    #[test]
    fn links_are_resolved_filtered_and_deduplicated() {
        let html = r##"
            <a href="/sobre">About</a>
            <a href="/produto/notebook-x_123/">  Notebook
               X </a>
            <a href="/produto/notebook-x_123/#reviews">Notebook X reviews</a>
            <a href="https://www.comprasparaguai.com.br/produto/phone_9/" title="Phone"></a>
            <a href="mailto:a@b.c/produto">mail</a>
        "##;
        let links = extract_product_links(html, "https://www.comprasparaguai.com.br/busca/?s=x", 10);
        assert_eq!(
            links,
            vec![
                ProductLink {
                    url: "https://www.comprasparaguai.com.br/produto/notebook-x_123/".to_owned(),
                    title: "Notebook X".to_owned(),
                },
                ProductLink {
                    url: "https://www.comprasparaguai.com.br/produto/phone_9/".to_owned(),
                    title: "Phone".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn links_respect_limit() {
        let html: String = (0..10)
            .map(|i| format!(r#"<a href="/produto/{i}">P{i}</a>"#))
            .collect();
        let links = extract_product_links(&html, "https://shop.example.com/", 3);
        assert_eq!(links.len(), 3);
        assert_eq!(links[2].url, "https://shop.example.com/produto/2");
    }

    #[test]
    fn title_falls_back_to_url() {
        let links = extract_product_links(
            r#"<a href="/produto/7"><img src="x.png"></a>"#,
            "https://shop.example.com/",
            3,
        );
        assert_eq!(links[0].title, links[0].url);
    }

    #[test]
    fn bad_base_url_yields_nothing() {
        assert!(extract_product_links(r#"<a href="/produto/1">x</a>"#, "not a url", 3).is_empty());
    }
}
