use scraper::Html;

use crate::price::{find_prefixed_price, PriceToken};

/// Elements whose text never renders.
const HIDDEN_ELEMENTS: [&str; 5] = ["script", "style", "noscript", "template", "title"];

/// Last resort: first currency-prefixed amount in the visible text.
pub(super) fn text_scan_price(document: &Html) -> Option<PriceToken> {
    find_prefixed_price(&visible_text(document))
}

fn visible_text(document: &Html) -> String {
    let mut out = String::new();
    for node in document.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(|n| n.value().as_element())
            .any(|el| HIDDEN_ELEMENTS.contains(&el.name()));
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str) -> Option<PriceToken> {
        text_scan_price(&Html::parse_document(html))
    }

    #[test]
    fn finds_prefixed_amount_in_body() {
        let token = run("<body><p>Oferta imperdível por apenas R$ 2.199,90 no Pix</p></body>").unwrap();
        assert!((token.amount - 2199.9).abs() < 1e-9);
        assert_eq!(token.currency.as_deref(), Some("R$"));
    }

    #[test]
    fn ignores_script_and_style_text() {
        let html = r#"<head><style>.a:before{content:"$ 5"}</style></head>
            <body><script>var p = "US$ 1,00";</script><p>sem preço</p></body>"#;
        assert!(run(html).is_none());
    }

    #[test]
    fn ignores_bare_numbers() {
        assert!(run("<p>Modelo 2024 com 256 GB</p>").is_none());
    }
}
