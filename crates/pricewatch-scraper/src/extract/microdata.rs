use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::{attr_or_text, element_text};
use crate::price::{parse_amount, parse_price_text, PriceToken};

static PRICE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[itemprop="price"]"#).expect("valid selector"));

static CURRENCY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[itemprop="priceCurrency"]"#).expect("valid selector"));

/// `itemprop="price"`, preferring the `content` attribute over rendered text.
pub(super) fn microdata_price(document: &Html) -> Option<PriceToken> {
    document.select(&PRICE).find_map(|el| {
        let token = element_price(el)?;
        let currency = nearest_currency(el).or(token.currency);
        Some(PriceToken {
            amount: token.amount,
            currency,
        })
    })
}

fn element_price(el: ElementRef<'_>) -> Option<PriceToken> {
    el.value()
        .attr("content")
        .and_then(parse_amount)
        .map(|amount| PriceToken {
            amount,
            currency: None,
        })
        .or_else(|| parse_price_text(&element_text(el)))
}

/// `priceCurrency` inside the closest enclosing element that has one.
fn nearest_currency(el: ElementRef<'_>) -> Option<String> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find_map(|scope| {
            scope
                .select(&CURRENCY)
                .find_map(|c| attr_or_text(c, "content"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str) -> Option<PriceToken> {
        microdata_price(&Html::parse_document(html))
    }

    #[test]
    fn content_attribute_round_trips_exactly() {
        let token = run(
            r#"<div itemscope itemtype="https://schema.org/Offer">
                 <span itemprop="price" content="1234.56">R$ 1.234,56</span>
                 <meta itemprop="priceCurrency" content="BRL">
               </div>"#,
        )
        .unwrap();
        assert!((token.amount - 1234.56).abs() < f64::EPSILON);
        assert_eq!(token.currency.as_deref(), Some("BRL"));
    }

    #[test]
    fn falls_back_to_rendered_text() {
        let token = run(r#"<span itemprop="price">US$ 899,00</span>"#).unwrap();
        assert!((token.amount - 899.0).abs() < f64::EPSILON);
        assert_eq!(token.currency.as_deref(), Some("US$"));
    }

    #[test]
    fn currency_comes_from_nearest_scope() {
        let token = run(
            r#"<div><meta itemprop="priceCurrency" content="USD">
                 <div><meta itemprop="priceCurrency" content="PYG">
                   <span itemprop="price" content="150000">150.000</span>
                 </div>
               </div>"#,
        )
        .unwrap();
        assert_eq!(token.currency.as_deref(), Some("PYG"));
    }

    #[test]
    fn skips_empty_price_elements() {
        let token = run(
            r#"<span itemprop="price" content=""></span>
               <span itemprop="price" content="19.90"></span>"#,
        )
        .unwrap();
        assert!((token.amount - 19.9).abs() < f64::EPSILON);
        assert!(token.currency.is_none());
    }

    #[test]
    fn no_microdata_is_none() {
        assert!(run("<p>R$ 10,00</p>").is_none());
    }
}
