use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::price::{parse_amount, PriceToken};

fn meta_selector(key: &str) -> Selector {
    Selector::parse(&format!(
        r#"meta[property="{key}"], meta[name="{key}"]"#
    ))
    .expect("valid meta selector")
}

/// `product:price:*` first, `og:price:*` as the alias.
static AMOUNT: LazyLock<[Selector; 2]> = LazyLock::new(|| {
    [
        meta_selector("product:price:amount"),
        meta_selector("og:price:amount"),
    ]
});

static CURRENCY: LazyLock<[Selector; 2]> = LazyLock::new(|| {
    [
        meta_selector("product:price:currency"),
        meta_selector("og:price:currency"),
    ]
});

pub(super) fn meta_price(document: &Html) -> Option<PriceToken> {
    let amount = first_content(document, AMOUNT.as_slice(), parse_amount)?;
    let currency = first_content(document, CURRENCY.as_slice(), |s| Some(s.to_owned()));
    Some(PriceToken { amount, currency })
}

fn first_content<T>(
    document: &Html,
    selectors: &[Selector],
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    selectors.iter().find_map(|selector| {
        document
            .select(selector)
            .filter_map(|el| el.value().attr("content"))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .find_map(&parse)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str) -> Option<PriceToken> {
        meta_price(&Html::parse_document(html))
    }

    #[test]
    fn property_pair() {
        let token = run(
            r#"<head>
                 <meta property="product:price:amount" content="4399.00">
                 <meta property="product:price:currency" content="BRL">
               </head>"#,
        )
        .unwrap();
        assert!((token.amount - 4399.0).abs() < f64::EPSILON);
        assert_eq!(token.currency.as_deref(), Some("BRL"));
    }

    #[test]
    fn name_attribute_and_og_alias() {
        let token = run(
            r#"<meta name="og:price:amount" content="12,50">
               <meta name="og:price:currency" content="EUR">"#,
        )
        .unwrap();
        assert!((token.amount - 12.5).abs() < f64::EPSILON);
        assert_eq!(token.currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn product_namespace_beats_og_alias() {
        let token = run(
            r#"<meta property="og:price:amount" content="10.00">
               <meta property="product:price:amount" content="9.00">"#,
        )
        .unwrap();
        assert!((token.amount - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn amount_without_currency() {
        let token = run(r#"<meta property="product:price:amount" content="75">"#).unwrap();
        assert!(token.currency.is_none());
    }

    #[test]
    fn currency_alone_is_not_a_price() {
        assert!(run(r#"<meta property="product:price:currency" content="USD">"#).is_none());
    }
}
