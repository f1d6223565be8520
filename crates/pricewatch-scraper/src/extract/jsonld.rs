//! schema.org JSON-LD offers.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde_json::Value;

use crate::price::{parse_amount, PriceToken};

static LD_SCRIPT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type*="ld+json"]"#).expect("valid JSON-LD selector")
});

/// Nesting bound for the recursive walk.
const MAX_DEPTH: usize = 32;

const PRICE_KEYS: [&str; 3] = ["price", "lowPrice", "highPrice"];

/// Price from the first Product/Offer node that carries one. Malformed
/// blocks are skipped.
pub(super) fn jsonld_price(document: &Html) -> Option<PriceToken> {
    document.select(&LD_SCRIPT).find_map(|script| {
        let raw: String = script.text().collect();
        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(value) => find_price(&value, 0),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed JSON-LD block");
                None
            }
        }
    })
}

/// Depth-first walk. Arrays and `@graph` containers are covered by descending
/// into every value.
fn find_price(value: &Value, depth: usize) -> Option<PriceToken> {
    if depth > MAX_DEPTH {
        return None;
    }
    match value {
        Value::Array(items) => items.iter().find_map(|v| find_price(v, depth + 1)),
        Value::Object(map) => {
            if is_commerce_node(value) {
                if let Some(token) = node_price(value) {
                    return Some(token);
                }
            }
            map.values().find_map(|v| find_price(v, depth + 1))
        }
        _ => None,
    }
}

/// `@type` (string or array) containing "product" or "offer".
fn is_commerce_node(node: &Value) -> bool {
    let matches = |t: &str| {
        let lowered = t.to_ascii_lowercase();
        lowered.contains("product") || lowered.contains("offer")
    };
    match node.get("@type") {
        Some(Value::String(t)) => matches(t),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).any(matches),
        _ => false,
    }
}

fn node_price(node: &Value) -> Option<PriceToken> {
    let from_offers = match node.get("offers") {
        Some(Value::Array(offers)) => offers.iter().find_map(offer_price),
        Some(offer) => offer_price(offer),
        None => None,
    };
    from_offers.or_else(|| offer_price(node))
}

fn offer_price(offer: &Value) -> Option<PriceToken> {
    let currency = string_field(offer, "priceCurrency");
    if let Some(amount) = PRICE_KEYS
        .iter()
        .find_map(|key| offer.get(*key).and_then(json_amount))
    {
        return Some(PriceToken { amount, currency });
    }

    let specs: Vec<&Value> = match offer.get("priceSpecification")? {
        Value::Array(list) => list.iter().collect(),
        single => vec![single],
    };
    specs.into_iter().find_map(|spec| {
        let amount = spec.get("price").and_then(json_amount)?;
        Some(PriceToken {
            amount,
            currency: string_field(spec, "priceCurrency").or_else(|| currency.clone()),
        })
    })
}

fn json_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite() && *v >= 0.0),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

fn string_field(node: &Value, key: &str) -> Option<String> {
    node.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(json: &str) -> Option<PriceToken> {
        let html = format!(r#"<script type="application/ld+json">{json}</script>"#);
        jsonld_price(&Html::parse_document(&html))
    }

    fn assert_price(token: &PriceToken, amount: f64, currency: Option<&str>) {
        assert!(
            (token.amount - amount).abs() < 1e-9,
            "expected {amount}, got {}",
            token.amount
        );
        assert_eq!(token.currency.as_deref(), currency);
    }

    #[test]
    fn offer_list_with_low_price() {
        let token = run(
            r#"{"@type":"Product","name":"X","offers":[{"@type":"AggregateOffer","lowPrice":120.5,"priceCurrency":"USD"}]}"#,
        )
        .unwrap();
        assert_price(&token, 120.5, Some("USD"));
    }

    #[test]
    fn single_offer_string_price() {
        let token = run(
            r#"{"@type":"Product","offers":{"@type":"Offer","price":"1.299,00","priceCurrency":"BRL"}}"#,
        )
        .unwrap();
        assert_price(&token, 1299.0, Some("BRL"));
    }

    #[test]
    fn price_preferred_over_low_and_high() {
        let token = run(
            r#"{"@type":"Offer","highPrice":300,"lowPrice":100,"price":200}"#,
        )
        .unwrap();
        assert_price(&token, 200.0, None);
    }

    #[test]
    fn first_parseable_offer_wins() {
        let token = run(
            r#"{"@type":"Product","offers":[{"price":"consulte"},{"price":"59.90","priceCurrency":"EUR"}]}"#,
        )
        .unwrap();
        assert_price(&token, 59.9, Some("EUR"));
    }

    #[test]
    fn price_specification_object_and_list() {
        let token = run(
            r#"{"@type":"Offer","priceSpecification":{"price":15,"priceCurrency":"GBP"}}"#,
        )
        .unwrap();
        assert_price(&token, 15.0, Some("GBP"));

        let token = run(
            r#"{"@type":"Offer","priceCurrency":"USD","priceSpecification":[{"price":"n/a"},{"price":"7.5"}]}"#,
        )
        .unwrap();
        assert_price(&token, 7.5, Some("USD"));
    }

    #[test]
    fn graph_container_is_expanded() {
        let token = run(
            r#"{"@context":"https://schema.org","@graph":[{"@type":"WebPage"},{"@type":["Product","Thing"],"offers":{"price":42}}]}"#,
        )
        .unwrap();
        assert_price(&token, 42.0, None);
    }

    #[test]
    fn type_match_is_case_insensitive_substring() {
        let token = run(r#"{"@type":"IndividualPRODUCT","offers":{"price":3}}"#).unwrap();
        assert_price(&token, 3.0, None);
    }

    #[test]
    fn non_commerce_nodes_are_ignored() {
        assert!(run(r#"{"@type":"Organization","price":10}"#).is_none());
    }

    #[test]
    fn malformed_block_is_skipped() {
        let html = r#"
            <script type="application/ld+json">{ not json </script>
            <script type="application/ld+json">{"@type":"Product","offers":{"price":"9.99"}}</script>
        "#;
        let token = jsonld_price(&Html::parse_document(html)).unwrap();
        assert_price(&token, 9.99, None);
    }

    #[test]
    fn negative_numbers_rejected() {
        assert!(run(r#"{"@type":"Offer","price":-5}"#).is_none());
    }

    #[test]
    fn deep_nesting_does_not_overflow() {
        let mut json = String::from(r#"{"@type":"Offer","price":1}"#);
        for _ in 0..200 {
            json = format!("[{json}]");
        }
        assert!(run(&json).is_none());
    }
}
