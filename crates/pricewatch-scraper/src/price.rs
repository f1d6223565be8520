//! Locale-tolerant number and currency parsing shared by every extraction
//! strategy.
//!
//! Retail pages mix `4.399,00` (dot grouping, decimal comma) with `4,399.00`
//! and `4399.00`. [`parse_number`] normalizes all of them to an `f64`.
//!
//! ## Ambiguity policy
//!
//! A token with a single separator followed by exactly three digits
//! (`"1.234"`, `"1,234"`) is read as thousands grouping and yields `1234.0`.
//! The one exception is a zero integer part (`"0.500"`), which can only be a
//! decimal. Grouping must be well formed: a leading group of one to three
//! digits, then groups of exactly three. Dates and version strings such as
//! `12.05.2024` or `1234,567` are rejected rather than read as large amounts.
//!
//! Machine-readable values (`content` attributes, meta tags, JSON-LD) go
//! through [`parse_amount`] instead, which honours a plain `.` decimal before
//! applying the locale rules.

use std::sync::LazyLock;

use regex::Regex;

/// Currency tokens recognised in front of an amount, longest first so that
/// `R$` and `US$` win over a bare `$`.
const CURRENCY_PREFIX: &str = r"R\$|US\$|U\$S|USD|BRL|PYG|ARS|EUR|GBP|Gs\.?|₲|€|£|\$";
/// Currency tokens recognised after an amount (`120 USD`, `10,50 €`).
const CURRENCY_SUFFIX: &str = r"USD|BRL|PYG|ARS|EUR|GBP|Gs\.?|₲|€|£";
/// Either space-grouped thousands (`1 234,56`) or a run of digits and
/// separators that starts and ends with a digit.
const NUMBER: &str = r"\d{1,3}(?:[ \x{a0}\x{202f}]\d{3})+(?:[.,]\d+)?|\d(?:[\d.,]*\d)?";

static PREFIXED_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:^|[^\p{{L}}])(?P<cur>{CURRENCY_PREFIX})\s*(?P<num>{NUMBER})"
    ))
    .expect("valid prefixed price regex")
});

static SUFFIXED_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?P<num>{NUMBER})\s*(?P<cur>{CURRENCY_SUFFIX})(?:[^\p{{L}}]|$)"
    ))
    .expect("valid suffixed price regex")
});

static BARE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NUMBER).expect("valid number regex"));

/// An amount recovered from text, with the currency token that accompanied
/// it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceToken {
    pub amount: f64,
    pub currency: Option<String>,
}

/// Normalize a raw numeric token to an `f64`.
///
/// Strips spaces and non-breaking spaces, removes grouping separators, and
/// converts a decimal comma to a decimal point. Returns `None` for anything
/// that is not a finite, non-negative number.
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\u{202f}')
        .collect();
    if compact.is_empty()
        || !compact
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == ',')
        || !compact.chars().any(|c| c.is_ascii_digit())
    {
        return None;
    }

    let last_dot = compact.rfind('.');
    let last_comma = compact.rfind(',');

    let normalized = match (last_dot, last_comma) {
        (None, None) => compact,
        // Both present: the rightmost one is the decimal separator.
        (Some(dot), Some(comma)) => {
            let (decimal_at, grouping) = if dot > comma { (dot, ',') } else { (comma, '.') };
            let (int_part, frac_part) = compact.split_at(decimal_at);
            let groups: Vec<&str> = int_part.split(grouping).collect();
            if groups.iter().any(|g| g.contains(['.', ',']))
                || frac_part[1..].contains(['.', ','])
                || (groups.len() > 1 && !is_thousands_grouping(&groups))
            {
                return None;
            }
            format!("{}.{}", groups.concat(), &frac_part[1..])
        }
        (Some(_), None) => resolve_single_separator(&compact, '.')?,
        (None, Some(_)) => resolve_single_separator(&compact, ',')?,
    };

    finite_non_negative(normalized.parse::<f64>().ok()?)
}

/// Resolve a token that uses only one kind of separator.
fn resolve_single_separator(compact: &str, sep: char) -> Option<String> {
    let parts: Vec<&str> = compact.split(sep).collect();

    if parts.len() > 2 {
        // Repeated separator can only be grouping.
        return is_thousands_grouping(&parts).then(|| parts.concat());
    }

    let (int_part, frac_part) = (parts[0], parts[1]);
    if frac_part.len() == 3 && !int_part.is_empty() && int_part != "0" {
        // `1234,567` is neither valid grouping nor a plausible price.
        return is_thousands_grouping(&parts).then(|| parts.concat());
    }
    Some(format!("{int_part}.{frac_part}"))
}

/// `1`, `12` or `123` followed only by three-digit groups.
fn is_thousands_grouping(groups: &[&str]) -> bool {
    let Some((first, rest)) = groups.split_first() else {
        return false;
    };
    (1..=3).contains(&first.len()) && rest.iter().all(|g| g.len() == 3)
}

/// Parse a machine-readable amount such as a `content` attribute or JSON-LD
/// string.
///
/// A value Rust parses directly (`"1234.56"`, `"1.234"`) is taken verbatim;
/// anything else falls back to [`parse_number`] and finally to a text scan.
#[must_use]
pub fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return None;
    }
    let is_plain = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c == '-' || c == '+');
    if is_plain {
        if let Some(value) = trimmed.parse::<f64>().ok().and_then(finite_non_negative) {
            return Some(value);
        }
    }
    parse_number(trimmed).or_else(|| parse_price_text(trimmed).map(|t| t.amount))
}

/// Find the first amount in free text, with its currency token when present.
///
/// An amount carrying a currency (prefix or suffix) is preferred over an
/// earlier bare number, so `"10x de R$ 99,90"` yields `99.90 R$`.
#[must_use]
pub fn parse_price_text(text: &str) -> Option<PriceToken> {
    let text = normalize_spaces(text);
    if let Some(token) = find_currency_price(&text) {
        return Some(token);
    }
    BARE_NUMBER_RE
        .find_iter(&text)
        .find_map(|m| parse_number(m.as_str()))
        .map(|amount| PriceToken {
            amount,
            currency: None,
        })
}

/// Find the first currency-prefixed amount in free text.
///
/// This is the full-text fallback: bare numbers are never accepted.
#[must_use]
pub fn find_prefixed_price(text: &str) -> Option<PriceToken> {
    let text = normalize_spaces(text);
    PREFIXED_PRICE_RE.captures_iter(&text).find_map(|cap| {
        let amount = parse_number(cap.name("num")?.as_str())?;
        Some(PriceToken {
            amount,
            currency: cap.name("cur").map(|m| m.as_str().trim().to_string()),
        })
    })
}

/// Earliest amount with a currency on either side.
fn find_currency_price(text: &str) -> Option<PriceToken> {
    let prefixed = PREFIXED_PRICE_RE.captures_iter(text).find_map(|cap| {
        let start = cap.get(0)?.start();
        let amount = parse_number(cap.name("num")?.as_str())?;
        Some((start, amount, cap.name("cur")?.as_str()))
    });
    let suffixed = SUFFIXED_PRICE_RE.captures_iter(text).find_map(|cap| {
        let start = cap.get(0)?.start();
        let amount = parse_number(cap.name("num")?.as_str())?;
        Some((start, amount, cap.name("cur")?.as_str()))
    });

    let best = match (prefixed, suffixed) {
        (Some(p), Some(s)) => Some(if s.0 < p.0 { s } else { p }),
        (p, s) => p.or(s),
    };
    best.map(|(_, amount, currency)| PriceToken {
        amount,
        currency: Some(currency.trim().to_string()),
    })
}

fn normalize_spaces(text: &str) -> String {
    text.replace(['\u{a0}', '\u{202f}'], " ")
}

fn finite_non_negative(value: f64) -> Option<f64> {
    (value.is_finite() && value >= 0.0).then_some(value)
}

#[cfg(test)]
#[path = "price_test.rs"]
mod tests;
