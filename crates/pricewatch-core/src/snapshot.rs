use serde::{Deserialize, Serialize};

/// Placeholder name used when a page carries neither `og:title` nor `<title>`.
pub const UNTITLED: &str = "Untitled";

/// Which step of the extraction cascade produced a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    Microdata,
    Selector,
    MetaTag,
    JsonLd,
    TextScan,
}

impl std::fmt::Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceSource::Microdata => write!(f, "microdata"),
            PriceSource::Selector => write!(f, "selector"),
            PriceSource::MetaTag => write!(f, "meta_tag"),
            PriceSource::JsonLd => write!(f, "json_ld"),
            PriceSource::TextScan => write!(f, "text_scan"),
        }
    }
}

/// Name, price, and currency recovered from one product page.
///
/// `price` is finite and non-negative whenever present. `currency` is the
/// literal symbol or code found on the page; `None` means unknown and must
/// not be read as any particular currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub name: String,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub source: Option<PriceSource>,
}

impl ProductSnapshot {
    /// Snapshot for a page that could not be fetched at all.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            name: UNTITLED.to_string(),
            price: None,
            currency: None,
            source: None,
        }
    }

    #[must_use]
    pub fn has_price(&self) -> bool {
        self.price.is_some()
    }
}

impl std::fmt::Display for ProductSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.price, self.currency.as_deref()) {
            (Some(price), Some(currency)) => write!(f, "{}: {price:.2} {currency}", self.name),
            (Some(price), None) => write!(f, "{}: {price:.2} (currency unknown)", self.name),
            (None, _) => write!(f, "{}: price not found", self.name),
        }
    }
}
