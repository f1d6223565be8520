//! Change evaluation for a tracked product URL.
//!
//! A [`WatchedItem`] holds the last known values for one URL. Callers feed it
//! each fresh [`ProductSnapshot`] through [`WatchedItem::apply`] and decide
//! from the returned [`CheckOutcome`] whether to persist or notify.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::snapshot::ProductSnapshot;

/// Percentage change from `old` to `new`.
///
/// Returns `None` when `old` is zero or either value is not finite.
#[must_use]
pub fn percent_change(old: f64, new: f64) -> Option<f64> {
    if old == 0.0 || !old.is_finite() || !new.is_finite() {
        return None;
    }
    Some((new - old) / old * 100.0)
}

/// A price observed at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: f64,
    pub currency: Option<String>,
    pub observed_at: DateTime<Utc>,
}

/// Result of applying a fresh snapshot to a [`WatchedItem`].
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// The snapshot carried no price; the item was left untouched.
    NoPrice,
    /// First price ever recorded for this item.
    FirstPrice { current: f64 },
    Unchanged { current: f64 },
    Changed {
        previous: f64,
        /// Currency recorded alongside `previous`.
        previous_currency: Option<String>,
        current: f64,
        /// `None` when the previous price was zero.
        percent: Option<f64>,
    },
}

impl CheckOutcome {
    /// Whether the caller should append a new history entry.
    #[must_use]
    pub fn should_record(&self) -> bool {
        matches!(self, Self::FirstPrice { .. } | Self::Changed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchedItem {
    pub url: String,
    pub name: Option<String>,
    pub last_price: Option<f64>,
    pub currency: Option<String>,
    pub last_checked: Option<DateTime<Utc>>,
    pub lowest: Option<PricePoint>,
}

impl WatchedItem {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
            last_price: None,
            currency: None,
            last_checked: None,
            lowest: None,
        }
    }

    /// Fold a snapshot into the item and report what changed.
    ///
    /// A snapshot without a price leaves every field as it was, including
    /// `last_checked`, so a blocked fetch never masks the last good value.
    pub fn apply(&mut self, snapshot: &ProductSnapshot, now: DateTime<Utc>) -> CheckOutcome {
        let Some(current) = snapshot.price else {
            return CheckOutcome::NoPrice;
        };

        let outcome = match self.last_price {
            None => CheckOutcome::FirstPrice { current },
            Some(previous) if (previous - current).abs() < f64::EPSILON => {
                CheckOutcome::Unchanged { current }
            }
            Some(previous) => CheckOutcome::Changed {
                previous,
                previous_currency: self.currency.clone(),
                current,
                percent: percent_change(previous, current),
            },
        };

        self.name = Some(snapshot.name.clone());
        self.last_price = Some(current);
        self.currency.clone_from(&snapshot.currency);
        self.last_checked = Some(now);

        // Ties keep the earliest observation.
        let is_new_low = self.lowest.as_ref().is_none_or(|low| current < low.price);
        if is_new_low {
            self.lowest = Some(PricePoint {
                price: current,
                currency: snapshot.currency.clone(),
                observed_at: now,
            });
        }

        outcome
    }
}
