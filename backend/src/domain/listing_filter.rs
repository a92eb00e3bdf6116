//! Client-side derivation of the visible listing subset.
//!
//! The filter is a pure function of the full listing set and three inputs:
//! category, an inclusive price range and a title search. It never
//! paginates; callers recompute it whenever any input changes.

use serde::{Deserialize, Serialize};

use super::{Category, Listing, Price};

/// Category selection; `All` disables the category predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    fn matches(self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(selected) => selected == category,
        }
    }
}

/// Which price handle the user moved last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceBound {
    #[default]
    Min,
    Max,
}

/// Inclusive price bounds.
///
/// ## Invariants
/// - `min <= max` at all times; dragging one handle past the other pulls
///   the other along.
///
/// # Examples
/// ```
/// use marketplace::domain::{Price, PriceRange};
///
/// let mut range = PriceRange::new(Price::new(0), Price::new(200));
/// range.drag_min(Price::new(300));
/// assert_eq!(range.max(), Price::new(300));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    min: Price,
    max: Price,
}

impl PriceRange {
    /// Build a range, swapping crossed bounds.
    #[must_use]
    pub fn new(min: Price, max: Price) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Range from zero to the highest price present.
    pub fn covering<'a>(listings: impl IntoIterator<Item = &'a Listing>) -> Self {
        let max = listings
            .into_iter()
            .map(Listing::price)
            .max()
            .unwrap_or(Price::ZERO);
        Self::new(Price::ZERO, max)
    }

    /// Lower bound.
    pub fn min(&self) -> Price {
        self.min
    }

    /// Upper bound.
    pub fn max(&self) -> Price {
        self.max
    }

    /// Move the lower handle; the upper handle follows if crossed.
    pub fn drag_min(&mut self, value: Price) {
        self.min = value;
        if value > self.max {
            self.max = value;
        }
    }

    /// Move the upper handle; the lower handle follows if crossed.
    pub fn drag_max(&mut self, value: Price) {
        self.max = value;
        if value < self.min {
            self.min = value;
        }
    }

    /// Set both handles as a user would: the other bound first, then the
    /// handle that moved last, so that handle wins any crossing.
    pub fn drag_both(&mut self, min: Option<Price>, max: Option<Price>, last: PriceBound) {
        match last {
            PriceBound::Min => {
                if let Some(value) = max {
                    self.drag_max(value);
                }
                if let Some(value) = min {
                    self.drag_min(value);
                }
            }
            PriceBound::Max => {
                if let Some(value) = min {
                    self.drag_min(value);
                }
                if let Some(value) = max {
                    self.drag_max(value);
                }
            }
        }
    }

    /// Inclusive containment.
    pub fn contains(&self, price: Price) -> bool {
        self.min <= price && price <= self.max
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self::new(Price::ZERO, Price::new(u64::MAX))
    }
}

/// All three filter inputs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingFilter {
    category: CategoryFilter,
    price: PriceRange,
    search: String,
}

impl ListingFilter {
    /// Combine the three inputs.
    pub fn new(category: CategoryFilter, price: PriceRange, search: impl Into<String>) -> Self {
        Self {
            category,
            price,
            search: search.into(),
        }
    }

    pub fn category(&self) -> CategoryFilter {
        self.category
    }

    pub fn price(&self) -> PriceRange {
        self.price
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Whether one listing passes all three predicates.
    pub fn matches(&self, listing: &Listing) -> bool {
        self.category.matches(listing.category())
            && self.price.contains(listing.price())
            && title_contains(listing.title(), &self.search)
    }

    /// Visible subset, in input order.
    pub fn apply(&self, listings: &[Listing]) -> Vec<Listing> {
        listings
            .iter()
            .filter(|listing| self.matches(listing))
            .cloned()
            .collect()
    }
}

fn title_contains(title: &str, search: &str) -> bool {
    search.is_empty() || title.to_lowercase().contains(&search.to_lowercase())
}

#[cfg(test)]
mod tests;
