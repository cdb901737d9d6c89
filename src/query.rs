//! Search, category filter and sort over an installed directory.

use crate::models::listing::{Category, Listing};
use crate::normalize::mean_rating;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Listings at the head of the ledger order are featured.
pub const FEATURED_COUNT: usize = 2;

pub fn featured(listings: &[Listing]) -> &[Listing] {
    &listings[..listings.len().min(FEATURED_COUNT)]
}

/// Directory-wide figures for the stats panel.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DirectoryStats {
    pub projects: usize,
    pub total_reviews: u64,
    pub categories: usize,
    pub average_rating: f64,
}

impl DirectoryStats {
    pub fn of(listings: &[Listing]) -> Self {
        let categories: HashSet<&Category> = listings.iter().map(|l| &l.category).collect();
        Self {
            projects: listings.len(),
            total_reviews: listings.iter().map(|l| l.review_count).sum(),
            categories: categories.len(),
            average_rating: mean_rating(listings.iter().map(|l| l.rating)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    HighestRated,
    MostReviews,
    RecentlyAdded,
    Alphabetical,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct DirectoryQuery {
    #[serde(default)]
    pub search: String,
    /// `None` shows every category
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub sort: SortOrder,
}

impl DirectoryQuery {
    /// Parses the category picker value; "All" or blank clears the filter.
    pub fn with_category_name(mut self, name: &str) -> Self {
        let name = name.trim();
        self.category = if name.is_empty() || name.eq_ignore_ascii_case("all") {
            None
        } else {
            Some(Category::from(name))
        };
        self
    }

    /// No search text and no category filter.
    pub fn is_unfiltered(&self) -> bool {
        self.search.trim().is_empty() && self.category.is_none()
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(category) = &self.category {
            if &listing.category != category {
                return false;
            }
        }

        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        listing.name.to_lowercase().contains(&needle)
            || listing.description.to_lowercase().contains(&needle)
            || listing
                .category
                .tags()
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle))
    }

    pub fn apply(&self, listings: &[Listing]) -> Vec<Listing> {
        let mut found: Vec<Listing> = listings
            .iter()
            .filter(|listing| self.matches(listing))
            .cloned()
            .collect();
        found.sort_by(|a, b| self.compare(a, b));
        found
    }

    fn compare(&self, a: &Listing, b: &Listing) -> Ordering {
        match self.sort {
            SortOrder::HighestRated => b
                .rating
                .partial_cmp(&a.rating)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.review_count.cmp(&a.review_count)),
            SortOrder::MostReviews => b.review_count.cmp(&a.review_count),
            SortOrder::RecentlyAdded => b.created_at.cmp(&a.created_at),
            SortOrder::Alphabetical => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        }
    }
}
