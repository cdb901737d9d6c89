// src/models/review.rs
use crate::models::{lenient_u64, EntityId};
use crate::normalize::{from_ledger_timestamp, short_address};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review record exactly as the ledger stores it (`reviews(id)`).
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawReview {
    pub id: EntityId,
    pub project_id: EntityId,
    #[serde(default)]
    pub reviewer: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub rating: u64,
    #[serde(default)]
    pub comment: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub timestamp: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub helpful_votes: u64,
    pub is_active: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Review {
    pub id: EntityId,
    pub listing_id: EntityId, // Listing the review is attached to
    pub author: String,       // Reviewer address
    pub stars: u8,            // 1..=5
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub helpful_votes: u64,
    pub active: bool,
}

impl RawReview {
    /// Rejects a star value the ledger should never have stored.
    pub(crate) fn check_rating(&self) -> Result<(), String> {
        if (1..=5).contains(&self.rating) {
            Ok(())
        } else {
            Err(format!("rating {} outside 1..=5", self.rating))
        }
    }
}

impl Review {
    pub(crate) fn from_raw(raw: RawReview) -> Self {
        Self {
            id: raw.id,
            listing_id: raw.project_id,
            author: raw.reviewer,
            // Range checked by `RawReview::check_rating` during hydration
            stars: raw.rating.min(5) as u8,
            comment: raw.comment,
            created_at: from_ledger_timestamp(raw.timestamp),
            helpful_votes: raw.helpful_votes,
            active: raw.is_active,
        }
    }

    pub fn author_short(&self) -> String {
        short_address(&self.author)
    }
}

/// Arguments for a `SubmitReview` write.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewReview {
    pub listing_id: EntityId,
    pub stars: u8,
    pub comment: String,
}

/// Arguments for a `VoteHelpful` write. The listing is only used locally to
/// know which review collection to re-read after settlement.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HelpfulVote {
    pub listing_id: EntityId,
    pub review_id: EntityId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_raw() {
        let raw: RawReview = serde_json::from_value(json!({
            "id": 11,
            "projectId": "3",
            "reviewer": "0x4fd74D95eD6d7B1A1EE26EC66e616e60ffE16733",
            "rating": 4,
            "comment": "Fast and clean swaps",
            "timestamp": 1724000100,
            "helpfulVotes": "2",
            "isActive": true
        }))
        .unwrap();

        let review = Review::from_raw(raw);
        assert_eq!(review.id, EntityId::new("11"));
        assert_eq!(review.listing_id, EntityId::new("3"));
        assert_eq!(review.stars, 4);
        assert_eq!(review.helpful_votes, 2);
        assert_eq!(review.author_short(), "0x4fd7...6733");
    }
}
