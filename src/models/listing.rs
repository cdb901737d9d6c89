use crate::models::{lenient_u64, EntityId};
use crate::normalize::{from_ledger_timestamp, to_display_rating};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Directory category. Remote listings may carry categories this client
/// does not know; those are kept verbatim.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum Category {
    DeFi,
    Social,
    Games,
    NFTs,
    Tools,
    Infrastructure,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::DeFi => "DeFi",
            Category::Social => "Social",
            Category::Games => "Games",
            Category::NFTs => "NFTs",
            Category::Tools => "Tools",
            Category::Infrastructure => "Infrastructure",
            Category::Other(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Other(_))
    }

    /// Search tags associated with the category.
    pub fn tags(&self) -> Vec<&str> {
        match self {
            Category::DeFi => vec!["Finance", "Trading", "DeFi"],
            Category::Social => vec!["Social", "Community", "Network"],
            Category::Games => vec!["Gaming", "NFT", "Entertainment"],
            Category::NFTs => vec!["NFT", "Art", "Collectibles"],
            Category::Tools => vec!["Tools", "Utility", "Developer"],
            Category::Infrastructure => vec!["Infrastructure", "Protocol", "Network"],
            Category::Other(name) => vec![name.as_str()],
        }
    }
}

impl From<String> for Category {
    fn from(name: String) -> Self {
        match name.as_str() {
            "DeFi" => Category::DeFi,
            "Social" => Category::Social,
            "Games" => Category::Games,
            "NFTs" => Category::NFTs,
            "Tools" => Category::Tools,
            "Infrastructure" => Category::Infrastructure,
            _ => Category::Other(name),
        }
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Self {
        Category::from(name.to_string())
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project record exactly as the ledger stores it.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawProject {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub builder: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub timestamp: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub review_count: u64,
    pub is_active: bool,
}

/// `getProject` result: the stored project plus its average rating in hundredths.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawListing {
    pub project: RawProject,
    #[serde(deserialize_with = "lenient_u64")]
    pub average_rating: u64,
}

/// Display-ready directory entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Listing {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub external_url: String,
    pub image_url: Option<String>,
    pub owner: String,
    /// Stars in `[0, 5]`, one decimal
    pub rating: f64,
    pub review_count: u64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    pub(crate) fn from_raw(raw: RawListing) -> Self {
        let project = raw.project;
        let image_url = Some(project.image_url).filter(|url| !url.trim().is_empty());
        Self {
            id: project.id,
            name: project.name,
            description: project.description,
            category: Category::from(project.category),
            external_url: project.url,
            image_url,
            owner: project.builder,
            rating: to_display_rating(raw.average_rating),
            review_count: project.review_count,
            active: project.is_active,
            created_at: from_ledger_timestamp(project.timestamp),
        }
    }

    /// Visible in the directory: active and named.
    pub fn is_listed(&self) -> bool {
        self.active && !self.name.trim().is_empty()
    }

    /// Compose link for sharing the listing on Farcaster.
    pub fn share_url(&self) -> String {
        let text = format!(
            "Just discovered {} on BaseBuilder! {} Check it out: {}",
            self.name, self.description, self.external_url
        );
        format!(
            "https://warpcast.com/~/compose?text={}",
            urlencoding::encode(&text)
        )
    }
}

/// Profile of the builder attached to a new listing.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct BuilderProfile {
    pub name: String,
    pub bio: String,
    pub social_handle: String,
}

/// Arguments for a `SubmitListing` write.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewListing {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub external_url: String,
    pub image_url: String,
    pub builder: BuilderProfile,
}
