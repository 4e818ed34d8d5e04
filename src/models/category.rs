use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// The offer class a feed is built for. Each category gets its own
/// strategy chain, feed and output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Games,
    Loot,
}

/// What a single record is. Mirrors the category it was scraped for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferType {
    Game,
    Loot,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Games, Category::Loot];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Games => "games",
            Category::Loot => "loot",
        }
    }

    pub fn offer_type(&self) -> OfferType {
        match self {
            Category::Games => OfferType::Game,
            Category::Loot => OfferType::Loot,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "games" | "game" => Ok(Category::Games),
            "loot" => Ok(Category::Loot),
            other => Err(AppError::UnknownCategory(other.to_string())),
        }
    }
}
