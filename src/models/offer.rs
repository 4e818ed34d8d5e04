use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Category, OfferType};

/// One promotional item pulled out of the offers page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferRecord {
    pub short_title: String,
    pub full_title: String,
    /// Path relative to the site base URL (absolute URLs are kept as-is).
    pub url: String,
    pub short_blurb: String,
    pub detailed_blurb: String,
    pub start_time: DateTime<Utc>,
    /// Raw availability text, e.g. "Ends Mar 5, 2025".
    pub end_time: Option<String>,
    pub image_url: Option<String>,
    pub category: Category,
    pub offer_type: OfferType,
    pub parent_game_title: Option<String>,
}

impl OfferRecord {
    /// A record whose every textual field is the given title.
    pub fn titled(title: &str, url: &str, category: Category, now: DateTime<Utc>) -> Self {
        Self {
            short_title: title.to_string(),
            full_title: title.to_string(),
            url: url.to_string(),
            short_blurb: title.to_string(),
            detailed_blurb: title.to_string(),
            start_time: now,
            end_time: None,
            image_url: None,
            category,
            offer_type: category.offer_type(),
            parent_game_title: None,
        }
    }

    /// Stand-in for a category where extraction produced nothing.
    pub fn placeholder(category: Category, landing_path: &str, now: DateTime<Utc>) -> Self {
        let title = format!("No {} offers available", category);
        Self {
            short_blurb: format!("No {} offers", category),
            detailed_blurb: format!(
                "Currently no {} offers are available on Prime Gaming.",
                category
            ),
            ..Self::titled(&title, landing_path, category, now)
        }
    }

    /// Stand-in for a category whose document could not be acquired.
    pub fn failure(
        category: Category,
        message: &str,
        landing_path: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let title = format!("Scraping failed for {}", category);
        Self {
            detailed_blurb: format!("Failed to scrape {} offers: {}", category, message),
            ..Self::titled(&title, landing_path, category, now)
        }
    }

    /// Title shown in the feed, falling back to the full title.
    pub fn display_title(&self) -> &str {
        if self.short_title.is_empty() {
            &self.full_title
        } else {
            &self.short_title
        }
    }

    pub fn has_title(&self) -> bool {
        !self.display_title().trim().is_empty()
    }

    /// Record the base game a loot item belongs to and prefix the title with it.
    pub fn attach_parent_game(&mut self, parent: &str) {
        let parent = parent.trim();
        if parent.is_empty() || !self.has_title() {
            return;
        }
        self.short_title = format!("{} - {}", parent, self.display_title());
        self.parent_game_title = Some(parent.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titled_record_is_self_describing() {
        let record = OfferRecord::titled("Cities: Skylines", "/dp/1", Category::Games, Utc::now());
        assert_eq!(record.short_title, "Cities: Skylines");
        assert_eq!(record.full_title, "Cities: Skylines");
        assert_eq!(record.short_blurb, "Cities: Skylines");
        assert_eq!(record.detailed_blurb, "Cities: Skylines");
        assert_eq!(record.offer_type, OfferType::Game);
    }

    #[test]
    fn attach_parent_game_prefixes_title() {
        let mut record = OfferRecord::titled("Skin Pack", "/loot/1", Category::Loot, Utc::now());
        record.attach_parent_game("  Valorant ");
        assert_eq!(record.short_title, "Valorant - Skin Pack");
        assert_eq!(record.full_title, "Skin Pack");
        assert_eq!(record.parent_game_title.as_deref(), Some("Valorant"));
    }

    #[test]
    fn attach_parent_game_ignores_blank_caption() {
        let mut record = OfferRecord::titled("Skin Pack", "/loot/1", Category::Loot, Utc::now());
        record.attach_parent_game("   ");
        assert_eq!(record.short_title, "Skin Pack");
        assert!(record.parent_game_title.is_none());
    }

    #[test]
    fn display_title_falls_back_to_full_title() {
        let mut record = OfferRecord::titled("Full", "/x", Category::Games, Utc::now());
        record.short_title.clear();
        assert_eq!(record.display_title(), "Full");
        record.full_title.clear();
        assert!(!record.has_title());
    }

    #[test]
    fn placeholders_name_their_category() {
        let now = Utc::now();
        let empty = OfferRecord::placeholder(Category::Loot, "/home", now);
        assert_eq!(empty.short_title, "No loot offers available");
        assert_eq!(empty.url, "/home");
        assert_eq!(empty.start_time, now);

        let failed = OfferRecord::failure(Category::Games, "timed out", "/home", now);
        assert_eq!(failed.short_title, "Scraping failed for games");
        assert!(failed.detailed_blurb.contains("timed out"));
    }
}
