use chrono::{DateTime, Utc};
use url::Url;

use crate::config::Config;
use crate::models::{Author, Category, Feed, FeedEntry, OfferRecord};
use crate::scrape::date;

/// Everything about a feed that does not come from the scraped records.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub base_url: String,
    pub landing_path: String,
    pub site_url: String,
    pub author: Author,
    pub language: String,
}

impl FeedSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            landing_path: config.landing_path.clone(),
            site_url: config.feed.site_url.clone(),
            author: Author {
                name: config.feed.author_name.clone(),
                email: config.feed.author_email.clone().filter(|e| !e.is_empty()),
            },
            language: config.feed.language.clone(),
        }
    }

    /// Join a record path onto the base URL. Absolute URLs pass through.
    pub fn absolute_link(&self, path: &str) -> String {
        let path = if path.trim().is_empty() {
            self.landing_path.as_str()
        } else {
            path.trim()
        };
        Url::parse(&self.base_url)
            .and_then(|base| base.join(path))
            .map(String::from)
            .unwrap_or_else(|_| format!("{}{}", self.base_url.trim_end_matches('/'), path))
    }
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Build the feed for one category. An empty record list is replaced by a
/// single placeholder, so the result always has at least one entry.
pub fn assemble(
    records: Vec<OfferRecord>,
    category: Category,
    settings: &FeedSettings,
    now: DateTime<Utc>,
) -> Feed {
    let records = if records.is_empty() {
        tracing::warn!(%category, "No offers found, creating placeholder feed");
        vec![OfferRecord::placeholder(category, &settings.landing_path, now)]
    } else {
        records
    };

    let mut entries: Vec<FeedEntry> = records
        .iter()
        .map(|record| entry_for(record, settings, now))
        .collect();
    // Stable: equal timestamps keep extraction order.
    entries.sort_by(|a, b| b.published.cmp(&a.published));

    Feed {
        category,
        title: format!("Prime Gaming RSS {}", category.as_str().to_uppercase()),
        link: settings.site_url.clone(),
        description: format!("Awesome RSS Feeds about Prime Gaming {} offers!", category),
        author: settings.author.clone(),
        language: settings.language.clone(),
        created: now,
        entries,
    }
}

fn entry_for(record: &OfferRecord, settings: &FeedSettings, now: DateTime<Utc>) -> FeedEntry {
    let expires = record
        .end_time
        .as_deref()
        .and_then(|raw| date::parse_availability(raw, now));

    FeedEntry {
        title: record.display_title().to_string(),
        link: settings.absolute_link(&record.url),
        content: record.detailed_blurb.clone(),
        description: record.short_blurb.clone(),
        published: record.start_time,
        expires,
        image_url: record.image_url.clone(),
    }
}
