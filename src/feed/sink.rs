use std::path::PathBuf;

use async_trait::async_trait;
use rss::{Channel, ChannelBuilder, GuidBuilder, Item, ItemBuilder};

use crate::config::OutputFormat;
use crate::error::Result;
use crate::models::{Category, Feed, FeedEntry};

/// Where assembled feeds end up.
#[async_trait]
pub trait FeedSink: Send + Sync {
    /// Persist `feed` and return where it was written.
    async fn publish(&self, category: Category, feed: &Feed) -> Result<PathBuf>;
}

/// Writes `<dir>/<category>.rss` or `<dir>/<category>.json`.
pub struct FileSink {
    dir: PathBuf,
    format: OutputFormat,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    pub fn path_for(&self, category: Category) -> PathBuf {
        self.dir
            .join(format!("{}.{}", category, self.format.extension()))
    }
}

#[async_trait]
impl FeedSink for FileSink {
    async fn publish(&self, category: Category, feed: &Feed) -> Result<PathBuf> {
        let bytes = match self.format {
            OutputFormat::Rss => to_channel(feed).write_to(Vec::new())?,
            OutputFormat::Json => serde_json::to_vec_pretty(feed)?,
        };

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(category);
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!("Wrote {} entries to {}", feed.entries.len(), path.display());
        Ok(path)
    }
}

/// RSS 2.0 rendition of a feed.
pub fn to_channel(feed: &Feed) -> Channel {
    let editor = match &feed.author.email {
        Some(email) => format!("{} ({})", email, feed.author.name),
        None => feed.author.name.clone(),
    };

    let items: Vec<Item> = feed.entries.iter().map(to_item).collect();

    ChannelBuilder::default()
        .title(feed.title.clone())
        .link(feed.link.clone())
        .description(feed.description.clone())
        .language(Some(feed.language.clone()))
        .managing_editor(Some(editor.clone()))
        .webmaster(Some(editor))
        .pub_date(Some(feed.created.to_rfc2822()))
        .last_build_date(Some(feed.created.to_rfc2822()))
        .items(items)
        .build()
}

fn to_item(entry: &FeedEntry) -> Item {
    let guid = GuidBuilder::default()
        .value(entry.link.clone())
        .permalink(true)
        .build();

    ItemBuilder::default()
        .title(Some(entry.title.clone()))
        .link(Some(entry.link.clone()))
        .description(Some(entry.description.clone()))
        .content(Some(entry.content.clone()))
        .guid(Some(guid))
        .pub_date(Some(entry.published.to_rfc2822()))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{assemble, FeedSettings};
    use crate::models::OfferRecord;
    use chrono::{Duration, TimeZone, Utc};

    fn sample_feed() -> Feed {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let records = vec![
            OfferRecord::titled("Older", "/dp/older", Category::Games, now - Duration::hours(1)),
            OfferRecord::titled("Cities: Skylines", "/dp/cities", Category::Games, now),
        ];
        assemble(records, Category::Games, &FeedSettings::default(), now)
    }

    #[test]
    fn channel_carries_feed_metadata() {
        let channel = to_channel(&sample_feed());
        assert_eq!(channel.title(), "Prime Gaming RSS GAMES");
        assert_eq!(channel.language(), Some("en"));
        assert_eq!(channel.items().len(), 2);

        let first = &channel.items()[0];
        assert_eq!(first.title(), Some("Cities: Skylines"));
        assert_eq!(first.link(), Some("https://gaming.amazon.com/dp/cities"));
        assert_eq!(
            first.guid().map(|g| g.value()),
            Some("https://gaming.amazon.com/dp/cities")
        );
    }

    #[tokio::test]
    async fn rss_file_parses_back() {
        let tmpdir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(tmpdir.path().join("docs"), OutputFormat::Rss);

        let path = sink.publish(Category::Games, &sample_feed()).await.unwrap();
        assert_eq!(path, tmpdir.path().join("docs").join("games.rss"));

        let bytes = std::fs::read(&path).unwrap();
        let parsed = feed_rs::parser::parse(&bytes[..]).unwrap();
        let titles: Vec<_> = parsed
            .entries
            .iter()
            .filter_map(|e| e.title.as_ref().map(|t| t.content.clone()))
            .collect();
        assert_eq!(titles, vec!["Cities: Skylines", "Older"]);
        assert_eq!(
            parsed.entries[0].links.first().map(|l| l.href.as_str()),
            Some("https://gaming.amazon.com/dp/cities")
        );
        assert!(parsed.entries[0].published.is_some());
    }

    #[tokio::test]
    async fn json_file_round_trips_feed() {
        let tmpdir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(tmpdir.path(), OutputFormat::Json);
        let feed = sample_feed();

        let path = sink.publish(Category::Loot, &feed).await.unwrap();
        assert!(path.ends_with("loot.json"));

        let written: Feed = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written, feed);
    }

    #[tokio::test]
    async fn publishing_twice_overwrites() {
        let tmpdir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(tmpdir.path(), OutputFormat::Rss);
        let feed = sample_feed();

        sink.publish(Category::Games, &feed).await.unwrap();
        let mut single = feed.clone();
        single.entries.truncate(1);
        let path = sink.publish(Category::Games, &single).await.unwrap();

        let parsed = feed_rs::parser::parse(&std::fs::read(path).unwrap()[..]).unwrap();
        assert_eq!(parsed.entries.len(), 1);
    }
}
