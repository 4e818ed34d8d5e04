use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;

use crate::error::PipelineFailure;
use crate::feed::{assemble, FeedSettings, FeedSink};
use crate::models::{Category, Feed, OfferRecord};
use crate::scrape::OfferScraper;
use crate::services::DocumentSource;

/// Outcome of one category's run.
#[derive(Debug, Clone)]
pub struct CategoryReport {
    pub category: Category,
    pub feed: Feed,
    /// Real offers scraped; placeholders are not counted.
    pub offers_found: usize,
    /// Name of the strategy that produced the offers.
    pub strategy: Option<&'static str>,
    pub published: Option<PathBuf>,
    pub failures: Vec<PipelineFailure>,
}

impl CategoryReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs acquire → extract → assemble → publish for each category independently.
/// Cheap to clone; every category task gets its own handle.
#[derive(Clone)]
pub struct Orchestrator {
    scraper: Arc<OfferScraper>,
    settings: Arc<FeedSettings>,
    pinned_now: Option<DateTime<Utc>>,
}

impl Orchestrator {
    pub fn new(scraper: OfferScraper, settings: FeedSettings) -> Self {
        Self {
            scraper: Arc::new(scraper),
            settings: Arc::new(settings),
            pinned_now: None,
        }
    }

    /// Use a fixed extraction instant instead of the wall clock.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.pinned_now = Some(now);
        self
    }

    /// Process every category on its own task and wait for all of them.
    /// Failures stay inside their category's report.
    pub async fn run(
        &self,
        source: Arc<dyn DocumentSource>,
        sink: Arc<dyn FeedSink>,
        categories: &[Category],
    ) -> BTreeMap<Category, CategoryReport> {
        let categories: BTreeSet<Category> = categories.iter().copied().collect();

        let mut join_set = JoinSet::new();
        for category in categories {
            let orchestrator = self.clone();
            let source = Arc::clone(&source);
            let sink = Arc::clone(&sink);
            join_set.spawn(async move {
                orchestrator
                    .run_category(source.as_ref(), sink.as_ref(), category)
                    .await
            });
        }

        let mut reports = BTreeMap::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(report) => {
                    reports.insert(report.category, report);
                }
                Err(e) => tracing::error!(error = %e, "Category task did not finish"),
            }
        }
        reports
    }

    async fn run_category(
        &self,
        source: &dyn DocumentSource,
        sink: &dyn FeedSink,
        category: Category,
    ) -> CategoryReport {
        let now = self.pinned_now.unwrap_or_else(Utc::now);
        let mut failures = Vec::new();
        tracing::info!(%category, "Starting to scrape Prime Gaming");

        let (records, strategy, offers_found) = match source.fetch(category).await {
            Ok(markup) => {
                let collected = self.scraper.scrape(&markup, category, now);
                if collected.records.is_empty() {
                    failures.push(PipelineFailure::ExtractionEmpty);
                }
                let count = collected.records.len();
                (collected.records, collected.strategy, count)
            }
            Err(e) => {
                tracing::error!(%category, step = "scraping", error = %e, "Acquisition failed");
                let message = e.to_string();
                failures.push(PipelineFailure::Acquisition(message.clone()));
                let placeholder =
                    OfferRecord::failure(category, &message, &self.settings.landing_path, now);
                (vec![placeholder], None, 0)
            }
        };

        tracing::info!(%category, count = offers_found, strategy = ?strategy, "Products found");

        let feed = assemble(records, category, &self.settings, now);

        let published = match sink.publish(category, &feed).await {
            Ok(path) => {
                tracing::info!(%category, path = %path.display(), "RSS feed created successfully");
                Some(path)
            }
            Err(e) => {
                tracing::error!(%category, step = "writing", error = %e, "Publishing failed");
                failures.push(PipelineFailure::Publish(e.to_string()));
                None
            }
        };

        CategoryReport {
            category,
            feed,
            offers_found,
            strategy,
            published,
            failures,
        }
    }
}
