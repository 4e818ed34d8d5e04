use std::collections::HashSet;

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};

use super::classifier::{Classifier, ClassifyMode};
use super::{compile, extractor};
use crate::config::StrategyConfig;
use crate::error::Result;
use crate::models::{Category, OfferRecord};

/// One way of finding offers in a document.
pub trait SelectorStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn try_extract(&self, document: &Html, now: DateTime<Utc>) -> Vec<OfferRecord>;
}

/// The exact container + anchor path of the current markup.
pub struct StructuralStrategy {
    category: Category,
    anchors: Selector,
    classifier: Classifier,
}

/// Any card-like element whose text confirms the category.
pub struct CardStrategy {
    category: Category,
    cards: Selector,
    classifier: Classifier,
}

/// Links whose path looks like a detail page of the category.
pub struct LinkPatternStrategy {
    category: Category,
    links: Selector,
    classifier: Classifier,
}

impl StructuralStrategy {
    pub fn new(category: Category, css: &str, classifier: Classifier) -> Result<Self> {
        Ok(Self {
            category,
            anchors: compile(css)?,
            classifier,
        })
    }
}

impl SelectorStrategy for StructuralStrategy {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn try_extract(&self, document: &Html, now: DateTime<Utc>) -> Vec<OfferRecord> {
        harvest(
            document.select(&self.anchors),
            self.category,
            &self.classifier,
            ClassifyMode::Structural,
            now,
        )
    }
}

impl CardStrategy {
    pub fn new(category: Category, css: &str, classifier: Classifier) -> Result<Self> {
        Ok(Self {
            category,
            cards: compile(css)?,
            classifier,
        })
    }
}

impl SelectorStrategy for CardStrategy {
    fn name(&self) -> &'static str {
        "cards"
    }

    fn try_extract(&self, document: &Html, now: DateTime<Utc>) -> Vec<OfferRecord> {
        harvest(
            document.select(&self.cards),
            self.category,
            &self.classifier,
            ClassifyMode::Heuristic,
            now,
        )
    }
}

impl LinkPatternStrategy {
    /// `None` when there are no patterns to look for.
    pub fn new(
        category: Category,
        patterns: &[String],
        classifier: Classifier,
    ) -> Result<Option<Self>> {
        let alternatives: Vec<String> = patterns
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(|p| format!(r#"a[href*="{}"]"#, p.replace('\\', "\\\\").replace('"', "\\\"")))
            .collect();
        if alternatives.is_empty() {
            return Ok(None);
        }

        Ok(Some(Self {
            category,
            links: compile(&alternatives.join(", "))?,
            classifier,
        }))
    }
}

impl SelectorStrategy for LinkPatternStrategy {
    fn name(&self) -> &'static str {
        "link-pattern"
    }

    fn try_extract(&self, document: &Html, now: DateTime<Utc>) -> Vec<OfferRecord> {
        harvest(
            document.select(&self.links),
            self.category,
            &self.classifier,
            ClassifyMode::Structural,
            now,
        )
    }
}

/// Turn candidate nodes into records.
///
/// A candidate nested inside an accepted candidate is skipped, so overlapping
/// matches of a broad selector count once. Rejected candidates claim nothing,
/// so an offer inside a rejected wrapper is still examined. Records repeating
/// an already emitted URL are dropped as well.
fn harvest<'a>(
    candidates: impl Iterator<Item = ElementRef<'a>>,
    category: Category,
    classifier: &Classifier,
    mode: ClassifyMode,
    now: DateTime<Utc>,
) -> Vec<OfferRecord> {
    let mut claimed = HashSet::new();
    let mut seen_urls = HashSet::new();
    let mut records = Vec::new();

    for node in candidates {
        if node.ancestors().any(|ancestor| claimed.contains(&ancestor.id())) {
            continue;
        }
        // Wrappers around several offers; their children are examined instead.
        if mode == ClassifyMode::Heuristic && extractor::heading_count(node) > 1 {
            continue;
        }
        let Some(classification) = classifier.classify(node, category, mode) else {
            continue;
        };

        let mut record = extractor::extract(node, category, now);
        if !record.has_title() {
            tracing::debug!(%category, "Dropping candidate without a title");
            continue;
        }
        claimed.insert(node.id());
        if !record.url.is_empty() && !seen_urls.insert(record.url.clone()) {
            continue;
        }

        classifier.apply(&mut record, &classification);
        records.push(record);
    }

    records
}

/// Result of running a chain: which strategy won, and what it found.
#[derive(Debug, Clone, PartialEq)]
pub struct Collected {
    pub strategy: Option<&'static str>,
    pub records: Vec<OfferRecord>,
}

/// Strategies for one category, most specific first.
pub struct StrategyChain {
    category: Category,
    strategies: Vec<Box<dyn SelectorStrategy>>,
}

impl StrategyChain {
    pub fn new(category: Category, strategies: Vec<Box<dyn SelectorStrategy>>) -> Self {
        Self {
            category,
            strategies,
        }
    }

    /// The standard structural → cards → link-pattern cascade.
    pub fn for_category(config: &StrategyConfig, classifier: &Classifier) -> Result<Self> {
        let category = config.category;
        let mut strategies: Vec<Box<dyn SelectorStrategy>> = vec![
            Box::new(StructuralStrategy::new(
                category,
                &config.structural,
                classifier.clone(),
            )?),
            Box::new(CardStrategy::new(category, &config.cards, classifier.clone())?),
        ];
        if let Some(links) =
            LinkPatternStrategy::new(category, &config.link_patterns, classifier.clone())?
        {
            strategies.push(Box::new(links));
        }
        Ok(Self::new(category, strategies))
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run strategies in order and stop at the first one that yields records.
    pub fn collect(&self, document: &Html, now: DateTime<Utc>) -> Collected {
        for strategy in &self.strategies {
            let records: Vec<OfferRecord> = strategy
                .try_extract(document, now)
                .into_iter()
                .filter(OfferRecord::has_title)
                .collect();

            if records.is_empty() {
                tracing::info!(
                    category = %self.category,
                    strategy = strategy.name(),
                    "No offers found, trying next strategy"
                );
                continue;
            }

            tracing::debug!(
                category = %self.category,
                strategy = strategy.name(),
                count = records.len(),
                "Strategy matched"
            );
            return Collected {
                strategy: Some(strategy.name()),
                records,
            };
        }

        Collected {
            strategy: None,
            records: Vec::new(),
        }
    }
}
