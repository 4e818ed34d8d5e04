mod classifier;
pub mod date;
mod extractor;
mod strategy;

pub use strategy::Collected;

use classifier::Classifier;
use strategy::StrategyChain;

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::Category;

/// Strategy chains for every category, built once per run.
pub struct OfferScraper {
    chains: Vec<StrategyChain>,
}

impl OfferScraper {
    pub fn from_config(config: &Config) -> Result<Self> {
        let classifier = Classifier::new(
            &config.strategy(Category::Games),
            &config.strategy(Category::Loot),
        )?;
        let chains = Category::ALL
            .iter()
            .map(|&category| StrategyChain::for_category(&config.strategy(category), &classifier))
            .collect::<Result<Vec<_>>>()?;
        for chain in &chains {
            tracing::debug!(
                category = %chain.category(),
                strategies = ?chain.strategy_names(),
                "Strategy chain ready"
            );
        }
        Ok(Self { chains })
    }

    pub fn chain(&self, category: Category) -> Option<&StrategyChain> {
        self.chains.iter().find(|chain| chain.category() == category)
    }

    /// Parse `markup` and run the category's chain over it.
    pub fn scrape(&self, markup: &str, category: Category, now: DateTime<Utc>) -> Collected {
        let Some(chain) = self.chain(category) else {
            return Collected {
                strategy: None,
                records: Vec::new(),
            };
        };
        let document = Html::parse_document(markup);
        chain.collect(&document, now)
    }
}

pub(crate) fn compile(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AppError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

/// Selectors that ship with the binary.
fn static_selectors(css: &[&str]) -> Vec<Selector> {
    css.iter()
        .map(|s| Selector::parse(s).expect("built-in selector must parse"))
        .collect()
}

/// Text content with runs of whitespace collapsed to single spaces.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn element_text_collapses_whitespace() {
        let document = Html::parse_fragment("<div>  Apex\n  <b>Legends</b>\t</div>");
        let selector = Selector::parse("div").unwrap();
        let div = document.select(&selector).next().unwrap();
        assert_eq!(element_text(div), "Apex Legends");
    }

    #[test]
    fn scraper_routes_each_category_to_its_chain() {
        let scraper = OfferScraper::from_config(&Config::default()).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let markup = r#"
            <div data-a-target="offer-list-FGWP_FULL"><div class="item-card__action">
              <a href="/dp/1"><h3>Game One</h3></a>
            </div></div>"#;

        let games = scraper.scrape(markup, Category::Games, now);
        assert_eq!(games.records.len(), 1);
        assert_eq!(games.records[0].short_title, "Game One");

        let loot = scraper.scrape(markup, Category::Loot, now);
        assert!(loot.records.is_empty());
    }

    #[test]
    fn bad_configured_selector_fails_construction() {
        let mut config = Config::default();
        config.strategies.loot.caption = Some("p[".to_string());
        assert!(matches!(
            OfferScraper::from_config(&config),
            Err(AppError::Selector { .. })
        ));
    }
}
