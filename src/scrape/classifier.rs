use scraper::{ElementRef, Selector};

use super::{compile, element_text};
use crate::config::StrategyConfig;
use crate::error::Result;
use crate::models::{Category, OfferRecord, OfferType};

/// How much the caller already trusts that a node belongs to the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyMode {
    /// The selector itself pins the category.
    Structural,
    /// Broad selector; the node's text has to confirm the category.
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub offer_type: OfferType,
    pub parent_game_title: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    game_keywords: Vec<String>,
    loot_keywords: Vec<String>,
    caption: Option<Selector>,
}

impl Classifier {
    pub fn new(games: &StrategyConfig, loot: &StrategyConfig) -> Result<Self> {
        let caption = loot.caption.as_deref().map(compile).transpose()?;
        Ok(Self {
            game_keywords: lowercase(&games.keywords),
            loot_keywords: lowercase(&loot.keywords),
            caption,
        })
    }

    /// Decide whether `node` belongs to `category`. `None` excludes the node.
    pub fn classify(
        &self,
        node: ElementRef<'_>,
        category: Category,
        mode: ClassifyMode,
    ) -> Option<Classification> {
        let offer_type = match mode {
            ClassifyMode::Structural => category.offer_type(),
            ClassifyMode::Heuristic => {
                let detected = self.detect(node)?;
                if detected != category.offer_type() {
                    return None;
                }
                detected
            }
        };

        let parent_game_title = match offer_type {
            OfferType::Loot => self.caption_of(node),
            OfferType::Game => None,
        };

        Some(Classification {
            offer_type,
            parent_game_title,
        })
    }

    /// Apply a classification to a freshly extracted record.
    pub fn apply(&self, record: &mut OfferRecord, classification: &Classification) {
        record.offer_type = classification.offer_type;
        if let Some(parent) = &classification.parent_game_title {
            if parent == record.display_title() {
                // Keep the relationship, skip the "X - X" title.
                record.parent_game_title = Some(parent.clone());
            } else {
                record.attach_parent_game(parent);
            }
        }
    }

    // Loot keywords win: loot cards usually carry the generic "claim" wording too.
    fn detect(&self, node: ElementRef<'_>) -> Option<OfferType> {
        let text = element_text(node).to_lowercase();
        if contains_any(&text, &self.loot_keywords) {
            Some(OfferType::Loot)
        } else if contains_any(&text, &self.game_keywords) {
            Some(OfferType::Game)
        } else {
            None
        }
    }

    fn caption_of(&self, node: ElementRef<'_>) -> Option<String> {
        let selector = self.caption.as_ref()?;
        node.select(selector)
            .map(element_text)
            .find(|text| !text.is_empty())
    }
}

fn lowercase(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| text.contains(k.as_str()))
}
