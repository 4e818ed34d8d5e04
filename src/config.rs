use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::Category;

const APP_DIR: &str = "primefeed";
const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_BASE_URL: &str = "https://gaming.amazon.com";
pub const DEFAULT_LANDING_PATH: &str = "/home";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub landing_path: String,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub source: SourceKind,
    /// Chromium binary for the browser source; auto-detected when unset.
    pub chrome_path: Option<PathBuf>,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub categories: Vec<Category>,
    pub feed: FeedConfig,
    pub strategies: StrategiesConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Rss,
    Json,
}

/// How the landing page is acquired when no captured file is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Plain HTTP GET of the landing page.
    #[default]
    Http,
    /// Render in headless Chromium before scraping.
    Browser,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub site_url: String,
    pub author_name: String,
    pub author_email: Option<String>,
    pub language: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StrategiesConfig {
    pub games: StrategyOverrides,
    pub loot: StrategyOverrides,
}

/// Per-category selector overrides. Anything left out keeps the built-in value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StrategyOverrides {
    pub structural: Option<String>,
    pub cards: Option<String>,
    pub link_patterns: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    pub caption: Option<String>,
}

/// Fully resolved selectors and keywords for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub category: Category,
    /// Exact container + anchor path for the current markup.
    pub structural: String,
    /// Broad card-like selector used with the keyword filter.
    pub cards: String,
    /// URL fragments identifying detail pages of this category.
    pub link_patterns: Vec<String>,
    /// Lowercase substrings marking a card as belonging to this category.
    pub keywords: Vec<String>,
    /// Secondary caption naming the base game (loot only).
    pub caption: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            landing_path: DEFAULT_LANDING_PATH.to_string(),
            output_dir: PathBuf::from("."),
            format: OutputFormat::Rss,
            source: SourceKind::Http,
            chrome_path: None,
            timeout_secs: 60,
            user_agent: format!("primefeed/{}", env!("CARGO_PKG_VERSION")),
            categories: Category::ALL.to_vec(),
            feed: FeedConfig::default(),
            strategies: StrategiesConfig::default(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            site_url: "https://feuerlord2.github.io/PrimeGaming-RSS-Site/".to_string(),
            author_name: "Prime Gaming RSS".to_string(),
            author_email: None,
            language: "en".to_string(),
        }
    }
}

impl StrategyConfig {
    pub fn builtin(category: Category) -> Self {
        match category {
            Category::Games => Self {
                category,
                structural:
                    r#"[data-a-target="offer-list-FGWP_FULL"] .item-card__action > a:first-child"#
                        .to_string(),
                cards: ".item-card, [class*='card']".to_string(),
                link_patterns: vec!["/dp/".to_string(), "/fgwp/".to_string()],
                keywords: vec!["free game".to_string(), "claim".to_string()],
                caption: None,
            },
            Category::Loot => Self {
                category,
                structural:
                    r#"[data-a-target="offer-list-IN_GAME_LOOT"] .item-card__action > a:first-child"#
                        .to_string(),
                cards: ".item-card, [class*='card']".to_string(),
                link_patterns: vec!["/loot/".to_string()],
                keywords: vec!["loot".to_string(), "in-game".to_string()],
                caption: Some(".item-card-details__body p".to_string()),
            },
        }
    }

    fn with_overrides(mut self, overrides: &StrategyOverrides) -> Self {
        if let Some(structural) = &overrides.structural {
            self.structural = structural.clone();
        }
        if let Some(cards) = &overrides.cards {
            self.cards = cards.clone();
        }
        if let Some(patterns) = &overrides.link_patterns {
            self.link_patterns = patterns.clone();
        }
        if let Some(keywords) = &overrides.keywords {
            self.keywords = keywords.iter().map(|k| k.to_lowercase()).collect();
        }
        if let Some(caption) = &overrides.caption {
            self.caption = Some(caption.clone()).filter(|c| !c.trim().is_empty());
        }
        self
    }
}

impl Config {
    /// Load from the default location, falling back to defaults when no file exists.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    pub fn strategy(&self, category: Category) -> StrategyConfig {
        let overrides = match category {
            Category::Games => &self.strategies.games,
            Category::Loot => &self.strategies.loot,
        };
        StrategyConfig::builtin(category).with_overrides(overrides)
    }
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "rss" | "xml" => Ok(OutputFormat::Rss),
            "json" => Ok(OutputFormat::Json),
            other => Err(anyhow::anyhow!("Unknown output format: {}", other).into()),
        }
    }
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Rss => "rss",
            OutputFormat::Json => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.landing_path, DEFAULT_LANDING_PATH);
        assert_eq!(config.format, OutputFormat::Rss);
        assert_eq!(config.source, SourceKind::Http);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.categories, vec![Category::Games, Category::Loot]);
        assert_eq!(config.strategy(Category::Loot), StrategyConfig::builtin(Category::Loot));
    }

    #[test]
    fn partial_strategy_overrides_keep_builtins() {
        let config: Config = toml::from_str(
            r#"
            format = "json"
            categories = ["loot"]

            [feed]
            author_name = "Someone"

            [strategies.loot]
            keywords = ["Bonus", "DROP"]
            "#,
        )
        .unwrap();

        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.categories, vec![Category::Loot]);
        assert_eq!(config.feed.author_name, "Someone");
        assert_eq!(config.feed.language, "en");

        let loot = config.strategy(Category::Loot);
        assert_eq!(loot.keywords, vec!["bonus", "drop"]);
        assert_eq!(loot.structural, StrategyConfig::builtin(Category::Loot).structural);
        assert_eq!(loot.caption.as_deref(), Some(".item-card-details__body p"));
    }

    #[test]
    fn browser_source_is_selectable() {
        let config: Config = toml::from_str(
            r#"
            source = "browser"
            chrome_path = "/usr/bin/chromium"
            "#,
        )
        .unwrap();
        assert_eq!(config.source, SourceKind::Browser);
        assert_eq!(config.chrome_path, Some(PathBuf::from("/usr/bin/chromium")));

        let result: std::result::Result<Config, _> = toml::from_str(r#"source = "carrier-pigeon""#);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_category_in_file_is_an_error() {
        let result: std::result::Result<Config, _> = toml::from_str(r#"categories = ["movies"]"#);
        assert!(result.is_err());
    }

    #[test]
    fn load_from_reads_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeout_secs = 5\noutput_dir = \"docs\"").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.output_dir, PathBuf::from("docs"));
    }

    #[test]
    fn load_from_missing_file_fails() {
        let err = Config::load_from(Path::new("/nonexistent/primefeed.toml")).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[test]
    fn output_format_parses_names() {
        assert_eq!("RSS".parse::<OutputFormat>().unwrap(), OutputFormat::Rss);
        assert_eq!("json".parse::<OutputFormat>().unwrap().extension(), "json");
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
