use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use url::Url;

mod config;
mod error;
mod feed;
mod models;
mod pipeline;
mod scrape;
mod services;

use config::{Config, OutputFormat, SourceKind};
use error::{AppError, Result};
use feed::{FeedSettings, FileSink};
use models::Category;
use pipeline::Orchestrator;
use scrape::{date, OfferScraper};
use services::{BrowserSource, DocumentSource, FileSource, HttpSource};

const USAGE: &str = "Usage: primefeed [--config PATH] [--input FILE | --browser] [--out DIR] \
[--format rss|json] [--now TIMESTAMP] [CATEGORY...]";

#[tokio::main]
async fn main() -> Result<()> {
    // Filter out html5ever warnings about the scraped markup
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    if let Ok(directive) = "html5ever=error".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = match CliArgs::parse(&args) {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{}", USAGE);
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}\n{}", e, USAGE);
            return Err(e);
        }
    };

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    args.apply(&mut config);

    let scraper = OfferScraper::from_config(&config)?;
    let mut orchestrator = Orchestrator::new(scraper, FeedSettings::from_config(&config));
    if let Some(raw) = &args.now {
        orchestrator = orchestrator.with_now(date::normalize(raw, Utc::now()));
    }

    let landing_url = Url::parse(&config.base_url)?.join(&config.landing_path)?;
    let timeout = Duration::from_secs(config.timeout_secs);
    let source: Arc<dyn DocumentSource> = match (&args.input, config.source) {
        (Some(path), _) => Arc::new(FileSource::new(path)),
        (None, SourceKind::Http) => {
            Arc::new(HttpSource::new(landing_url, timeout, &config.user_agent)?)
        }
        (None, SourceKind::Browser) => Arc::new(
            BrowserSource::new(landing_url, timeout, &config.user_agent)
                .with_executable(config.chrome_path.clone()),
        ),
    };
    let sink = Arc::new(FileSink::new(&config.output_dir, config.format));

    let reports = orchestrator.run(source, sink, &config.categories).await;

    for report in reports.values() {
        match &report.published {
            Some(path) => println!(
                "{}: {} offers via {} ({} entries) -> {}",
                report.category,
                report.offers_found,
                report.strategy.unwrap_or("placeholder"),
                report.feed.entries.len(),
                path.display()
            ),
            None => println!("{}: not written", report.category),
        }
        if !report.is_clean() {
            for failure in &report.failures {
                tracing::warn!(category = %report.category, "{}", failure);
            }
        }
    }

    Ok(())
}

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    config: Option<PathBuf>,
    input: Option<PathBuf>,
    out: Option<PathBuf>,
    format: Option<OutputFormat>,
    now: Option<String>,
    browser: bool,
    categories: Vec<Category>,
}

impl CliArgs {
    /// `Ok(None)` when help was requested.
    fn parse(args: &[String]) -> Result<Option<Self>> {
        let mut parsed = CliArgs::default();
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            let arg = arg.as_str();
            let mut value = |flag: &str| {
                iter.next()
                    .cloned()
                    .ok_or_else(|| AppError::from(anyhow::anyhow!("{} needs a value", flag)))
            };
            match arg {
                "-h" | "--help" => return Ok(None),
                "--config" => parsed.config = Some(PathBuf::from(value(arg)?)),
                "--input" => parsed.input = Some(PathBuf::from(value(arg)?)),
                "--out" => parsed.out = Some(PathBuf::from(value(arg)?)),
                "--format" => parsed.format = Some(value(arg)?.parse()?),
                "--now" => parsed.now = Some(value(arg)?),
                "--browser" => parsed.browser = true,
                flag if flag.starts_with("--") => {
                    return Err(anyhow::anyhow!("Unknown option: {}", flag).into())
                }
                name => parsed.categories.push(name.parse()?),
            }
        }

        Ok(Some(parsed))
    }

    fn apply(&self, config: &mut Config) {
        if let Some(out) = &self.out {
            config.output_dir = out.clone();
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if self.browser {
            config.source = SourceKind::Browser;
        }
        if !self.categories.is_empty() {
            config.categories = self.categories.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_flags_and_categories() {
        let parsed = CliArgs::parse(&args(&[
            "--input", "page.html", "--out", "docs", "--format", "json", "--now",
            "2024-06-01T00:00:00Z", "loot",
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(parsed.input, Some(PathBuf::from("page.html")));
        assert_eq!(parsed.out, Some(PathBuf::from("docs")));
        assert_eq!(parsed.format, Some(OutputFormat::Json));
        assert_eq!(parsed.now.as_deref(), Some("2024-06-01T00:00:00Z"));
        assert_eq!(parsed.categories, vec![Category::Loot]);
    }

    #[test]
    fn help_short_circuits() {
        assert_eq!(CliArgs::parse(&args(&["games", "--help"])).unwrap(), None);
    }

    #[test]
    fn rejects_unknown_input() {
        assert!(CliArgs::parse(&args(&["--verbose"])).is_err());
        assert!(CliArgs::parse(&args(&["--out"])).is_err());
        assert!(matches!(
            CliArgs::parse(&args(&["movies"])),
            Err(AppError::UnknownCategory(_))
        ));
    }

    #[test]
    fn cli_overrides_config() {
        let parsed = CliArgs::parse(&args(&["--out", "site", "games"]))
            .unwrap()
            .unwrap();
        let mut config = Config::default();
        parsed.apply(&mut config);

        assert_eq!(config.output_dir, PathBuf::from("site"));
        assert_eq!(config.categories, vec![Category::Games]);
        assert_eq!(config.format, OutputFormat::Rss);
        assert_eq!(config.source, SourceKind::Http);
    }

    #[test]
    fn browser_flag_selects_browser_source() {
        let parsed = CliArgs::parse(&args(&["--browser", "games"])).unwrap().unwrap();
        assert!(parsed.browser);
        assert_eq!(parsed.categories, vec![Category::Games]);

        let mut config = Config::default();
        parsed.apply(&mut config);
        assert_eq!(config.source, SourceKind::Browser);
    }
}
