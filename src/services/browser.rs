use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;

use super::DocumentSource;
use crate::error::{AppError, Result};
use crate::models::Category;

/// Present once the offer grid has rendered.
const READY_SELECTOR: &str = ".offer-list__content";

/// Buttons that widen the offer list after switching tabs. Missing ones are fine.
const SHOW_ALL: [&str; 2] = [
    r#"button[data-a-target="show-all"]"#,
    r#"button[data-a-target="clear-filters"]"#,
];

const SCROLL_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight)";
const SCROLL_PASSES: usize = 3;

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const TAB_SETTLE: Duration = Duration::from_secs(1);
const FILTER_SETTLE: Duration = Duration::from_secs(2);
const SCROLL_SETTLE: Duration = Duration::from_secs(1);
const LAZY_LOAD_SETTLE: Duration = Duration::from_secs(5);

/// Tab to open before capturing the page. Loot is shown on the landing view.
pub fn filter_tab(category: Category) -> Option<&'static str> {
    match category {
        Category::Games => Some(r#"button[data-a-target="offer-filter-button-Game"]"#),
        Category::Loot => None,
    }
}

/// Renders the landing page in headless Chromium, so script-built offer
/// cards are present in the captured markup.
pub struct BrowserSource {
    url: String,
    timeout: Duration,
    user_agent: String,
    executable: Option<PathBuf>,
}

impl BrowserSource {
    pub fn new(url: impl Into<String>, timeout: Duration, user_agent: &str) -> Self {
        Self {
            url: url.into(),
            timeout,
            user_agent: user_agent.to_string(),
            executable: None,
        }
    }

    /// Use a specific Chromium binary instead of the one found on the system.
    pub fn with_executable(mut self, executable: Option<PathBuf>) -> Self {
        self.executable = executable;
        self
    }

    fn launch_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg(format!("--user-agent={}", self.user_agent))
            .request_timeout(self.timeout);
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder
            .build()
            .map_err(|e| AppError::from(anyhow::anyhow!("failed to build browser config: {}", e)))
    }

    async fn render(&self, browser: &Browser, category: Category) -> Result<String> {
        let page = browser.new_page("about:blank").await?;
        page.goto(self.url.as_str()).await?;
        page.wait_for_navigation().await?;
        wait_for_element(&page, READY_SELECTOR).await?;

        if let Some(tab) = filter_tab(category) {
            page.find_element(tab).await?.click().await?;
            tokio::time::sleep(TAB_SETTLE).await;

            for selector in SHOW_ALL {
                if let Ok(button) = page.find_element(selector).await {
                    if let Err(e) = button.click().await {
                        tracing::debug!(%category, selector, error = %e, "Filter button not clickable");
                    }
                }
            }
        }
        tokio::time::sleep(FILTER_SETTLE).await;

        for _ in 0..SCROLL_PASSES {
            page.evaluate(SCROLL_SCRIPT).await?;
            tokio::time::sleep(SCROLL_SETTLE).await;
        }
        tokio::time::sleep(LAZY_LOAD_SETTLE).await;

        let html: String = page
            .evaluate("document.documentElement.outerHTML")
            .await?
            .into_value()
            .map_err(|e| AppError::from(anyhow::anyhow!("failed to read page HTML: {:?}", e)))?;

        if let Err(e) = page.close().await {
            tracing::debug!(%category, error = %e, "Closing page failed");
        }
        Ok(html)
    }
}

#[async_trait]
impl DocumentSource for BrowserSource {
    async fn fetch(&self, category: Category) -> Result<String> {
        tracing::debug!(%category, url = %self.url, "Rendering offers page in Chromium");
        let (mut browser, mut handler) = Browser::launch(self.launch_config()?).await?;

        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let rendered = tokio::time::timeout(self.timeout, self.render(&browser, category)).await;

        if let Err(e) = browser.close().await {
            tracing::debug!(%category, error = %e, "Closing browser failed");
        }
        if let Err(e) = browser.wait().await {
            tracing::debug!(%category, error = %e, "Browser process did not exit cleanly");
        }
        events.abort();

        match rendered {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!(
                "browser timed out after {}s",
                self.timeout.as_secs()
            )
            .into()),
        }
    }
}

/// Poll until `selector` matches. The caller bounds the wait.
async fn wait_for_element(page: &Page, selector: &str) -> Result<()> {
    loop {
        if page.find_element(selector).await.is_ok() {
            return Ok(());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_games_switch_tabs() {
        assert_eq!(
            filter_tab(Category::Games),
            Some(r#"button[data-a-target="offer-filter-button-Game"]"#)
        );
        assert_eq!(filter_tab(Category::Loot), None);
    }

    #[test]
    fn interaction_selectors_are_valid_css() {
        let selectors = filter_tab(Category::Games)
            .into_iter()
            .chain(SHOW_ALL)
            .chain([READY_SELECTOR]);
        for css in selectors {
            assert!(scraper::Selector::parse(css).is_ok(), "{}", css);
        }
    }

    #[test]
    fn executable_override_is_kept() {
        let source = BrowserSource::new("https://gaming.amazon.com/home", Duration::from_secs(60), "ua")
            .with_executable(Some(PathBuf::from("/opt/chromium/chrome")));
        assert_eq!(source.executable, Some(PathBuf::from("/opt/chromium/chrome")));
        assert_eq!(source.timeout, Duration::from_secs(60));
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn renders_a_data_url() {
        let source = BrowserSource::new(
            r#"data:text/html,<div class="offer-list__content"><h3>Hades</h3></div>"#,
            Duration::from_secs(30),
            "primefeed-test",
        );
        let html = source.fetch(Category::Loot).await.unwrap();
        assert!(html.contains("<h3>Hades</h3>"));
    }
}
