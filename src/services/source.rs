use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::Category;

/// Supplies the raw offers page for a category.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, category: Category) -> Result<String>;
}

/// Plain HTTP fetch of the offers landing page.
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    async fn fetch(&self, category: Category) -> Result<String> {
        tracing::debug!(%category, url = %self.url, "Fetching offers page");
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::HttpStatus {
                status: response.status().as_u16(),
                url: self.url.clone(),
            });
        }

        Ok(response.text().await?)
    }
}

/// A page captured earlier (for example by a headless browser) and saved to disk.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DocumentSource for FileSource {
    async fn fetch(&self, category: Category) -> Result<String> {
        tracing::debug!(%category, path = %self.path.display(), "Reading captured page");
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn file_source_reads_capture() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<html><body>offers</body></html>").unwrap();

        let source = FileSource::new(file.path());
        let markup = source.fetch(Category::Games).await.unwrap();
        assert!(markup.contains("offers"));
    }

    #[tokio::test]
    async fn file_source_missing_file_is_an_error() {
        let source = FileSource::new("/nonexistent/capture.html");
        let err = source.fetch(Category::Loot).await.unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[test]
    fn http_source_builds_client() {
        let source = HttpSource::new(
            "https://gaming.amazon.com/home",
            Duration::from_secs(5),
            "primefeed-test",
        );
        assert!(source.is_ok());
    }
}
