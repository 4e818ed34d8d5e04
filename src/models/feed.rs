use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Category;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub category: Category,
    pub title: String,
    pub link: String,
    pub description: String,
    pub author: Author,
    pub language: String,
    pub created: DateTime<Utc>,
    /// Most recent first.
    pub entries: Vec<FeedEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub content: String,
    pub description: String,
    pub published: DateTime<Utc>,
    pub expires: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
}
