use std::collections::HashSet;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

use super::{element_text, static_selectors};
use crate::models::{Category, OfferRecord};

// Most specific location first.
static TITLE: Lazy<Vec<Selector>> = Lazy::new(|| {
    static_selectors(&[
        ".item-card-details__body__primary h3",
        "h3",
        "[class*='title']",
    ])
});

static IMAGE: Lazy<Vec<Selector>> =
    Lazy::new(|| static_selectors(&[r#"[data-a-target="card-image"] img"#, "img"]));

static END_DATE: Lazy<Vec<Selector>> =
    Lazy::new(|| static_selectors(&[".availability-date span:nth-child(2)"]));

static NESTED_LINK: Lazy<Vec<Selector>> = Lazy::new(|| static_selectors(&["a[href]"]));

/// Number of offer titles under `node`, using the same locations as the title
/// field. A title nested in another title counts once. More than one means
/// `node` wraps several offers.
pub fn heading_count(node: ElementRef<'_>) -> usize {
    let mut titles: Vec<ElementRef<'_>> = Vec::new();
    for element in TITLE.iter().flat_map(|selector| node.select(selector)) {
        if element_text(element).is_empty() || titles.iter().any(|t| t.id() == element.id()) {
            continue;
        }
        titles.push(element);
    }

    let ids: HashSet<_> = titles.iter().map(|t| t.id()).collect();
    titles
        .iter()
        .filter(|t| !t.ancestors().any(|ancestor| ids.contains(&ancestor.id())))
        .count()
}

/// Build a record from one matched node. The title may come back empty;
/// callers drop such records.
pub fn extract(node: ElementRef<'_>, category: Category, now: DateTime<Utc>) -> OfferRecord {
    let title = first_text(node, &TITLE).unwrap_or_default();
    let url = link_of(node).unwrap_or_default();
    if url.is_empty() && !title.is_empty() {
        tracing::debug!(%category, title = %title, "Offer has no link");
    }

    let mut record = OfferRecord::titled(&title, &url, category, now);
    record.image_url = first_attr(node, &IMAGE, "src");
    record.end_time = first_text(node, &END_DATE);
    record
}

fn first_text(node: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        node.select(selector)
            .map(element_text)
            .find(|text| !text.is_empty())
    })
}

fn first_attr(node: ElementRef<'_>, selectors: &[Selector], attr: &str) -> Option<String> {
    selectors.iter().find_map(|selector| {
        node.select(selector)
            .filter_map(|el| el.value().attr(attr))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .map(str::to_string)
    })
}

fn link_of(node: ElementRef<'_>) -> Option<String> {
    node.value()
        .attr("href")
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .or_else(|| first_attr(node, &NESTED_LINK, "href"))
}
