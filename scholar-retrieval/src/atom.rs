//! Atom feed decoding for the arXiv export API.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use scholar_core::Paper;
use tracing::warn;

use crate::RetrievalError;

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: String,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(rename = "author", default)]
    authors: Vec<Author>,
    #[serde(rename = "link", default)]
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@title", default)]
    title: Option<String>,
    #[serde(rename = "@type", default)]
    media_type: Option<String>,
}

/// Decodes an arXiv Atom response into papers, preserving feed order.
pub fn parse_feed(xml: &str) -> Result<Vec<Paper>, RetrievalError> {
    let feed: Feed = quick_xml::de::from_str(xml)?;
    Ok(feed.entries.into_iter().map(Entry::into_paper).collect())
}

impl Entry {
    fn into_paper(self) -> Paper {
        let pdf_url = self
            .links
            .iter()
            .find(|link| {
                link.title.as_deref() == Some("pdf")
                    || link.media_type.as_deref() == Some("application/pdf")
            })
            .map(|link| link.href.clone());

        Paper {
            published: self.published.as_deref().and_then(normalize_timestamp),
            entry_id: self.id.trim().to_string(),
            title: collapse_whitespace(&self.title),
            authors: self
                .authors
                .into_iter()
                .map(|author| author.name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
            abstract_text: self.summary.trim().to_string(),
            pdf_url,
        }
    }
}

// arXiv sends `2023-05-01T17:59:59Z`; papers carry `2023-05-01T17:59:59+00:00`.
fn normalize_timestamp(raw: &str) -> Option<String> {
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(timestamp) => Some(timestamp.with_timezone(&Utc).to_rfc3339()),
        Err(err) => {
            warn!(published = raw, error = %err, "unparseable publication date");
            None
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
