use serde::{Deserialize, Serialize};

/// A retrieved paper, normalized from whatever the retrieval backend returns.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Paper {
    pub entry_id: String,
    pub title: String,
    pub authors: Vec<String>,
    /// ISO-8601 timestamp, `None` when the backend did not report one.
    pub published: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub pdf_url: Option<String>,
}

impl Paper {
    pub fn has_abstract(&self) -> bool {
        !self.abstract_text.trim().is_empty()
    }

    pub fn year(&self) -> Option<&str> {
        self.published
            .as_deref()
            .and_then(|published| published.get(..4))
            .filter(|year| year.chars().all(|c| c.is_ascii_digit()))
    }

    /// `- Title (2023) • A, B, C, et al.`
    pub fn summary_line(&self) -> String {
        let mut authors = self
            .authors
            .iter()
            .take(3)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        if self.authors.len() > 3 {
            authors.push_str(", et al.");
        }
        let year = self.year().unwrap_or("unknown date");
        format!("- {} ({}) • {}", self.title, year, authors)
    }
}
