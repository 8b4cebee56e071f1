use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Paper;

/// Cross-phase state of one conversation.
///
/// Fields start absent and are filled in order by the three phases. All
/// mutation goes through [`SessionState::apply`], which holds the
/// invariants: `confirmed` never flips back, `confirmed_keywords` and
/// `retrieved_papers` are written once.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieved_papers: Option<Vec<Paper>>,
    /// Negotiation turn in which keywords were first proposed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_proposal_turn: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum StateUpdate {
    ProposeKeywords { keywords: Vec<String>, turn: u32 },
    ConfirmKeywords { keywords: Vec<String> },
    StorePapers(Vec<Paper>),
}

impl SessionState {
    pub fn apply(&mut self, update: StateUpdate) {
        match update {
            StateUpdate::ProposeKeywords { keywords, turn } => {
                self.keywords = Some(keywords);
                self.first_proposal_turn.get_or_insert(turn);
            }
            StateUpdate::ConfirmKeywords { keywords } => {
                self.keywords = Some(keywords.clone());
                self.confirmed = true;
                if self.confirmed_keywords.is_none() {
                    self.confirmed_keywords = Some(keywords);
                } else {
                    warn!("keywords already confirmed, keeping the first confirmed list");
                }
            }
            StateUpdate::StorePapers(papers) => {
                if self.retrieved_papers.is_none() {
                    self.retrieved_papers = Some(papers);
                } else {
                    warn!("papers already stored for this session, ignoring new result set");
                }
            }
        }
    }

    /// Keywords to search with: the confirmed list, else the latest
    /// proposal, else nothing.
    pub fn search_keywords(&self) -> Vec<String> {
        self.confirmed_keywords
            .as_ref()
            .filter(|keywords| !keywords.is_empty())
            .or(self.keywords.as_ref())
            .cloned()
            .unwrap_or_default()
    }

    /// The list Phase A carries forward, once confirmation happened.
    pub fn accepted_keywords(&self) -> Option<Vec<String>> {
        if !self.confirmed {
            return None;
        }
        let keywords = self.search_keywords();
        (!keywords.is_empty()).then_some(keywords)
    }

    pub fn papers(&self) -> &[Paper] {
        self.retrieved_papers.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod state_tests;
