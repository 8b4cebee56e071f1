//! The three agents of a research session and their tools.

pub mod foresee;
pub mod keywords;
pub mod retrieval;

use std::sync::Arc;

use scholar_agent::{LlmAgent, ToolSetBuildError};
use scholar_retrieval::PaperSource;

pub struct Agents {
    pub keywords: LlmAgent,
    pub retrieval: LlmAgent,
    pub foresee: LlmAgent,
}

impl Agents {
    pub fn build(source: Arc<dyn PaperSource>) -> Result<Self, ToolSetBuildError> {
        Ok(Self {
            keywords: keywords::agent()?,
            retrieval: retrieval::agent(source)?,
            foresee: foresee::agent()?,
        })
    }
}
