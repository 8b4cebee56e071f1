use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use scholar_agent::{
    LlmAgent, NoArgs, ToolContext, ToolError, ToolSet, ToolSetBuildError, TypedTool,
};
use scholar_core::StateUpdate;
use scholar_retrieval::{search_keywords, PaperSource, SearchReport, MAX_RESULTS};
use tracing::info;

pub const NAME: &str = "retrieval_agent";

const DESCRIPTION: &str = "Agent that retrieves papers from arXiv with specific keywords.";

const INSTRUCTION: &str = "\
You are a professional research assistant that helps users find research papers with specific keywords.
Always follow these steps:
1. Call `get_keywords` to obtain the confirmed keywords from the shared session state.
2. Pass those keywords to `retrieve_papers` to fetch papers from arXiv.
3. Return a clear, numbered list of papers to the user. For each paper, show at least: title, authors,
   published year, and a short abstract based on the `abstract` field.
If `retrieve_papers` reports an `error`, tell the user what went wrong instead of listing papers.
";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeywordsOutput {
    pub status: String,
    pub keywords: Vec<String>,
}

/// Reads the keywords to search with from session state.
pub struct GetKeywords;

#[async_trait::async_trait]
impl TypedTool for GetKeywords {
    type Args = NoArgs;
    type Output = KeywordsOutput;

    const NAME: &'static str = "get_keywords";
    const DESCRIPTION: &'static str =
        "Read the confirmed keywords (or the latest proposal) from the shared session state.";

    async fn run(&self, _args: Self::Args, ctx: &ToolContext) -> Result<Self::Output, ToolError> {
        let keywords = ctx.state().await?.search_keywords();
        info!(?keywords, "[retrieval_agent.get_keywords]");
        Ok(KeywordsOutput {
            status: "success".to_string(),
            keywords,
        })
    }
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct RetrievePapersArgs {
    /// Keyword phrases to search for; empty uses the keywords in session state.
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Searches the paper source and stores the result set in session state.
pub struct RetrievePapers {
    source: Arc<dyn PaperSource>,
    max_results: usize,
}

impl RetrievePapers {
    pub fn new(source: Arc<dyn PaperSource>) -> Self {
        Self {
            source,
            max_results: MAX_RESULTS,
        }
    }
}

#[async_trait::async_trait]
impl TypedTool for RetrievePapers {
    type Args = RetrievePapersArgs;
    type Output = SearchReport;

    const NAME: &'static str = "retrieve_papers";
    const DESCRIPTION: &'static str = "Retrieve up to 10 papers from arXiv matching any of the \
        keywords, most relevant first.";

    async fn run(&self, args: Self::Args, ctx: &ToolContext) -> Result<Self::Output, ToolError> {
        let keywords = if args.keywords.iter().any(|keyword| !keyword.trim().is_empty()) {
            args.keywords
        } else {
            ctx.state().await?.search_keywords()
        };
        info!(?keywords, "[retrieval_agent.retrieve_papers] using keywords");

        let report = search_keywords(self.source.as_ref(), &keywords, self.max_results).await;
        if report.is_success() {
            ctx.apply(StateUpdate::StorePapers(report.papers.clone()))
                .await?;
        }
        Ok(report)
    }
}

pub fn agent(source: Arc<dyn PaperSource>) -> Result<LlmAgent, ToolSetBuildError> {
    let tools = ToolSet::new()
        .register_with(GetKeywords)
        .register_with(RetrievePapers::new(source))
        .build()?;
    Ok(LlmAgent::new(NAME, INSTRUCTION)
        .with_description(DESCRIPTION)
        .with_tools(tools))
}
