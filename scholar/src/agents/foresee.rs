use serde::{Deserialize, Serialize};
use scholar_agent::{
    LlmAgent, NoArgs, ToolContext, ToolError, ToolSet, ToolSetBuildError, TypedTool,
};
use scholar_core::Paper;
use tracing::info;

pub const NAME: &str = "foresee_agent";

const DESCRIPTION: &str =
    "Agent that analyzes retrieved papers to summarize research trends and future directions.";

const INSTRUCTION: &str = "\
You are a professional and helpful research assistant.

Your tasks are:
1. Call the `get_retrieved_papers` tool to obtain the retrieved papers and their abstracts.
2. Analyze the abstracts to summarize:
   - the main research themes/topics,
   - the typical methods or approaches used,
   - the current research hotspots.
3. Based on this analysis, foresee 3-5 concrete future research directions.
   Make them specific and actionable (e.g., \"Apply X methodology to problem Y in population Z\",
   rather than vague statements).
4. Present your answer in a clear structure, for example:
   ## Current Research Themes
   1. ...

   ## Research Hotspots
   - ...

   ## Possible Future Directions
   1. ...

Always ground your analysis in the given abstracts. If no papers are available, briefly explain
that to the user instead of guessing.
";

pub const NO_PAPERS_NOTE: &str = "No papers were retrieved in this session. Tell the user that \
    there is nothing to analyze and do not invent themes or directions.";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPapersOutput {
    pub status: String,
    pub total: usize,
    pub abstracts: Vec<String>,
    pub papers: Vec<Paper>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Reads the papers stored by the retrieval phase. Never fetches.
pub struct GetRetrievedPapers;

#[async_trait::async_trait]
impl TypedTool for GetRetrievedPapers {
    type Args = NoArgs;
    type Output = RetrievedPapersOutput;

    const NAME: &'static str = "get_retrieved_papers";
    const DESCRIPTION: &'static str =
        "Read the papers retrieved earlier in this session from the shared session state.";

    async fn run(&self, _args: Self::Args, ctx: &ToolContext) -> Result<Self::Output, ToolError> {
        let papers = ctx.state().await?.papers().to_vec();
        let abstracts = papers
            .iter()
            .filter(|paper| paper.has_abstract())
            .map(|paper| paper.abstract_text.clone())
            .collect();
        info!(total = papers.len(), "[foresee_agent.get_retrieved_papers]");

        Ok(RetrievedPapersOutput {
            status: "success".to_string(),
            total: papers.len(),
            abstracts,
            note: papers.is_empty().then(|| NO_PAPERS_NOTE.to_string()),
            papers,
        })
    }
}

pub fn agent() -> Result<LlmAgent, ToolSetBuildError> {
    let tools = ToolSet::new().register_with(GetRetrievedPapers).build()?;
    Ok(LlmAgent::new(NAME, INSTRUCTION)
        .with_description(DESCRIPTION)
        .with_tools(tools))
}
