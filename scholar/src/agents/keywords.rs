use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use scholar_agent::{LlmAgent, ToolContext, ToolError, ToolSet, ToolSetBuildError, TypedTool};
use scholar_core::StateUpdate;
use tracing::{info, warn};

use crate::confirmation::check_confirmation;

pub const NAME: &str = "keywords_agent";

const DESCRIPTION: &str = "Agent that iteratively proposes and confirms search keywords.";

const INSTRUCTION: &str = "\
You are a professional research assistant that helps users choose keywords for searching
academic papers.

Conversation flow:
1. Analyze the user's query and propose 2-4 concise keywords or short phrases (use a numbered list).
2. Ask whether the user wants to search with those keywords. If they decline, ask clarifying
   questions and then suggest a revised list.
3. Whenever you present a draft list, call the `save_keywords` tool with confirmed=false.
4. When the user explicitly confirms the keywords, call `save_keywords` with confirmed=true and finish
   with: `FINAL KEYWORDS: keyword1, keyword2, ...`.
5. Remind the user to confirm the keywords before the retrieval agent starts to work.
6. Do NOT output FINAL KEYWORDS until the user confirms. If `save_keywords` answers with
   status \"rejected\", the confirmation was not accepted: ask the user to confirm.

Confirmation signals include:
- The user says 'OK', 'ok', 'yes' or 'y'.
- The user repeats one of the suggested keywords and says they want to use it.
- The user says sentences like \"the confirmed keyword is ...\", or \"I would like to start with ...\".
";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SaveKeywordsArgs {
    /// Keyword phrases, most important first.
    pub keywords: Vec<String>,
    /// True only when the user explicitly approved this list.
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordStatus {
    Suggested,
    Confirmed,
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveKeywordsOutput {
    pub status: KeywordStatus,
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Records a proposed or confirmed keyword list in session state.
pub struct SaveKeywords;

#[async_trait::async_trait]
impl TypedTool for SaveKeywords {
    type Args = SaveKeywordsArgs;
    type Output = SaveKeywordsOutput;

    const NAME: &'static str = "save_keywords";
    const DESCRIPTION: &'static str = "Save suggested or confirmed keywords into the shared \
        session state. Use confirmed=false for every draft list and confirmed=true only after \
        the user explicitly approved it.";

    async fn run(&self, args: Self::Args, ctx: &ToolContext) -> Result<Self::Output, ToolError> {
        let keywords: Vec<String> = args
            .keywords
            .into_iter()
            .map(|keyword| keyword.trim().to_string())
            .filter(|keyword| !keyword.is_empty())
            .collect();
        if keywords.is_empty() {
            return Err(ToolError::InvalidInput(
                "keywords must contain at least one non-empty phrase".to_string(),
            ));
        }

        if !args.confirmed {
            ctx.apply(StateUpdate::ProposeKeywords {
                keywords: keywords.clone(),
                turn: ctx.turn,
            })
            .await?;
            info!(status = "suggested", ?keywords, "[keywords_agent.save_keywords]");
            return Ok(SaveKeywordsOutput {
                status: KeywordStatus::Suggested,
                keywords,
                error: None,
            });
        }

        let state = ctx.state().await?;
        match check_confirmation(&state, ctx.turn, &ctx.user_input, &keywords) {
            Ok(signal) => {
                ctx.apply(StateUpdate::ConfirmKeywords {
                    keywords: keywords.clone(),
                })
                .await?;
                info!(status = "confirmed", ?keywords, ?signal, "[keywords_agent.save_keywords]");
                Ok(SaveKeywordsOutput {
                    status: KeywordStatus::Confirmed,
                    keywords,
                    error: None,
                })
            }
            Err(reason) => {
                ctx.apply(StateUpdate::ProposeKeywords {
                    keywords: keywords.clone(),
                    turn: ctx.turn,
                })
                .await?;
                warn!(status = "rejected", ?keywords, %reason, "[keywords_agent.save_keywords]");
                Ok(SaveKeywordsOutput {
                    status: KeywordStatus::Rejected,
                    keywords,
                    error: Some(reason),
                })
            }
        }
    }
}

pub fn agent() -> Result<LlmAgent, ToolSetBuildError> {
    let tools = ToolSet::new().register_with(SaveKeywords).build()?;
    Ok(LlmAgent::new(NAME, INSTRUCTION)
        .with_description(DESCRIPTION)
        .with_tools(tools))
}
