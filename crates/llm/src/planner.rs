//! Conversation planner
//!
//! Turns user text plus session context into a non-empty list of message
//! plans. The model's raw output is coerced into the structured schema;
//! any failure degrades to a fixed default plan so downstream stages
//! always receive a well-formed list.

use std::sync::Arc;

use serde::Deserialize;

use avatar_core::{Error, MessagePlan, ResumeSummary, Result, Turn};

use crate::client::CompletionModel;
use crate::prompt;

/// Context for one planning call
pub struct PlannerContext<'a> {
    pub user_name: &'a str,
    pub resume_summary: &'a ResumeSummary,
    pub first_greeted: bool,
    pub history: &'a [Turn],
}

impl Default for PlannerContext<'_> {
    fn default() -> Self {
        static ANONYMOUS_SUMMARY: std::sync::OnceLock<ResumeSummary> = std::sync::OnceLock::new();
        Self {
            user_name: "candidate",
            resume_summary: ANONYMOUS_SUMMARY.get_or_init(ResumeSummary::default),
            first_greeted: false,
            history: &[],
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlanResponse {
    messages: Vec<MessagePlan>,
}

/// Plans interview turns through a completion model
pub struct ConversationPlanner {
    model: Arc<dyn CompletionModel>,
}

impl ConversationPlanner {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    /// Plan the assistant's next turn
    ///
    /// Never fails: any model or coercion error is logged and replaced
    /// with the default plan. Returns the plans plus a flag telling the
    /// caller whether planning actually succeeded (session state is only
    /// mutated on success).
    pub async fn plan(&self, question: &str, ctx: &PlannerContext<'_>) -> (Vec<MessagePlan>, bool) {
        let messages = prompt::interview_messages(
            ctx.user_name,
            ctx.resume_summary,
            ctx.first_greeted,
            ctx.history,
            question,
        );

        match self.try_plan(&messages).await {
            Ok(plans) => (plans, true),
            Err(e) => {
                tracing::warn!("planning failed, substituting default plan: {e}");
                (default_plan(), false)
            }
        }
    }

    async fn try_plan(&self, messages: &[prompt::ChatMessage]) -> Result<Vec<MessagePlan>> {
        let raw = self.model.complete(messages).await?;
        let response: PlanResponse = coerce_json(&raw)?;
        if response.messages.is_empty() {
            return Err(Error::Llm("model returned an empty plan list".to_string()));
        }
        Ok(response.messages)
    }

    /// Summarize raw resume text into the structured schema
    pub async fn summarize_resume(&self, raw_text: &str) -> Result<ResumeSummary> {
        let messages = prompt::resume_messages(raw_text);
        let raw = self.model.complete(&messages).await?;
        coerce_json(&raw)
    }
}

/// Fixed fallback plan used when planning fails
pub fn default_plan() -> Vec<MessagePlan> {
    vec![MessagePlan {
        text: "I'm sorry, I had trouble thinking of a response just now. \
               Could you please repeat that?"
            .to_string(),
        facial_expression: Default::default(),
        animation: Default::default(),
    }]
}

/// Coerce raw model output into a JSON value of type `T`
///
/// Models wrap JSON in Markdown fences or chat prose often enough that
/// we strip fences and then parse from the first `{` to the last `}`.
pub fn coerce_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T> {
    let trimmed = raw.trim();

    let unfenced = if let Some(stripped) = trimmed.strip_prefix("```") {
        // drop the info string ("json"), then the closing fence
        let body = stripped.split_once('\n').map(|(_, b)| b).unwrap_or(stripped);
        body.trim_end().trim_end_matches("```").trim()
    } else {
        trimmed
    };

    let start = unfenced.find('{');
    let end = unfenced.rfind('}');
    let candidate = match (start, end) {
        (Some(s), Some(e)) if s < e => &unfenced[s..=e],
        _ => {
            return Err(Error::Llm(format!(
                "model output contained no JSON object: {}",
                unfenced.chars().take(120).collect::<String>()
            )))
        }
    };

    serde_json::from_str(candidate)
        .map_err(|e| Error::Llm(format!("failed to coerce model output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use avatar_core::{Animation, FacialExpression};

    struct CannedModel(String);

    #[async_trait]
    impl CompletionModel for CannedModel {
        async fn complete(&self, _messages: &[prompt::ChatMessage]) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl CompletionModel for FailingModel {
        async fn complete(&self, _messages: &[prompt::ChatMessage]) -> Result<String> {
            Err(Error::Llm("upstream down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_plan_success() {
        let raw = r#"{"messages":[{"text":"Welcome!","facialExpression":"smile","animation":"TalkingOne"}]}"#;
        let planner = ConversationPlanner::new(Arc::new(CannedModel(raw.to_string())));
        let (plans, ok) = planner.plan("hello", &PlannerContext::default()).await;

        assert!(ok);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].facial_expression, FacialExpression::Smile);
        assert_eq!(plans[0].animation, Animation::TalkingOne);
    }

    #[tokio::test]
    async fn test_model_failure_degrades_to_default_plan() {
        let planner = ConversationPlanner::new(Arc::new(FailingModel));
        let (plans, ok) = planner.plan("hello", &PlannerContext::default()).await;

        assert!(!ok);
        assert_eq!(plans.len(), default_plan().len());
        assert_eq!(plans[0].text, default_plan()[0].text);
    }

    #[tokio::test]
    async fn test_empty_plan_list_degrades_to_default() {
        let planner =
            ConversationPlanner::new(Arc::new(CannedModel(r#"{"messages":[]}"#.to_string())));
        let (_, ok) = planner.plan("hello", &PlannerContext::default()).await;
        assert!(!ok);
    }

    #[test]
    fn test_coerce_fenced_json() {
        let raw = "```json\n{\"messages\":[{\"text\":\"hi\"}]}\n```";
        let parsed: PlanResponse = coerce_json(raw).unwrap();
        assert_eq!(parsed.messages.len(), 1);
    }

    #[test]
    fn test_coerce_json_with_prose() {
        let raw = "Sure! Here is the plan: {\"messages\":[{\"text\":\"hi\"}]} Hope that helps.";
        let parsed: PlanResponse = coerce_json(raw).unwrap();
        assert_eq!(parsed.messages[0].text, "hi");
    }

    #[test]
    fn test_coerce_rejects_non_json() {
        let result: Result<PlanResponse> = coerce_json("no json here");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_resume_summarization() {
        let raw = r#"{"name":"Asha","education":"B.Tech","skills":["Rust"],
                      "experience_summary":"intern","projects":["demo"],
                      "career_objective":"ML"}"#;
        let planner = ConversationPlanner::new(Arc::new(CannedModel(raw.to_string())));
        let summary = planner.summarize_resume("resume text").await.unwrap();
        assert_eq!(summary.name, "Asha");
        assert_eq!(summary.skills, vec!["Rust".to_string()]);
    }
}
