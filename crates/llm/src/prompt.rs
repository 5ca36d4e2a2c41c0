//! Prompt building for the interview avatar
//!
//! Constructs the interviewer persona system prompt and the resume
//! summarization prompt, both instructing the model to reply with
//! strict JSON matching our schemas.

use std::fmt;

use serde::{Deserialize, Serialize};

use avatar_core::{ResumeSummary, Turn, TurnRole};

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Chat message sent to the completion API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Format instructions describing the plan schema
pub const PLAN_FORMAT_INSTRUCTIONS: &str = r#"Respond ONLY with a JSON object of this exact shape:
{
  "messages": [
    {
      "text": "Text to be spoken by the AI",
      "facialExpression": "one of: smile, sad, angry, surprised, funnyFace, default",
      "animation": "one of: Idle, TalkingOne, TalkingThree, SadIdle, Defeated, Angry, Surprised, DismissingGesture, ThoughtfulHeadShake"
    }
  ]
}"#;

/// Format instructions describing the resume summary schema
pub const RESUME_FORMAT_INSTRUCTIONS: &str = r#"Respond ONLY with a JSON object of this exact shape:
{
  "name": "Candidate's full name",
  "education": "Summary of the candidate's education",
  "skills": ["list", "of", "key skills"],
  "experience_summary": "A brief summary of the candidate's work experience",
  "projects": ["list of key projects"],
  "career_objective": "The candidate's stated career objective"
}"#;

/// Build the interviewer system prompt
///
/// First contact (not yet greeted): introduce the interviewer, describe
/// the role, and open with questions drawn from the resume summary.
/// Subsequent turns: continue without re-introduction, referencing the
/// prior turns embedded in the chat history.
pub fn interview_system_prompt(
    user_name: &str,
    resume_summary: &ResumeSummary,
    first_greeted: bool,
) -> String {
    let resume_json =
        serde_json::to_string(resume_summary).unwrap_or_else(|_| "{}".to_string());

    format!(
        "You are Mottaiyan, a 22-year-old AI/ML hiring HR from AVASOFT with 2 years of experience.\n\
         You are conducting an interview for an AI/ML intern position.\n\
         \n\
         Context:\n\
         - userName: {user_name}\n\
         - userResumeSummary: {resume_json}\n\
         - firstGreeted: {first_greeted}\n\
         \n\
         Rules:\n\
         1. If firstGreeted is false:\n\
            - Greet the user once by name and introduce yourself.\n\
            - Briefly describe the company and the AI/ML intern role.\n\
            - Then ask 2-3 relevant opening questions directly from the resume summary (skills, education, or projects).\n\
         2. If firstGreeted is true:\n\
            - Continue the interview without re-introducing yourself.\n\
            - Reference prior chat history naturally.\n\
         3. Never hallucinate or invent details about the candidate.\n\
         4. Always respond in structured JSON:\n\
         {format_instructions}\n\
         \n\
         Maintain a professional tone and persona throughout.",
        user_name = user_name,
        resume_json = resume_json,
        first_greeted = first_greeted,
        format_instructions = PLAN_FORMAT_INSTRUCTIONS,
    )
}

/// Build the full message list for one planning call
pub fn interview_messages(
    user_name: &str,
    resume_summary: &ResumeSummary,
    first_greeted: bool,
    history: &[Turn],
    question: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(interview_system_prompt(
        user_name,
        resume_summary,
        first_greeted,
    )));

    for turn in history {
        messages.push(match turn.role {
            TurnRole::User => ChatMessage::user(turn.content.clone()),
            TurnRole::Assistant => ChatMessage::assistant(turn.content.clone()),
        });
    }

    messages.push(ChatMessage::user(question));
    messages
}

/// Build the resume summarization message list
pub fn resume_messages(raw_text: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(format!(
        "Summarize the following resume text into a structured JSON object.\n\
         {RESUME_FORMAT_INSTRUCTIONS}\n\
         \n\
         Resume Text:\n{raw_text}"
    ))]
}
