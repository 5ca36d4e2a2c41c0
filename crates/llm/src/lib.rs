//! Conversation planning via an OpenAI-compatible chat completion API
//!
//! - `ChatClient`: thin HTTP client with per-request deadlines
//! - prompt builders for the interviewer persona and resume summarization
//! - `ConversationPlanner`: turns user text plus session context into a
//!   list of message plans, coercing the model's raw output into the
//!   structured schema and falling back to a canned plan on any failure

pub mod client;
pub mod planner;
pub mod prompt;

pub use client::{ChatClient, CompletionModel};
pub use planner::{ConversationPlanner, PlannerContext};
pub use prompt::{ChatMessage, Role};
