//! Core types and traits for the interview avatar backend
//!
//! This crate provides foundational types used across all other crates:
//! - Message plans and assembled messages
//! - Lip-sync mouth cues
//! - Conversation turns
//! - Resume summaries
//! - Error types
//! - Trait seams for the synthesis pipeline

pub mod conversation;
pub mod error;
pub mod message;
pub mod resume;
pub mod traits;

pub use conversation::{Turn, TurnRole};
pub use error::{Error, Result};
pub use message::{Animation, AssembledMessage, FacialExpression, LipSync, MessagePlan, MouthCue};
pub use resume::ResumeSummary;
pub use traits::{CueExtractor, Synthesizer};
