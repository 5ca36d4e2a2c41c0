//! Resume summary produced by the language model

use serde::{Deserialize, Serialize};

/// Structured summary of an uploaded resume
///
/// The planner embeds this whole struct (as JSON) into the interview
/// system prompt so opening questions can reference real resume fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeSummary {
    /// Candidate's full name
    pub name: String,
    /// Summary of the candidate's education
    pub education: String,
    /// List of key skills
    pub skills: Vec<String>,
    /// Brief summary of work experience
    pub experience_summary: String,
    /// List of key projects
    pub projects: Vec<String>,
    /// Stated career objective
    pub career_objective: String,
}

impl Default for ResumeSummary {
    fn default() -> Self {
        Self {
            name: String::new(),
            education: String::new(),
            skills: Vec::new(),
            experience_summary: "No resume summary available.".to_string(),
            projects: Vec::new(),
            career_objective: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let summary = ResumeSummary {
            name: "Asha Rao".into(),
            education: "B.Tech CSE".into(),
            skills: vec!["Python".into(), "PyTorch".into()],
            experience_summary: "2 years ML engineering".into(),
            projects: vec!["Churn model".into()],
            career_objective: "ML research".into(),
        };
        let json = serde_json::to_string(&summary).unwrap();
        let back: ResumeSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }

    #[test]
    fn test_default_placeholder() {
        let summary = ResumeSummary::default();
        assert_eq!(summary.experience_summary, "No resume summary available.");
        assert!(summary.skills.is_empty());
    }
}
