//! Matching engine — scores a single candidate against a job description
//! through the completion gateway.
//!
//! A whole profile is collapsed into one synthetic portfolio document before
//! scoring, so a multi-paper profile is judged as one coherent submission
//! rather than per-paper. The gateway's response cache provides the one
//! check/write around the call. No retries and no fallback here — the
//! caller decides recovery policy.

use crate::completion::{CompletionError, CompletionGateway};
use crate::models::candidate::StoredProfile;
use crate::models::matching::{CandidateContext, CandidateDoc, ContextPaper, MatchResult};

/// Collapses a profile into an abstract-like document:
/// title + summary + concatenated top paper titles.
pub fn portfolio_doc(profile: &StoredProfile) -> CandidateDoc {
    let titles = profile
        .top_papers
        .iter()
        .map(|p| p.title.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    CandidateDoc {
        title: format!("Research Portfolio of {}", profile.name),
        authors: profile.name.clone(),
        abstract_text: format!("{}\n\nTop Papers: {}", profile.summary, titles),
        topics: vec![],
    }
}

/// Q&A context view of a stored profile.
pub fn profile_context(profile: &StoredProfile) -> CandidateContext {
    CandidateContext {
        name: profile.name.clone(),
        institution: profile.affiliation.clone(),
        bio: profile.summary.clone(),
        experience: vec![],
        papers: profile
            .top_papers
            .iter()
            .map(|p| ContextPaper {
                title: p.title.clone(),
                abstract_text: p.abstract_text.clone(),
            })
            .collect(),
    }
}

/// Scores one candidate document against a job description. The gateway
/// memoizes by its input, so this call is the cache boundary.
pub async fn match_document(
    gateway: &dyn CompletionGateway,
    doc: &CandidateDoc,
    job_text: &str,
) -> Result<MatchResult, CompletionError> {
    gateway.match_candidate_to_job(doc, job_text).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::candidate::Paper;

    fn profile_with_papers(titles: &[&str]) -> StoredProfile {
        StoredProfile {
            id: "sarah-chen_stanford".to_string(),
            name: "Sarah Chen".to_string(),
            affiliation: "Stanford".to_string(),
            summary: "Works on scalable oversight.".to_string(),
            top_papers: titles
                .iter()
                .map(|t| Paper {
                    title: t.to_string(),
                    authors: "S. Chen".to_string(),
                    abstract_text: "abs".to_string(),
                    url: String::new(),
                    year: None,
                })
                .collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_portfolio_doc_concatenates_summary_and_titles() {
        let doc = portfolio_doc(&profile_with_papers(&["Debate at Scale", "Weak-to-Strong"]));
        assert_eq!(doc.title, "Research Portfolio of Sarah Chen");
        assert_eq!(doc.authors, "Sarah Chen");
        assert!(doc.abstract_text.contains("Works on scalable oversight."));
        assert!(doc
            .abstract_text
            .contains("Top Papers: Debate at Scale; Weak-to-Strong"));
    }

    #[test]
    fn test_profile_context_carries_papers_and_bio() {
        let context = profile_context(&profile_with_papers(&["Debate at Scale"]));
        assert_eq!(context.institution, "Stanford");
        assert_eq!(context.bio, "Works on scalable oversight.");
        assert_eq!(context.papers.len(), 1);
        assert_eq!(context.papers[0].title, "Debate at Scale");
    }
}
