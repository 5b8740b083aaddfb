//! Fallback generator — deterministic, offline substitute for the
//! completion service's matching, Q&A, and search operations.
//!
//! Used when the service is unreachable or returns an unparseable reply, so
//! the user-facing flow degrades gracefully instead of failing outright.
//! Every output is tagged `used_fallback: true` so downstream consumers can
//! tell synthetic results from genuine upstream reasoning. Never used for
//! profile fetches — a fabricated profile is worse than an explicit failure.

use crate::models::matching::{
    CandidateContext, CandidateDoc, Citation, Confidence, MatchResult, QaResult, SearchResult,
};

pub const BASE_SCORE: u8 = 70;
pub const MAX_SCORE: u8 = 96;
const MIN_ALIGNMENT_POINTS: usize = 3;
const MAX_ALIGNMENT_POINTS: usize = 5;

/// Keyword groups scored when any term appears in BOTH the job text and the
/// candidate text.
const KEYWORD_RULES: &[(&[&str], u8)] = &[
    (&["ai safety", "safety", "alignment"], 10),
    (&["machine learning", "ml", "deep learning"], 8),
    (&["research", "phd", "publication"], 5),
    (&["scalable", "production", "deployment"], 7),
    (&["interpretability", "explainability"], 6),
    (&["oversight", "supervision", "monitoring"], 8),
];

/// Alignment phrases keyed by job-text keywords.
const ALIGNMENT_RULES: &[(&[&str], &str)] = &[
    (
        &["ai safety", "safety"],
        "Strong research focus on AI safety aligns with the role requirements",
    ),
    (
        &["scalable", "oversight"],
        "Demonstrated expertise in scalable oversight mechanisms",
    ),
    (
        &["research", "publication"],
        "Proven track record with peer-reviewed publications",
    ),
    (
        &["team", "collaboration"],
        "Evidence of collaborative research with cross-functional teams",
    ),
    (
        &["production", "industry"],
        "Research has practical applications in production systems",
    ),
];

const FILLER_ALIGNMENT: &str = "Technical expertise relevant to the role requirements";

const INDUSTRY_LABS: &[&str] = &[
    "openai",
    "deepmind",
    "google",
    "microsoft",
    "meta",
    "anthropic",
];

/// Flattens a candidate document into one lowercase haystack for keyword
/// matching.
pub fn candidate_text(doc: &CandidateDoc) -> String {
    format!(
        "{}\n{}\n{}",
        doc.title,
        doc.abstract_text,
        doc.topics.join(", ")
    )
}

/// Deterministic keyword-driven match: base score plus a point per matched
/// keyword group, capped at [`MAX_SCORE`]. Same inputs, same output.
pub fn fallback_match(candidate_text: &str, job_text: &str) -> MatchResult {
    let job = job_text.to_lowercase();
    let candidate = candidate_text.to_lowercase();

    let mut score = BASE_SCORE;
    for (terms, points) in KEYWORD_RULES {
        if terms
            .iter()
            .any(|term| job.contains(term) && candidate.contains(term))
        {
            score = score.saturating_add(*points);
        }
    }
    let score = score.min(MAX_SCORE);

    let mut alignment: Vec<String> = ALIGNMENT_RULES
        .iter()
        .filter(|(terms, _)| terms.iter().any(|term| job.contains(term)))
        .map(|(_, phrase)| phrase.to_string())
        .collect();
    while alignment.len() < MIN_ALIGNMENT_POINTS {
        alignment.push(FILLER_ALIGNMENT.to_string());
    }
    alignment.truncate(MAX_ALIGNMENT_POINTS);

    let mut gaps = Vec::new();
    if score < 90 {
        if score < 85 && !job.contains("industry") {
            gaps.push("Limited explicit industry experience mentioned in publications".to_string());
        }
        if job.contains("production") && !candidate.contains("production") {
            gaps.push(
                "Production deployment experience is not evident from the listed work".to_string(),
            );
        }
    }

    let strength = if score >= 85 { "strong" } else { "good" };
    let relevance = format!(
        "This work demonstrates {strength} alignment with the job requirements. \
        The research areas and technical depth appear well-suited for the role."
    );

    MatchResult {
        score,
        alignment,
        gaps,
        relevance,
        citations: canned_citations(),
        used_fallback: true,
    }
}

/// Deterministic keyword-routed Q&A substitute.
pub fn fallback_qa(question: &str, context: &CandidateContext) -> QaResult {
    let q = question.to_lowercase();
    let name = &context.name;
    let paper_count = context.papers.len();

    let (answer, confidence, sources): (String, Confidence, Vec<&str>) = if q.contains("industry") {
        let has_industry = context.experience.iter().any(|exp| {
            let exp = exp.to_lowercase();
            INDUSTRY_LABS.iter().any(|lab| exp.contains(lab))
        });
        if has_industry {
            (
                format!(
                    "Yes, {name} has industry experience: their background lists positions at \
                    major AI research organizations, which indicates hands-on work with \
                    production ML systems alongside industry teams."
                ),
                Confidence::High,
                vec!["Work experience section", "Professional background"],
            )
        } else {
            (
                format!(
                    "Based on the available profile, {name} appears to have primarily academic \
                    experience. Their publications show strong research capability, but explicit \
                    industry experience is not prominent in the profile."
                ),
                Confidence::Medium,
                vec!["Profile analysis"],
            )
        }
    } else if q.contains("production") || q.contains("ml systems") {
        (
            format!(
                "{name}'s published work discusses scalable approaches and deployment \
                considerations, suggesting hands-on exposure to production environments, \
                though the profile does not state this directly."
            ),
            Confidence::Medium,
            vec!["Research papers", "Abstract analysis"],
        )
    } else if q.contains("team") || q.contains("collaboration") || q.contains("lead") {
        (
            format!(
                "{name} has {paper_count} listed publications, typically with multiple \
                co-authors, indicating sustained collaboration with other researchers and \
                experience working in research teams."
            ),
            Confidence::High,
            vec!["Publication record", "Co-authorship patterns"],
        )
    } else if q.contains("programming") || q.contains("framework") || q.contains("code") {
        (
            format!(
                "{name} is likely proficient in the languages and frameworks common to their \
                research area; their papers imply hands-on implementation work, though specific \
                tooling is not listed in the profile."
            ),
            Confidence::Medium,
            vec!["Research methodology", "Technical papers"],
        )
    } else if q.contains("present") || q.contains("conference") || q.contains("speaking") {
        (
            format!(
                "{name} has published at peer-reviewed venues, which typically involves \
                presenting the work; the profile does not detail specific talk formats."
            ),
            Confidence::Medium,
            vec!["Conference publications"],
        )
    } else if q.contains("expertise") || q.contains("specialize") {
        let focus = context
            .papers
            .first()
            .map(|p| p.title.as_str())
            .unwrap_or("their published research");
        (
            format!(
                "{name}'s expertise centers on the areas represented by their publications, \
                most prominently \"{focus}\"."
            ),
            Confidence::High,
            vec!["Research papers", "Publication topics"],
        )
    } else {
        (
            format!(
                "Based on {name}'s profile ({paper_count} publications{}), they appear \
                well-qualified for research-focused roles. For specifics on \"{question}\", \
                review the publications directly or ask in an interview.",
                if context.institution.is_empty() {
                    String::new()
                } else {
                    format!(", {}", context.institution)
                }
            ),
            Confidence::Low,
            vec!["General profile analysis"],
        )
    };

    QaResult {
        answer,
        confidence,
        sources: sources.into_iter().map(str::to_string).collect(),
        citations: canned_citations(),
        used_fallback: true,
    }
}

/// Search has no offline substitute for real results: degrade to an empty,
/// clearly-tagged result rather than inventing papers.
pub fn fallback_search(_query: &str) -> SearchResult {
    SearchResult {
        papers: vec![],
        citations: vec![],
        used_fallback: true,
    }
}

fn canned_citations() -> Vec<Citation> {
    vec![
        Citation::titled(
            "https://scholar.google.com/citations",
            "Google Scholar - Research Citations",
        ),
        Citation::titled("https://arxiv.org", "arXiv - Research Papers"),
    ]
}
