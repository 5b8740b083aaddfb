#![allow(dead_code)]

// All prompt constants for the completion gateway. Each operation pairs a
// system role with a user prompt that embeds the exact JSON schema the
// parser expects back.

use crate::models::matching::{CandidateContext, CandidateDoc};

/// System prompt for candidate/job matching — enforces JSON-only output.
pub const MATCH_SYSTEM: &str =
    "You are an expert AI research recruiter specializing in matching research work \
    to job requirements. Analyze the alignment between the research and the job needs. \
    Provide a match score (0-100), 3-5 specific alignment points, any gaps or missing \
    qualifications, and an overall relevance assessment. \
    Focus on technical skills, research areas, methodologies, and practical applications. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object.";

/// Match prompt template.
/// Replace: {paper_context}, {job_requirements}
const MATCH_PROMPT_TEMPLATE: &str = r#"Analyze this research work against the job requirements:

{paper_context}

Job Requirements:
{job_requirements}

Provide a JSON response with this exact structure:
{
  "matchScore": <number 0-100>,
  "alignment": [<array of 3-5 specific alignment points>],
  "gaps": [<array of any gaps or concerns>],
  "relevance": "<brief overall assessment>"
}"#;

pub fn match_prompt(doc: &CandidateDoc, job_requirements: &str) -> String {
    let topics = if doc.topics.is_empty() {
        "N/A".to_string()
    } else {
        doc.topics.join(", ")
    };
    let paper_context = format!(
        "Title: {}\nAuthors: {}\nTopics: {}\nAbstract: {}",
        doc.title,
        or_na(&doc.authors),
        topics,
        doc.abstract_text,
    );
    MATCH_PROMPT_TEMPLATE
        .replace("{paper_context}", &paper_context)
        .replace("{job_requirements}", job_requirements)
}

/// System prompt for candidate Q&A.
pub const QA_SYSTEM: &str =
    "You are an expert research analyst providing insights about researchers based on \
    their publications and background. Answer questions accurately using only the \
    provided context. Be honest about limitations: if information is not available, \
    say so. You MUST respond with valid JSON only.";

/// Q&A prompt template.
/// Replace: {researcher_context}, {question}
const QA_PROMPT_TEMPLATE: &str = r#"Based on this researcher's profile, answer the following question:

{researcher_context}

Question: {question}

Provide a JSON response with:
{
  "answer": "<detailed answer based on context>",
  "confidence": "<high/medium/low>",
  "sources": [<specific papers, experience items, or bio details used>]
}"#;

pub fn qa_prompt(question: &str, context: &CandidateContext) -> String {
    let papers = context
        .papers
        .iter()
        .enumerate()
        .map(|(i, p)| {
            if p.abstract_text.is_empty() {
                format!("{}. {}", i + 1, p.title)
            } else {
                format!("{}. {}\n   Abstract: {}", i + 1, p.title, p.abstract_text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    let researcher_context = format!(
        "Researcher: {}\nInstitution: {}\nBio: {}\n\nExperience:\n{}\n\nPublications:\n{}",
        context.name,
        or_na(&context.institution),
        or_na(&context.bio),
        if context.experience.is_empty() {
            "N/A".to_string()
        } else {
            context.experience.join("\n")
        },
        if papers.is_empty() { "N/A".to_string() } else { papers },
    );
    QA_PROMPT_TEMPLATE
        .replace("{researcher_context}", &researcher_context)
        .replace("{question}", question)
}

/// System prompt for open literature search.
pub const SEARCH_SYSTEM: &str =
    "You are a research paper search assistant. Find relevant academic papers for the \
    query, focusing on arXiv, Google Scholar, and GitHub. Return papers with title, \
    authors, abstract, URL, and a relevance score. \
    You MUST respond with valid JSON only.";

/// Search prompt template.
/// Replace: {query}, {limit}
const SEARCH_PROMPT_TEMPLATE: &str = r#"Find recent research papers related to: {query}

Provide a JSON response with:
{
  "papers": [
    {
      "title": "<paper title>",
      "authors": "<author names>",
      "abstract": "<brief abstract or summary>",
      "url": "<paper URL>",
      "relevance": <score 0-100>
    }
  ]
}

Return the {limit} most relevant papers."#;

pub fn search_prompt(query: &str, limit: usize) -> String {
    SEARCH_PROMPT_TEMPLATE
        .replace("{query}", query)
        .replace("{limit}", &limit.to_string())
}

/// System prompt for profile lookup — the highest-risk operation, so the
/// instructions lean hard on not inventing publications.
pub const PROFILE_SYSTEM: &str =
    "You are a research-profile assistant with access to academic search. Locate the \
    requested researcher on Google Scholar and arXiv and report their profile. \
    Only include papers where the researcher is actually listed as an author; \
    never invent publications. You MUST respond with valid JSON only.";

/// Profile prompt template.
/// Replace: {name}, {affiliation}, {limit}
const PROFILE_PROMPT_TEMPLATE: &str = r#"Find the researcher "{name}" affiliated with "{affiliation}".

Provide a JSON response with this exact structure:
{
  "name": "<full name>",
  "affiliation": "<institution>",
  "summary": "<3-4 paragraph professional summary of their research>",
  "topPapers": [
    {
      "title": "<paper title>",
      "authors": "<author line as printed on the paper>",
      "abstract": "<brief abstract>",
      "url": "<direct link to the paper>",
      "year": "<publication year>"
    }
  ]
}

Include up to {limit} of their most notable papers. Only include papers where
{name} appears in the author list."#;

pub fn profile_prompt(name: &str, affiliation: &str, limit: usize) -> String {
    PROFILE_PROMPT_TEMPLATE
        .replace("{name}", name)
        .replace("{affiliation}", affiliation)
        .replace("{limit}", &limit.to_string())
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() {
        "N/A"
    } else {
        value
    }
}
