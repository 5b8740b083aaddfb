//! Completion gateway — the single point of entry for all calls to the
//! external completion service.
//!
//! ARCHITECTURAL RULE: no other module may issue requests to the completion
//! service directly. Every operation goes through [`CompletionGateway`],
//! which builds the prompt pair, performs exactly one round trip, and parses
//! the free-text reply into a typed result.
//!
//! There is deliberately no retry logic: the upstream is non-deterministic,
//! so a blind retry of a malformed reply is as likely to produce a different
//! malformed reply as a correct one. Fallback policy belongs to callers.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

pub mod cache;
pub mod parse;
pub mod prompts;

use crate::config::Config;
use crate::models::candidate::Paper;
use crate::models::matching::{
    CandidateContext, CandidateDoc, Citation, Confidence, FoundPaper, MatchResult, QaResult,
    RawProfile, SearchResult,
};
use self::cache::ResponseCache;
use self::parse::{clamp_score, extract_json_object, number_field, string_array, string_field};

/// Hard upper bound on papers per profile fetch, regardless of caller input.
pub const MAX_PROFILE_PAPERS: usize = 20;

const TEMPERATURE: f32 = 0.2;
const SEARCH_DOMAINS: &[&str] = &["arxiv.org", "scholar.google.com", "github.com"];
const REQUEST_TIMEOUT_SECS: u64 = 120;
/// Raw reply text attached to parse errors is capped at this many bytes so
/// diagnostics stay readable.
const RAW_DIAGNOSTIC_LIMIT: usize = 600;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("no JSON object in completion reply: {raw}")]
    Parse { raw: String },

    #[error("completion reply shape mismatch: {0}")]
    Json(#[from] serde_json::Error),

    #[error("completion reply had no text content")]
    EmptyContent,
}

impl CompletionError {
    /// Builds a parse error carrying (a bounded slice of) the raw reply.
    pub fn parse(raw: &str) -> Self {
        let mut end = raw.len().min(RAW_DIAGNOSTIC_LIMIT);
        while !raw.is_char_boundary(end) {
            end -= 1;
        }
        CompletionError::Parse {
            raw: raw[..end].to_string(),
        }
    }

    /// True for the parse class of failures (reply arrived but was garbage),
    /// false for the upstream-unavailable class (network/auth/5xx).
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            CompletionError::Parse { .. }
                | CompletionError::Json(_)
                | CompletionError::EmptyContent
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    return_citations: bool,
    search_domain_filter: &'a [&'a str],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    citations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// One completion: the reply text plus the flat citation-URL list the
/// service attaches opportunistically.
struct Completion {
    content: String,
    citations: Vec<Citation>,
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP client
// ────────────────────────────────────────────────────────────────────────────

/// Thin wrapper around the completion service's chat endpoint.
/// One POST per operation; the reply's first choice is the result.
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl CompletionClient {
    pub fn new(config: &Config) -> Self {
        CompletionClient {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: config.completion_base_url.clone(),
            api_key: config.completion_api_key.clone(),
            model: config.completion_model.clone(),
            max_tokens: config.completion_max_tokens,
        }
    }

    async fn chat(&self, system: &str, user: &str) -> Result<Completion, CompletionError> {
        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: TEMPERATURE,
            return_citations: true,
            search_domain_filter: SEARCH_DOMAINS,
        };

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("completion API returned {status}: {message}");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: ChatResponse = response.json().await?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(CompletionError::EmptyContent)?;

        debug!(
            "completion call succeeded: {} reply bytes, {} citations",
            content.len(),
            reply.citations.len()
        );

        Ok(Completion {
            content,
            citations: reply.citations.into_iter().map(Citation::bare).collect(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gateway trait + production implementation
// ────────────────────────────────────────────────────────────────────────────

/// The four operations the pipeline delegates to the completion service.
///
/// Carried in `AppState` as `Arc<dyn CompletionGateway>` so tests and
/// alternative backends can be injected without touching callers.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Scores a candidate document against a job description.
    /// Raises the parse class of error when the reply has no usable JSON;
    /// the caller decides fallback policy — never retry blindly.
    async fn match_candidate_to_job(
        &self,
        doc: &CandidateDoc,
        job_text: &str,
    ) -> Result<MatchResult, CompletionError>;

    /// Answers a free-form question about a candidate.
    async fn answer_question(
        &self,
        question: &str,
        context: &CandidateContext,
    ) -> Result<QaResult, CompletionError>;

    /// Open literature search. Returned relevance scores are untrusted.
    async fn search_literature(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<SearchResult, CompletionError>;

    /// Fetches a researcher profile from the external literature index.
    ///
    /// `paper_limit` is clamped to 1..=[`MAX_PROFILE_PAPERS`]. On parse
    /// failure this operation surfaces the error to the caller — it must
    /// never substitute synthetic data, because a fabricated profile can be
    /// persisted and presented as fact.
    async fn fetch_profile(
        &self,
        name: &str,
        affiliation: &str,
        paper_limit: usize,
    ) -> Result<RawProfile, CompletionError>;
}

/// Production gateway: Perplexity-style chat completions with a
/// constructor-injected response cache. Every operation is memoized by
/// (operation, parameters) for the cache's TTL.
pub struct PerplexityGateway {
    client: CompletionClient,
    cache: ResponseCache,
}

impl PerplexityGateway {
    pub fn new(client: CompletionClient, cache: ResponseCache) -> Self {
        PerplexityGateway { client, cache }
    }

    fn cached<T: serde::de::DeserializeOwned>(&self, operation: &str, params: &Value) -> Option<T> {
        let hit = self.cache.get(operation, params)?;
        serde_json::from_value(hit).ok()
    }

    fn store<T: Serialize>(&self, operation: &str, params: &Value, result: &T) {
        match serde_json::to_value(result) {
            Ok(payload) => self.cache.set(operation, params, payload),
            Err(e) => warn!("failed to serialize {operation} result for cache: {e}"),
        }
    }
}

#[async_trait]
impl CompletionGateway for PerplexityGateway {
    async fn match_candidate_to_job(
        &self,
        doc: &CandidateDoc,
        job_text: &str,
    ) -> Result<MatchResult, CompletionError> {
        let params = json!({ "doc": doc, "job": job_text });
        if let Some(hit) = self.cached("match_candidate_to_job", &params) {
            return Ok(hit);
        }

        let completion = self
            .client
            .chat(prompts::MATCH_SYSTEM, &prompts::match_prompt(doc, job_text))
            .await?;
        let object = extract_json_object(&completion.content)?;

        let mut alignment = string_array(&object, "alignment");
        alignment.truncate(5);
        let result = MatchResult {
            score: number_field(&object, "matchScore")
                .map(clamp_score)
                .unwrap_or(0),
            alignment,
            gaps: string_array(&object, "gaps"),
            relevance: string_field(&object, "relevance"),
            citations: completion.citations,
            used_fallback: false,
        };

        self.store("match_candidate_to_job", &params, &result);
        Ok(result)
    }

    async fn answer_question(
        &self,
        question: &str,
        context: &CandidateContext,
    ) -> Result<QaResult, CompletionError> {
        let params = json!({ "question": question, "context": context });
        if let Some(hit) = self.cached("answer_question", &params) {
            return Ok(hit);
        }

        let completion = self
            .client
            .chat(prompts::QA_SYSTEM, &prompts::qa_prompt(question, context))
            .await?;
        let object = extract_json_object(&completion.content)?;

        let result = QaResult {
            answer: string_field(&object, "answer"),
            confidence: Confidence::from_loose(&string_field(&object, "confidence")),
            sources: string_array(&object, "sources"),
            citations: completion.citations,
            used_fallback: false,
        };

        self.store("answer_question", &params, &result);
        Ok(result)
    }

    async fn search_literature(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<SearchResult, CompletionError> {
        let params = json!({ "query": query, "limit": limit });
        if let Some(hit) = self.cached("search_literature", &params) {
            return Ok(hit);
        }

        let completion = self
            .client
            .chat(prompts::SEARCH_SYSTEM, &prompts::search_prompt(query, limit))
            .await?;
        let object = extract_json_object(&completion.content)?;

        let mut papers: Vec<FoundPaper> = object
            .get("papers")
            .cloned()
            .map(parse_found_papers)
            .unwrap_or_default();
        papers.truncate(limit);

        let result = SearchResult {
            papers,
            citations: completion.citations,
            used_fallback: false,
        };

        self.store("search_literature", &params, &result);
        Ok(result)
    }

    async fn fetch_profile(
        &self,
        name: &str,
        affiliation: &str,
        paper_limit: usize,
    ) -> Result<RawProfile, CompletionError> {
        let limit = paper_limit.clamp(1, MAX_PROFILE_PAPERS);
        let params = json!({ "name": name, "affiliation": affiliation, "limit": limit });
        if let Some(hit) = self.cached("fetch_profile", &params) {
            return Ok(hit);
        }

        let completion = self
            .client
            .chat(
                prompts::PROFILE_SYSTEM,
                &prompts::profile_prompt(name, affiliation, limit),
            )
            .await?;
        // Parse failures surface here — never mock data for profiles.
        let object = extract_json_object(&completion.content)?;

        let mut top_papers: Vec<Paper> = match object.get("topPapers") {
            Some(value) => serde_json::from_value(value.clone())?,
            None => Vec::new(),
        };
        top_papers.truncate(limit);

        let result = RawProfile {
            name: non_empty_or(string_field(&object, "name"), name),
            affiliation: non_empty_or(string_field(&object, "affiliation"), affiliation),
            summary: string_field(&object, "summary"),
            top_papers,
            citations: completion.citations,
        };

        self.store("fetch_profile", &params, &result);
        Ok(result)
    }
}

/// Decodes the search reply's paper array, skipping malformed entries
/// instead of failing the whole reply, and clamping relevance scores.
fn parse_found_papers(value: Value) -> Vec<FoundPaper> {
    #[derive(Deserialize)]
    struct LoosePaper {
        #[serde(default)]
        title: String,
        #[serde(default)]
        authors: String,
        #[serde(rename = "abstract", default)]
        abstract_text: String,
        #[serde(default)]
        url: String,
        #[serde(default)]
        relevance: f64,
    }

    let Value::Array(items) = value else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<LoosePaper>(item).ok())
        .filter(|paper| !paper.title.trim().is_empty())
        .map(|paper| FoundPaper {
            title: paper.title,
            authors: paper.authors,
            abstract_text: paper.abstract_text,
            url: paper.url,
            relevance: clamp_score(paper.relevance),
        })
        .collect()
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}
