//! Remote LLM client with bounded retry and exponential backoff.
//!
//! One logical [`LlmClient::ask`] call makes up to `max_attempts` HTTP
//! attempts. Only rate limiting (429), server errors (>= 500) and
//! network/timeout faults are retried; other client errors and
//! safety-filter blocks fail immediately with a descriptive reason. Every
//! failure path resolves to a tagged [`LlmReply`] — `ask` never returns an
//! error to the caller.

use crate::config::LlmConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Failure class used to pick the backoff curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// HTTP 429 or >= 500 — shorter backoff ceiling.
    Http,
    /// Connection error or per-attempt timeout — longer backoff ceiling.
    Network,
}

/// Terminal failure reasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmFailure {
    /// No credential configured. Not retried.
    MissingCredential,
    /// The provider's safety filter blocked the prompt. Not retried.
    SafetyBlocked(String),
    /// Non-retryable rejection (4xx other than 429, malformed response).
    Rejected(String),
    /// All attempts exhausted on retryable failures.
    Exhausted,
}

impl std::fmt::Display for LlmFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredential => write!(f, "LLM API key not configured"),
            Self::SafetyBlocked(reason) => {
                write!(f, "content blocked by safety filters ({reason})")
            }
            Self::Rejected(reason) => write!(f, "{reason}"),
            Self::Exhausted => write!(f, "failed after multiple retries"),
        }
    }
}

/// Result of one logical call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmOutcome {
    Answer(String),
    Failure(LlmFailure),
}

/// Reply from [`LlmClient::ask`], with attempt telemetry.
#[derive(Debug, Clone)]
pub struct LlmReply {
    pub outcome: LlmOutcome,
    /// Attempts actually made (1..=max_attempts).
    pub attempts: u32,
    /// Backoff delays that were applied between attempts.
    pub retry_delays: Vec<Duration>,
}

impl LlmReply {
    pub fn answer(&self) -> Option<&str> {
        match &self.outcome {
            LlmOutcome::Answer(text) => Some(text),
            LlmOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&LlmFailure> {
        match &self.outcome {
            LlmOutcome::Answer(_) => None,
            LlmOutcome::Failure(failure) => Some(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, LlmOutcome::Answer(_))
    }
}

/// Backoff before retry `attempt` (0-based count of completed attempts):
/// base doubling per attempt, clamped to the per-class ceiling.
pub fn backoff_delay(config: &LlmConfig, class: FailureClass, attempt: u32) -> Duration {
    let (base, cap) = match class {
        FailureClass::Http => (config.http_backoff_base_ms, config.http_backoff_cap_ms),
        FailureClass::Network => (
            config.network_backoff_base_ms,
            config.network_backoff_cap_ms,
        ),
    };
    let factor = 1u64 << attempt.min(16);
    Duration::from_millis(base.saturating_mul(factor).min(cap))
}

// -- Wire format --

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
}

impl GenerateResponse {
    fn answer_text(&self) -> Option<String> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.clone())
            .filter(|t| !t.is_empty())
    }

    fn error_message(&self) -> Option<String> {
        self.error.as_ref().and_then(|e| e.message.clone())
    }
}

/// Per-attempt outcome, internal to the retry loop.
enum Attempt {
    Answer(String),
    Fatal(LlmFailure),
    Retryable { class: FailureClass, reason: String },
}

/// HTTP client for the remote LLM endpoint.
pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn generate_url(&self, api_key: &str) -> String {
        let base = self.config.api_url.trim_end_matches('/');
        format!(
            "{base}/v1beta/models/{model}:generateContent?key={api_key}",
            model = self.config.api_model
        )
    }

    fn request_body(&self, prompt: &str) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_owned(),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.config.max_output_tokens,
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                top_k: self.config.top_k,
            },
        }
    }

    /// Ask the model a question.
    ///
    /// Performs a single logical call with bounded retries. All failure
    /// paths resolve to a tagged failure reply; this never panics and never
    /// returns `Err`.
    pub async fn ask(&self, prompt: &str) -> LlmReply {
        let api_key = match self.config.resolve_api_key() {
            Ok(key) => key,
            Err(_) => {
                return LlmReply {
                    outcome: LlmOutcome::Failure(LlmFailure::MissingCredential),
                    attempts: 0,
                    retry_delays: Vec::new(),
                };
            }
        };

        let url = self.generate_url(&api_key);
        let body = self.request_body(prompt);
        let max_attempts = self.config.max_attempts.max(1);
        let mut retry_delays = Vec::new();

        for attempt in 0..max_attempts {
            debug!(attempt = attempt + 1, max_attempts, "LLM attempt");
            let outcome = self.attempt(&url, &body).await;
            match outcome {
                Attempt::Answer(text) => {
                    info!(attempts = attempt + 1, "LLM answered");
                    return LlmReply {
                        outcome: LlmOutcome::Answer(text),
                        attempts: attempt + 1,
                        retry_delays,
                    };
                }
                Attempt::Fatal(failure) => {
                    warn!(attempts = attempt + 1, %failure, "LLM call failed (no retry)");
                    return LlmReply {
                        outcome: LlmOutcome::Failure(failure),
                        attempts: attempt + 1,
                        retry_delays,
                    };
                }
                Attempt::Retryable { class, reason } => {
                    if attempt + 1 == max_attempts {
                        warn!(attempts = max_attempts, reason, "LLM retries exhausted");
                        return LlmReply {
                            outcome: LlmOutcome::Failure(LlmFailure::Exhausted),
                            attempts: max_attempts,
                            retry_delays,
                        };
                    }
                    let delay = backoff_delay(&self.config, class, attempt);
                    warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        reason,
                        "LLM attempt failed, backing off"
                    );
                    retry_delays.push(delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }

        // Unreachable: the loop always returns. Kept for totality.
        LlmReply {
            outcome: LlmOutcome::Failure(LlmFailure::Exhausted),
            attempts: max_attempts,
            retry_delays,
        }
    }

    async fn attempt(&self, url: &str, body: &GenerateRequest) -> Attempt {
        let response = self
            .http
            .post(url)
            .json(body)
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                // Timeouts and connection faults share the network class.
                let reason = if e.is_timeout() {
                    "request timed out".to_owned()
                } else {
                    format!("connection error: {e}")
                };
                return Attempt::Retryable {
                    class: FailureClass::Network,
                    reason,
                };
            }
        };

        let status = response.status();
        let parsed: Option<GenerateResponse> = response.json().await.ok();

        if status.as_u16() == 429 || status.is_server_error() {
            let reason = parsed
                .as_ref()
                .and_then(GenerateResponse::error_message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Attempt::Retryable {
                class: FailureClass::Http,
                reason,
            };
        }

        if status.is_client_error() {
            let reason = parsed
                .as_ref()
                .and_then(GenerateResponse::error_message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Attempt::Fatal(LlmFailure::Rejected(format!("model error: {reason}")));
        }

        let Some(parsed) = parsed else {
            return Attempt::Fatal(LlmFailure::Rejected(
                "malformed response from model".to_owned(),
            ));
        };

        if let Some(text) = parsed.answer_text() {
            return Attempt::Answer(text);
        }

        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Attempt::Fatal(LlmFailure::SafetyBlocked(reason));
        }

        Attempt::Fatal(LlmFailure::Rejected("no response from model".to_owned()))
    }
}
