//! Text improvement: pluggable, trait-based rewriter for CV prose.
//!
//! Default with an API key: `LlmTextImprover` (Claude via `llm_client`).
//! Without one: `DisabledImprover`, which refuses every request.
//!
//! `AppState` holds an `Arc<dyn TextImprover>`, chosen at startup from config.

pub mod handlers;
pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::prompts::NO_INVENTION_INSTRUCTION;
use crate::llm_client::LlmClient;

/// Longest input accepted, in characters.
pub const MAX_TEXT_CHARS: usize = 8_000;
const DEFAULT_LANGUAGE: &str = "the same language as the text";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImproveKind {
    Summary,
    Experience,
    Project,
    #[default]
    Generic,
}

impl ImproveKind {
    fn label(&self) -> &'static str {
        match self {
            ImproveKind::Summary => "professional summary",
            ImproveKind::Experience => "work experience description",
            ImproveKind::Project => "project description",
            ImproveKind::Generic => "text",
        }
    }

    fn guidelines(&self) -> &'static str {
        match self {
            ImproveKind::Summary => prompts::SUMMARY_GUIDELINES,
            ImproveKind::Experience => prompts::EXPERIENCE_GUIDELINES,
            ImproveKind::Project => prompts::PROJECT_GUIDELINES,
            ImproveKind::Generic => prompts::GENERIC_GUIDELINES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImproveRequest {
    pub text: String,
    #[serde(default)]
    pub kind: ImproveKind,
    /// Output language, e.g. "English". Defaults to the input's language.
    pub language: Option<String>,
}

impl ImproveRequest {
    /// Rejects empty and oversized input.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.text.trim().is_empty() {
            return Err(AppError::Validation("text must not be empty".to_string()));
        }
        let chars = self.text.chars().count();
        if chars > MAX_TEXT_CHARS {
            return Err(AppError::Validation(format!(
                "text is too long: {chars} characters (max {MAX_TEXT_CHARS})"
            )));
        }
        Ok(())
    }

    fn prompt(&self) -> String {
        let language = self
            .language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE);
        prompts::IMPROVE_PROMPT_TEMPLATE
            .replace("{kind_label}", self.kind.label())
            .replace("{guidelines}", self.kind.guidelines())
            .replace("{language}", language)
            .replace("{no_invention}", NO_INVENTION_INSTRUCTION)
            .replace("{text}", self.text.trim())
    }
}

/// The improver trait. Implement this to swap backends without touching
/// the endpoint or handler code.
///
/// Carried in `AppState` as `Arc<dyn TextImprover>`.
#[async_trait]
pub trait TextImprover: Send + Sync {
    async fn improve(&self, request: &ImproveRequest) -> Result<String, AppError>;

    /// Backend name reported to callers ("llm" | "disabled").
    fn backend(&self) -> &'static str;
}

#[derive(Debug, Deserialize)]
struct ImprovedText {
    text: String,
}

/// Rewrites text through Claude.
pub struct LlmTextImprover(pub LlmClient);

#[async_trait]
impl TextImprover for LlmTextImprover {
    async fn improve(&self, request: &ImproveRequest) -> Result<String, AppError> {
        request.validate()?;

        let reply: ImprovedText = self
            .0
            .call_json(&request.prompt(), prompts::IMPROVE_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(e.to_string()))?;

        let text = reply.text.trim();
        if text.is_empty() {
            return Err(AppError::Llm("model returned empty text".to_string()));
        }
        info!(kind = ?request.kind, chars = text.chars().count(), "Improved CV text");
        Ok(text.to_string())
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

/// Used when no API key is configured.
pub struct DisabledImprover;

#[async_trait]
impl TextImprover for DisabledImprover {
    async fn improve(&self, request: &ImproveRequest) -> Result<String, AppError> {
        request.validate()?;
        Err(AppError::LlmUnavailable)
    }

    fn backend(&self) -> &'static str {
        "disabled"
    }
}
