use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::dto::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Submission};
use crate::{config::EvaluatorConfig, error::ApiError};

const SYSTEM_PROMPT: &str = "You are an IELTS examiner. \
Give band scores for Task Achievement, Coherence and Cohesion, \
Lexical Resource, and Grammatical Range and Accuracy, \
then an overall band based on IELTS writing marking criteria. \
At the end, you can add a little feedback for improvement. \
Be concise, bullet-pointed, no extra chatter.";

fn user_prompt(submission: &Submission) -> String {
    format!(
        "Task type: {}\n\nTopic: {}\n\nEssay:\n{}",
        submission.task_type, submission.topic, submission.essay
    )
}

#[derive(Debug, Error)]
pub enum EvaluateError {
    #[error("Missing SCORING_API_KEY env var")]
    MissingApiKey,

    #[error("upstream returned {status}")]
    Upstream { status: u16, body: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("unexpected upstream response: {0}")]
    Malformed(String),
}

impl From<EvaluateError> for ApiError {
    fn from(e: EvaluateError) -> Self {
        match e {
            EvaluateError::Upstream { body, .. } => ApiError::Upstream(body),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Client for the chat-completion service that grades essays.
pub struct Evaluator {
    http: Client,
    config: EvaluatorConfig,
}

impl Evaluator {
    pub fn new(config: EvaluatorConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("build scoring http client")?;
        Ok(Self { http, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Sends one scoring request and returns the first completion's text.
    /// No retries.
    #[instrument(skip_all, fields(task_type = %submission.task_type))]
    pub async fn evaluate(&self, submission: &Submission) -> Result<String, EvaluateError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(EvaluateError::MissingApiKey)?;

        let user = user_prompt(submission);
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
        };

        let resp = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            warn!(%status, "scoring service rejected request");
            return Err(EvaluateError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&text).map_err(|e| EvaluateError::Malformed(e.to_string()))?;
        let feedback = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| EvaluateError::Malformed("no completion content".into()))?;

        debug!(chars = feedback.len(), "feedback received");
        Ok(feedback)
    }
}
