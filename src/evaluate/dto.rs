use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const DEFAULT_TASK_TYPE: &str = "task2";

/// Body of `POST /api/evaluate/`.
#[derive(Debug, Default, Deserialize)]
pub struct EvaluateRequest {
    #[serde(default)]
    pub essay: Option<String>,
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
}

/// A checked evaluation request: essay and topic trimmed, defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub essay: String,
    pub task_type: String,
    pub topic: String,
}

impl EvaluateRequest {
    pub fn into_submission(self) -> Result<Submission, ApiError> {
        let essay = self.essay.as_deref().unwrap_or_default().trim();
        if essay.is_empty() {
            return Err(ApiError::BadRequest("Empty essay".into()));
        }
        Ok(Submission {
            essay: essay.to_string(),
            task_type: self
                .task_type
                .unwrap_or_else(|| DEFAULT_TASK_TYPE.to_string()),
            topic: self.topic.as_deref().unwrap_or_default().trim().to_string(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluateResponse {
    pub feedback: String,
}

// --- upstream chat-completion wire format ---

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> EvaluateRequest {
        serde_json::from_str(body).expect("valid request json")
    }

    #[test]
    fn defaults_apply_when_fields_are_missing() {
        let sub = parse(r#"{"essay": "  Cities grow.  "}"#)
            .into_submission()
            .unwrap();
        assert_eq!(sub.essay, "Cities grow.");
        assert_eq!(sub.task_type, "task2");
        assert_eq!(sub.topic, "");
    }

    #[test]
    fn explicit_fields_are_kept() {
        let sub = parse(r#"{"essay": "Text", "task_type": "task1", "topic": " Bar chart "}"#)
            .into_submission()
            .unwrap();
        assert_eq!(sub.task_type, "task1");
        assert_eq!(sub.topic, "Bar chart");
    }

    #[test]
    fn blank_or_missing_essay_is_rejected() {
        for body in [r#"{}"#, r#"{"essay": null}"#, r#"{"essay": ""}"#, r#"{"essay": " \n\t "}"#] {
            let err = parse(body).into_submission().unwrap_err();
            assert_eq!(err.to_string(), "Empty essay");
        }
    }

    #[test]
    fn non_string_essay_does_not_parse() {
        assert!(serde_json::from_str::<EvaluateRequest>(r#"{"essay": 42}"#).is_err());
        assert!(serde_json::from_str::<EvaluateRequest>(r#""just a string""#).is_err());
    }
}
