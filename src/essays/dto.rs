use serde::Deserialize;

use crate::{
    error::ApiError,
    store::{EssayDraft, TaskType},
};

/// Body of essay create/update requests.
#[derive(Debug, Default, Deserialize)]
pub struct SaveEssayRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub task_type: TaskType,
    #[serde(default, alias = "topic_text")]
    pub topic: Option<String>,
    #[serde(default)]
    pub content: String,
}

impl SaveEssayRequest {
    pub fn into_draft(self) -> Result<EssayDraft, ApiError> {
        let content = self.content.trim();
        if content.is_empty() {
            return Err(ApiError::BadRequest("Essay content is required".into()));
        }
        Ok(EssayDraft {
            title: non_blank(self.title),
            task_type: self.task_type,
            topic_text: non_blank(self.topic),
            content: content.to_string(),
        })
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    20
}

impl Pagination {
    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, 100), self.offset.max(0))
    }
}
