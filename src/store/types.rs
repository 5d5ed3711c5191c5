use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Account record owned by the identity tables.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string, never exposed
    pub first_name: String,
    pub last_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

/// One-to-one extension of an account with last-login metadata.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub display_name: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login_at: Option<OffsetDateTime>,
    pub last_login_ip: Option<String>,
    pub last_login_user_agent: Option<String>,
}

impl Profile {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            display_name: None,
            last_login_at: None,
            last_login_ip: None,
            last_login_user_agent: None,
        }
    }
}

/// Append-only audit row for a login attempt.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoginActivity {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub occurred_at: OffsetDateTime,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
}

/// Where a request came from, as far as the headers and socket tell us.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Task1,
    Task2,
    #[default]
    Practice,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Task1 => "task1",
            TaskType::Task2 => "task2",
            TaskType::Practice => "practice",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task1" => Ok(TaskType::Task1),
            "task2" => Ok(TaskType::Task2),
            "practice" => Ok(TaskType::Practice),
            other => anyhow::bail!("unknown task type: {other}"),
        }
    }
}

/// Essay as stored in the database; `task_type` is kept as text.
#[derive(Debug, Clone, FromRow)]
pub struct EssayRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub task_type: String,
    pub topic_text: Option<String>,
    pub content: String,
    pub word_count: i32,
    pub character_count: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct Essay {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub task_type: TaskType,
    pub topic_text: Option<String>,
    pub content: String,
    pub word_count: i32,
    pub character_count: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TryFrom<EssayRow> for Essay {
    type Error = anyhow::Error;

    fn try_from(r: EssayRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            task_type: r.task_type.parse()?,
            topic_text: r.topic_text,
            content: r.content,
            word_count: r.word_count,
            character_count: r.character_count,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Validated essay fields ready to be written. Counts derive from `content`.
#[derive(Debug, Clone)]
pub struct EssayDraft {
    pub title: Option<String>,
    pub task_type: TaskType,
    pub topic_text: Option<String>,
    pub content: String,
}

impl EssayDraft {
    pub fn word_count(&self) -> i32 {
        clamp_count(self.content.split_whitespace().count())
    }

    pub fn character_count(&self) -> i32 {
        clamp_count(self.content.chars().count())
    }
}

fn clamp_count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}
