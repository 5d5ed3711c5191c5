use serde::Deserialize;

pub const DEFAULT_SCORING_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_SCORING_MODEL: &str = "tngtech/deepseek-r1t2-chimera:free";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Idle lifetime; every write to the session pushes expiry out again.
    pub ttl_minutes: i64,
    pub cookie_secure: bool,
}

/// Settings for the external chat-completion service that scores essays.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluatorConfig {
    /// Bearer key; `None` turns every evaluation into a configuration error.
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_SCORING_URL.into(),
            model: DEFAULT_SCORING_MODEL.into(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub session: SessionConfig,
    pub evaluator: EvaluatorConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store = match std::env::var("STORE").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("postgres") | Err(_) => StoreBackend::Postgres,
            Ok(other) => anyhow::bail!("unknown STORE backend: {other}"),
        };
        let database_url = std::env::var("DATABASE_URL").ok();
        if store == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set for the postgres store");
        }

        let session = SessionConfig {
            ttl_minutes: std::env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
            cookie_secure: std::env::var("SESSION_COOKIE_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        };

        let evaluator = EvaluatorConfig {
            api_key: std::env::var("SCORING_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            endpoint: std::env::var("SCORING_API_URL")
                .unwrap_or_else(|_| DEFAULT_SCORING_URL.into()),
            model: std::env::var("SCORING_MODEL").unwrap_or_else(|_| DEFAULT_SCORING_MODEL.into()),
            timeout_secs: std::env::var("SCORING_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60),
        };

        Ok(Self {
            store,
            database_url,
            session,
            evaluator,
        })
    }
}
