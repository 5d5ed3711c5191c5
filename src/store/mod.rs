use async_trait::async_trait;
use uuid::Uuid;

mod memory;
mod postgres;
mod sessions;
pub mod types;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use sessions::PgSessionStore;
pub use types::{
    Account, ClientInfo, Essay, EssayDraft, LoginActivity, NewAccount, Profile, TaskType,
};

/// `create_account` fails with this when the username is already registered.
#[derive(Debug, thiserror::Error)]
#[error("username already taken")]
pub struct UsernameTaken;

/// Record storage behind the web handlers.
///
/// Accounts are created here but otherwise treated as read-only identity
/// records. Profile, login activity and essays hang off an account and go
/// away with it.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_account_by_username(&self, username: &str) -> anyhow::Result<Option<Account>>;
    async fn find_account(&self, id: Uuid) -> anyhow::Result<Option<Account>>;
    async fn username_exists(&self, username: &str) -> anyhow::Result<bool>;
    /// Create an account together with its empty profile. A duplicate
    /// username is reported as [`UsernameTaken`].
    async fn create_account(&self, new: NewAccount) -> anyhow::Result<Account>;

    async fn get_profile(&self, user_id: Uuid) -> anyhow::Result<Option<Profile>>;
    /// Stamp the profile with the metadata of a successful login.
    async fn record_login(&self, user_id: Uuid, client: &ClientInfo) -> anyhow::Result<Profile>;

    async fn append_login_activity(
        &self,
        user_id: Uuid,
        client: &ClientInfo,
        success: bool,
    ) -> anyhow::Result<LoginActivity>;
    /// Newest first.
    async fn list_login_activity(&self, user_id: Uuid, limit: i64)
        -> anyhow::Result<Vec<LoginActivity>>;

    async fn create_essay(&self, user_id: Uuid, draft: &EssayDraft) -> anyhow::Result<Essay>;
    /// Most recently updated first.
    async fn list_essays(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Essay>>;
    async fn get_essay(&self, user_id: Uuid, essay_id: Uuid) -> anyhow::Result<Option<Essay>>;
    async fn update_essay(
        &self,
        user_id: Uuid,
        essay_id: Uuid,
        draft: &EssayDraft,
    ) -> anyhow::Result<Option<Essay>>;
    async fn delete_essay(&self, user_id: Uuid, essay_id: Uuid) -> anyhow::Result<bool>;
}
