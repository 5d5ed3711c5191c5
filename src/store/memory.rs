use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Account, ClientInfo, Essay, EssayDraft, LoginActivity, NewAccount, Profile, Store,
    UsernameTaken,
};

#[derive(Default)]
struct Inner {
    accounts: Vec<Account>,
    profiles: HashMap<Uuid, Profile>,
    // insertion order, oldest first
    activity: Vec<LoginActivity>,
    // last write at the end
    essays: Vec<Essay>,
}

/// Process-local store used by tests and `STORE=memory` runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_account_by_username(&self, username: &str) -> anyhow::Result<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner
            .accounts
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn find_account(&self, id: Uuid) -> anyhow::Result<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn username_exists(&self, username: &str) -> anyhow::Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.iter().any(|a| a.username == username))
    }

    async fn create_account(&self, new: NewAccount) -> anyhow::Result<Account> {
        let mut inner = self.inner.write().await;
        if inner.accounts.iter().any(|a| a.username == new.username) {
            return Err(UsernameTaken.into());
        }
        let account = Account {
            id: Uuid::new_v4(),
            username: new.username,
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            created_at: OffsetDateTime::now_utc(),
        };
        inner
            .profiles
            .insert(account.id, Profile::empty(account.id));
        inner.accounts.push(account.clone());
        Ok(account)
    }

    async fn get_profile(&self, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
        let inner = self.inner.read().await;
        Ok(inner.profiles.get(&user_id).cloned())
    }

    async fn record_login(&self, user_id: Uuid, client: &ClientInfo) -> anyhow::Result<Profile> {
        let mut inner = self.inner.write().await;
        if !inner.accounts.iter().any(|a| a.id == user_id) {
            anyhow::bail!("no account {user_id}");
        }
        let profile = inner
            .profiles
            .entry(user_id)
            .or_insert_with(|| Profile::empty(user_id));
        profile.last_login_at = Some(OffsetDateTime::now_utc());
        profile.last_login_ip = client.ip.clone();
        profile.last_login_user_agent = client.user_agent.clone();
        Ok(profile.clone())
    }

    async fn append_login_activity(
        &self,
        user_id: Uuid,
        client: &ClientInfo,
        success: bool,
    ) -> anyhow::Result<LoginActivity> {
        let mut inner = self.inner.write().await;
        if !inner.accounts.iter().any(|a| a.id == user_id) {
            anyhow::bail!("no account {user_id}");
        }
        let row = LoginActivity {
            id: Uuid::new_v4(),
            user_id,
            occurred_at: OffsetDateTime::now_utc(),
            ip_address: client.ip.clone(),
            user_agent: client.user_agent.clone(),
            success,
        };
        inner.activity.push(row.clone());
        Ok(row)
    }

    async fn list_login_activity(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> anyhow::Result<Vec<LoginActivity>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<LoginActivity> = inner
            .activity
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }

    async fn create_essay(&self, user_id: Uuid, draft: &EssayDraft) -> anyhow::Result<Essay> {
        let mut inner = self.inner.write().await;
        if !inner.accounts.iter().any(|a| a.id == user_id) {
            anyhow::bail!("no account {user_id}");
        }
        let now = OffsetDateTime::now_utc();
        let essay = Essay {
            id: Uuid::new_v4(),
            user_id,
            title: draft.title.clone(),
            task_type: draft.task_type,
            topic_text: draft.topic_text.clone(),
            content: draft.content.clone(),
            word_count: draft.word_count(),
            character_count: draft.character_count(),
            created_at: now,
            updated_at: now,
        };
        inner.essays.push(essay.clone());
        Ok(essay)
    }

    async fn list_essays(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Essay>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Essay> = inner
            .essays
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect())
    }

    async fn get_essay(&self, user_id: Uuid, essay_id: Uuid) -> anyhow::Result<Option<Essay>> {
        let inner = self.inner.read().await;
        Ok(inner
            .essays
            .iter()
            .find(|e| e.id == essay_id && e.user_id == user_id)
            .cloned())
    }

    async fn update_essay(
        &self,
        user_id: Uuid,
        essay_id: Uuid,
        draft: &EssayDraft,
    ) -> anyhow::Result<Option<Essay>> {
        let mut inner = self.inner.write().await;
        let Some(pos) = inner
            .essays
            .iter()
            .position(|e| e.id == essay_id && e.user_id == user_id)
        else {
            return Ok(None);
        };
        let mut essay = inner.essays.remove(pos);
        essay.title = draft.title.clone();
        essay.task_type = draft.task_type;
        essay.topic_text = draft.topic_text.clone();
        essay.content = draft.content.clone();
        essay.word_count = draft.word_count();
        essay.character_count = draft.character_count();
        essay.updated_at = OffsetDateTime::now_utc();
        inner.essays.push(essay.clone());
        Ok(Some(essay))
    }

    async fn delete_essay(&self, user_id: Uuid, essay_id: Uuid) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.essays.len();
        inner
            .essays
            .retain(|e| !(e.id == essay_id && e.user_id == user_id));
        Ok(inner.essays.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TaskType;

    async fn store_with_account(username: &str) -> (MemoryStore, Account) {
        let store = MemoryStore::new();
        let account = store
            .create_account(NewAccount {
                username: username.into(),
                password_hash: "hash".into(),
                first_name: "Test".into(),
                last_name: "User".into(),
            })
            .await
            .expect("create account");
        (store, account)
    }

    fn draft(content: &str) -> EssayDraft {
        EssayDraft {
            title: None,
            task_type: TaskType::Task2,
            topic_text: None,
            content: content.into(),
        }
    }

    #[tokio::test]
    async fn create_account_rejects_duplicate_username() {
        let (store, _) = store_with_account("amir").await;
        let dup = store
            .create_account(NewAccount {
                username: "amir".into(),
                password_hash: "other".into(),
                first_name: "A".into(),
                last_name: "B".into(),
            })
            .await;
        assert!(dup.unwrap_err().is::<UsernameTaken>());
        assert!(store.username_exists("amir").await.unwrap());
        assert!(!store.username_exists("AMIR").await.unwrap());
    }

    #[tokio::test]
    async fn signup_creates_empty_profile() {
        let (store, account) = store_with_account("li").await;
        let profile = store.get_profile(account.id).await.unwrap().expect("profile");
        assert!(profile.last_login_at.is_none());
        assert!(profile.last_login_ip.is_none());
    }

    #[tokio::test]
    async fn record_login_stamps_profile() {
        let (store, account) = store_with_account("li").await;
        let client = ClientInfo {
            ip: Some("203.0.113.9".into()),
            user_agent: Some("curl/8.0".into()),
        };
        let profile = store.record_login(account.id, &client).await.unwrap();
        assert!(profile.last_login_at.is_some());
        assert_eq!(profile.last_login_ip.as_deref(), Some("203.0.113.9"));
        assert_eq!(profile.last_login_user_agent.as_deref(), Some("curl/8.0"));
    }

    #[tokio::test]
    async fn login_activity_is_listed_newest_first() {
        let (store, account) = store_with_account("li").await;
        let client = ClientInfo::default();
        store
            .append_login_activity(account.id, &client, false)
            .await
            .unwrap();
        store
            .append_login_activity(account.id, &client, true)
            .await
            .unwrap();

        let rows = store.list_login_activity(account.id, 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].success);
        assert!(!rows[1].success);

        let limited = store.list_login_activity(account.id, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn updated_essay_moves_to_front() {
        let (store, account) = store_with_account("li").await;
        let first = store.create_essay(account.id, &draft("first essay")).await.unwrap();
        let second = store.create_essay(account.id, &draft("second essay")).await.unwrap();

        let listed = store.list_essays(account.id, 20, 0).await.unwrap();
        assert_eq!(listed[0].id, second.id);

        let updated = store
            .update_essay(account.id, first.id, &draft("first essay, revised"))
            .await
            .unwrap()
            .expect("essay exists");
        assert_eq!(updated.created_at, first.created_at);
        assert_eq!(updated.word_count, 3);

        let listed = store.list_essays(account.id, 20, 0).await.unwrap();
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[1].id, second.id);
    }

    #[tokio::test]
    async fn essays_are_scoped_to_their_owner() {
        let (store, owner) = store_with_account("owner").await;
        let other = store
            .create_account(NewAccount {
                username: "other".into(),
                password_hash: "hash".into(),
                first_name: "O".into(),
                last_name: "T".into(),
            })
            .await
            .unwrap();
        let essay = store.create_essay(owner.id, &draft("mine")).await.unwrap();

        assert!(store.get_essay(other.id, essay.id).await.unwrap().is_none());
        assert!(!store.delete_essay(other.id, essay.id).await.unwrap());
        assert!(store.delete_essay(owner.id, essay.id).await.unwrap());
        assert!(store.get_essay(owner.id, essay.id).await.unwrap().is_none());
    }
}
