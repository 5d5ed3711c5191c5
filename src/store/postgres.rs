use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    types::EssayRow, Account, ClientInfo, Essay, EssayDraft, LoginActivity, NewAccount, Profile,
    Store, UsernameTaken,
};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_account_by_username(&self, username: &str) -> anyhow::Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, username, password_hash, first_name, last_name, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .context("find account by username")?;
        Ok(account)
    }

    async fn find_account(&self, id: Uuid) -> anyhow::Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, username, password_hash, first_name, last_name, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find account by id")?;
        Ok(account)
    }

    async fn username_exists(&self, username: &str) -> anyhow::Result<bool> {
        let exists: bool =
            sqlx::query_scalar(r#"SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)"#)
                .bind(username)
                .fetch_one(&self.db)
                .await
                .context("check username")?;
        Ok(exists)
    }

    async fn create_account(&self, new: NewAccount) -> anyhow::Result<Account> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO users (username, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password_hash, first_name, last_name, created_at
            "#,
        )
        .bind(&new.username)
        .bind(&new.password_hash)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation()) {
                anyhow::Error::new(UsernameTaken)
            } else {
                anyhow::Error::new(e).context("insert account")
            }
        })?;

        sqlx::query(r#"INSERT INTO profiles (user_id) VALUES ($1)"#)
            .bind(account.id)
            .execute(&mut *tx)
            .await
            .context("insert profile")?;

        tx.commit().await.context("commit tx")?;
        Ok(account)
    }

    async fn get_profile(&self, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT user_id, display_name, last_login_at, last_login_ip, last_login_user_agent
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("get profile")?;
        Ok(profile)
    }

    async fn record_login(&self, user_id: Uuid, client: &ClientInfo) -> anyhow::Result<Profile> {
        // Upsert: accounts created outside signup get their profile on first login.
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id, last_login_at, last_login_ip, last_login_user_agent)
            VALUES ($1, now(), $2, $3)
            ON CONFLICT (user_id) DO UPDATE
               SET last_login_at = EXCLUDED.last_login_at,
                   last_login_ip = EXCLUDED.last_login_ip,
                   last_login_user_agent = EXCLUDED.last_login_user_agent
            RETURNING user_id, display_name, last_login_at, last_login_ip, last_login_user_agent
            "#,
        )
        .bind(user_id)
        .bind(client.ip.as_deref())
        .bind(client.user_agent.as_deref())
        .fetch_one(&self.db)
        .await
        .context("upsert profile login")?;
        Ok(profile)
    }

    async fn append_login_activity(
        &self,
        user_id: Uuid,
        client: &ClientInfo,
        success: bool,
    ) -> anyhow::Result<LoginActivity> {
        let row = sqlx::query_as::<_, LoginActivity>(
            r#"
            INSERT INTO login_activities (user_id, ip_address, user_agent, success)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, occurred_at, ip_address, user_agent, success
            "#,
        )
        .bind(user_id)
        .bind(client.ip.as_deref())
        .bind(client.user_agent.as_deref())
        .bind(success)
        .fetch_one(&self.db)
        .await
        .context("insert login activity")?;
        Ok(row)
    }

    async fn list_login_activity(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> anyhow::Result<Vec<LoginActivity>> {
        let rows = sqlx::query_as::<_, LoginActivity>(
            r#"
            SELECT id, user_id, occurred_at, ip_address, user_agent, success
              FROM login_activities
             WHERE user_id = $1
             ORDER BY occurred_at DESC
             LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .context("list login activity")?;
        Ok(rows)
    }

    async fn create_essay(&self, user_id: Uuid, draft: &EssayDraft) -> anyhow::Result<Essay> {
        let row = sqlx::query_as::<_, EssayRow>(
            r#"
            INSERT INTO essays (user_id, title, task_type, topic_text, content,
                                word_count, character_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, title, task_type, topic_text, content,
                      word_count, character_count, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(draft.title.as_deref())
        .bind(draft.task_type.as_str())
        .bind(draft.topic_text.as_deref())
        .bind(&draft.content)
        .bind(draft.word_count())
        .bind(draft.character_count())
        .fetch_one(&self.db)
        .await
        .context("insert essay")?;
        row.try_into()
    }

    async fn list_essays(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Essay>> {
        let rows = sqlx::query_as::<_, EssayRow>(
            r#"
            SELECT id, user_id, title, task_type, topic_text, content,
                   word_count, character_count, created_at, updated_at
              FROM essays
             WHERE user_id = $1
             ORDER BY updated_at DESC
             LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .context("list essays")?;
        rows.into_iter().map(Essay::try_from).collect()
    }

    async fn get_essay(&self, user_id: Uuid, essay_id: Uuid) -> anyhow::Result<Option<Essay>> {
        let row = sqlx::query_as::<_, EssayRow>(
            r#"
            SELECT id, user_id, title, task_type, topic_text, content,
                   word_count, character_count, created_at, updated_at
              FROM essays
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(essay_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("get essay")?;
        row.map(Essay::try_from).transpose()
    }

    async fn update_essay(
        &self,
        user_id: Uuid,
        essay_id: Uuid,
        draft: &EssayDraft,
    ) -> anyhow::Result<Option<Essay>> {
        let row = sqlx::query_as::<_, EssayRow>(
            r#"
            UPDATE essays
               SET title = $3, task_type = $4, topic_text = $5, content = $6,
                   word_count = $7, character_count = $8, updated_at = now()
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, task_type, topic_text, content,
                      word_count, character_count, created_at, updated_at
            "#,
        )
        .bind(essay_id)
        .bind(user_id)
        .bind(draft.title.as_deref())
        .bind(draft.task_type.as_str())
        .bind(draft.topic_text.as_deref())
        .bind(&draft.content)
        .bind(draft.word_count())
        .bind(draft.character_count())
        .fetch_optional(&self.db)
        .await
        .context("update essay")?;
        row.map(Essay::try_from).transpose()
    }

    async fn delete_essay(&self, user_id: Uuid, essay_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(r#"DELETE FROM essays WHERE id = $1 AND user_id = $2"#)
            .bind(essay_id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete essay")?;
        Ok(res.rows_affected() > 0)
    }
}
