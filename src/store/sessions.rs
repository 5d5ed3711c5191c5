use async_trait::async_trait;
use sqlx::PgPool;
use tower_sessions::{
    session::{Id, Record},
    session_store, ExpiredDeletion, SessionStore,
};

/// Session records in the `sessions` table, one JSON-encoded row per id.
#[derive(Clone, Debug)]
pub struct PgSessionStore {
    db: PgPool,
}

impl PgSessionStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn backend(e: sqlx::Error) -> session_store::Error {
    session_store::Error::Backend(e.to_string())
}

fn encode(record: &Record) -> session_store::Result<Vec<u8>> {
    serde_json::to_vec(record).map_err(|e| session_store::Error::Encode(e.to_string()))
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        loop {
            let inserted = sqlx::query(
                r#"
                INSERT INTO sessions (id, data, expiry_date)
                VALUES ($1, $2, $3)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(record.id.to_string())
            .bind(encode(record)?)
            .bind(record.expiry_date)
            .execute(&self.db)
            .await
            .map_err(backend)?
            .rows_affected();

            if inserted == 1 {
                return Ok(());
            }
            // id collision
            record.id = Id::default();
        }
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, data, expiry_date)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
               SET data = EXCLUDED.data,
                   expiry_date = EXCLUDED.expiry_date
            "#,
        )
        .bind(record.id.to_string())
        .bind(encode(record)?)
        .bind(record.expiry_date)
        .execute(&self.db)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as(
            r#"SELECT data FROM sessions WHERE id = $1 AND expiry_date > now()"#,
        )
        .bind(session_id.to_string())
        .fetch_optional(&self.db)
        .await
        .map_err(backend)?;

        row.map(|(data,)| {
            serde_json::from_slice(&data).map_err(|e| session_store::Error::Decode(e.to_string()))
        })
        .transpose()
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        sqlx::query(r#"DELETE FROM sessions WHERE id = $1"#)
            .bind(session_id.to_string())
            .execute(&self.db)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for PgSessionStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let res = sqlx::query(r#"DELETE FROM sessions WHERE expiry_date <= now()"#)
            .execute(&self.db)
            .await
            .map_err(backend)?;
        tracing::debug!(removed = res.rows_affected(), "expired sessions purged");
        Ok(())
    }
}
