use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::db::{helpers::parse_datetime, Database};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlob {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

impl Database {
    pub async fn get_blob(&self, key: &str) -> Result<Option<StoredBlob>> {
        let key = key.to_string();
        self.execute(move |conn| {
            let row = conn
                .query_row(
                    "SELECT key, value, updated_at FROM kv_store WHERE key = ?1",
                    params![key],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    },
                )
                .optional()
                .with_context(|| format!("failed to read blob {key}"))?;

            let Some((key, value, updated_at)) = row else {
                return Ok(None);
            };
            Ok(Some(StoredBlob {
                key,
                value,
                updated_at: parse_datetime(&updated_at, "updated_at")?,
            }))
        })
        .await
    }

    /// Insert or replace the blob stored under `key`.
    pub async fn put_blob(&self, key: &str, value: String) -> Result<()> {
        let key = key.to_string();
        let updated_at = Utc::now().to_rfc3339();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![key, value, updated_at],
            )
            .with_context(|| format!("failed to write blob {key}"))?;
            Ok(())
        })
        .await
    }

    pub async fn delete_blob(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.execute(move |conn| {
            conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])
                .with_context(|| format!("failed to delete blob {key}"))?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::db::testing::temp_db_path;

    use super::*;

    #[tokio::test]
    async fn put_get_overwrite_delete() {
        let db = Database::new(temp_db_path()).unwrap();
        assert_eq!(db.get_blob("layout").await.unwrap(), None);

        db.put_blob("layout", "{\"a\":1}".into()).await.unwrap();
        let first = db.get_blob("layout").await.unwrap().unwrap();
        assert_eq!(first.key, "layout");
        assert_eq!(first.value, "{\"a\":1}");

        db.put_blob("layout", "{\"a\":2}".into()).await.unwrap();
        let second = db.get_blob("layout").await.unwrap().unwrap();
        assert_eq!(second.value, "{\"a\":2}");
        assert!(second.updated_at >= first.updated_at);

        db.delete_blob("layout").await.unwrap();
        assert_eq!(db.get_blob("layout").await.unwrap(), None);
    }

    #[tokio::test]
    async fn blobs_survive_reopen() {
        let path = temp_db_path();
        {
            let db = Database::new(path.clone()).unwrap();
            db.put_blob("k", "v".into()).await.unwrap();
        }
        let db = Database::new(path).unwrap();
        assert_eq!(db.path().extension().and_then(|e| e.to_str()), Some("sqlite3"));
        assert_eq!(db.get_blob("k").await.unwrap().unwrap().value, "v");
    }
}
