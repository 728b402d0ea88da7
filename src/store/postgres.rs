//! Postgres-backed document store. Each collection is a table of `JSONB` bodies.

use super::{new_id, Collection, Document, DocumentStore, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    postgres::{PgPool, PgPoolOptions, PgRow},
    types::Json,
    Connection, Row,
};
use std::time::Duration;
use tracing::{debug, info_span, instrument, Instrument};

pub const SCHEMA_SQL: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/db/sql/schema.sql"));

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool and make sure the document tables exist.
    ///
    /// # Errors
    /// Returns an error if the connection or the schema statements fail.
    pub async fn connect(dsn: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(max_connections)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await?;

        let store = Self::new(pool);
        store.apply_schema().await?;

        Ok(store)
    }

    /// Run every statement of [`SCHEMA_SQL`]; all of them are idempotent.
    ///
    /// # Errors
    /// Returns an error if any statement fails.
    pub async fn apply_schema(&self) -> Result<(), StoreError> {
        for statement in split_sql_statements(SCHEMA_SQL) {
            sqlx::query(&statement).execute(&self.pool).await?;
        }

        debug!("Schema applied");

        Ok(())
    }
}

/// Split a SQL script into `;`-terminated statements, skipping comments.
pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');
        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    statements
}

fn to_document(row: &PgRow) -> Result<Document, StoreError> {
    let id: String = row.try_get("id")?;
    let Json(body): Json<Value> = row.try_get("body")?;
    Document::new(id, body)
}

fn map_insert_error(collection: Collection, err: sqlx::Error) -> StoreError {
    match (&err, collection.unique_field()) {
        (sqlx::Error::Database(db), Some(field)) if db.is_unique_violation() => {
            StoreError::Conflict { collection, field }
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    #[instrument(skip(self, body))]
    async fn insert(&self, collection: Collection, body: Value) -> Result<Document, StoreError> {
        let doc = Document::new(new_id(), body)?;
        let query = format!("INSERT INTO {collection} (id, body) VALUES ($1, $2)");

        sqlx::query(&query)
            .bind(&doc.id)
            .bind(Json(&doc.body))
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(collection, e))?;

        Ok(doc)
    }

    #[instrument(skip(self))]
    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let query = format!("SELECT id, body FROM {collection} ORDER BY created_at, id");

        sqlx::query(&query)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(to_document)
            .collect()
    }

    #[instrument(skip(self))]
    async fn find_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let query = format!("SELECT id, body FROM {collection} WHERE id = $1");

        sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(to_document)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn find_one(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>, StoreError> {
        let query = format!(
            "SELECT id, body FROM {collection} WHERE body->>$1 = $2 ORDER BY created_at, id LIMIT 1"
        );

        sqlx::query(&query)
            .bind(field)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(to_document)
            .transpose()
    }

    #[instrument(skip(self, body))]
    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        body: Value,
    ) -> Result<Option<Document>, StoreError> {
        let doc = Document::new(id.to_string(), body)?;
        let query = format!("UPDATE {collection} SET body = $2 WHERE id = $1");

        let result = sqlx::query(&query)
            .bind(&doc.id)
            .bind(Json(&doc.body))
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(collection, e))?;

        Ok((result.rows_affected() > 0).then_some(doc))
    }

    #[instrument(skip(self, value))]
    async fn push(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<Option<Document>, StoreError> {
        // single statement, so concurrent appends serialize on the row lock
        let query = format!(
            "UPDATE {collection} SET body = jsonb_set(\
               body, ARRAY[$2::text], \
               COALESCE(body->$2::text, '[]'::jsonb) || jsonb_build_array($3::jsonb)) \
             WHERE id = $1 AND jsonb_typeof(COALESCE(body->$2::text, '[]'::jsonb)) = 'array' \
             RETURNING id, body"
        );

        let pushed = sqlx::query(&query)
            .bind(id)
            .bind(field)
            .bind(Json(&value))
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(to_document)
            .transpose()?;

        if pushed.is_none() && self.find_by_id(collection, id).await?.is_some() {
            return Err(StoreError::NotAnArray {
                collection,
                field: field.to_string(),
            });
        }

        Ok(pushed)
    }

    #[instrument(skip(self))]
    async fn delete(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let query = format!("DELETE FROM {collection} WHERE id = $1 RETURNING id, body");

        sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(to_document)
            .transpose()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self.pool.acquire().instrument(acquire_span).await?;

        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping().instrument(ping_span).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_splits_into_statements() {
        let statements = split_sql_statements(SCHEMA_SQL);

        for collection in Collection::ALL {
            let create = format!("CREATE TABLE IF NOT EXISTS {collection} (");
            assert!(
                statements.iter().any(|s| s.starts_with(&create)),
                "missing table for {collection}"
            );
        }

        assert!(statements
            .iter()
            .any(|s| s.starts_with("CREATE UNIQUE INDEX") && s.contains("users")));
        assert!(statements.iter().all(|s| s.ends_with(';')));
        assert!(statements.iter().all(|s| !s.starts_with("--")));
    }

    #[test]
    fn split_handles_multiline_and_comments() {
        let sql = "-- header\nCREATE TABLE a (\n  id TEXT\n);\n\nSELECT 1;\n";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], "CREATE TABLE a (\n  id TEXT\n);");
        assert_eq!(statements[1], "SELECT 1;");
    }

    #[test]
    fn non_database_errors_are_not_conflicts() {
        let err = map_insert_error(Collection::Users, sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(_)));
    }
}
