//! The persistence session seam: a trait the engines talk to, plus the
//! PostgreSQL implementation over sqlx.
//!
//! One session is borrowed per request; it takes no locks of its own, keeps
//! no cache, and never retries. The `cacheable` flag on a query is forwarded
//! verbatim; the PostgreSQL implementation has nothing to do with it.

use crate::error::AppError;
use crate::sql::{PgBindValue, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use sqlx::Row;

#[async_trait]
pub trait Session: Send + Sync {
    /// Run a row-count query and return the single scalar.
    async fn count(&self, q: &QueryBuf) -> Result<i64, AppError>;

    /// Run a query and return all rows as JSON objects.
    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Value>, AppError>;

    /// Run a query expected to return at most one row.
    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Value>, AppError>;

    /// Run a mutating statement with RETURNING and hand back the row, if any.
    async fn execute_returning(&self, q: &QueryBuf) -> Result<Option<Value>, AppError>;
}

pub struct PgSession {
    pool: PgPool,
}

impl PgSession {
    pub fn new(pool: PgPool) -> Self {
        PgSession { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(PgSession { pool })
    }

    /// Pool from `DATABASE_URL` (a `.env` file is honored).
    pub async fn connect_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL")
            .map_err(|_| AppError::BadRequest("DATABASE_URL is not set".into()))?;
        Self::connect(&url).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn bind_params<'q>(
        q: &'q QueryBuf,
        mut query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    ) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        query
    }
}

#[async_trait]
impl Session for PgSession {
    async fn count(&self, q: &QueryBuf) -> Result<i64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "count");
        let row = Self::bind_params(q, sqlx::query(&q.sql))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>(0)?)
    }

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = Self::bind_params(q, sqlx::query(&q.sql))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = Self::bind_params(q, sqlx::query(&q.sql))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_json))
    }

    async fn execute_returning(&self, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let row = Self::bind_params(q, sqlx::query(&q.sql))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_json))
    }
}

fn row_to_json(row: &sqlx::postgres::PgRow) -> Value {
    use sqlx::Column;
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    Value::Object(map)
}

fn cell_to_value(row: &sqlx::postgres::PgRow, name: &str) -> Value {
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<serde_json::Value>, _>(name) {
        return j;
    }
    Value::Null
}
