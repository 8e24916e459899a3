use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use complaint_core::PostgresInstanceConfig;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::domain::model::{Complaint, ComplaintId, ComplaintRestoreParams, NewComplaint};
use crate::domain::repository::{ComplaintRepository, RepositoryError, RepositoryResult};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

const CREATE_COMPLAINTS_TABLE: &str = include_str!("../../../migrations/0001_create_complaints.sql");

const COMPLAINT_COLUMNS: &str =
    "id, product_id, content, created_at, reported_by, country, counter, version";

#[derive(Debug, FromRow)]
struct ComplaintRow {
    id: i64,
    product_id: String,
    content: String,
    created_at: DateTime<Utc>,
    reported_by: String,
    country: String,
    counter: i32,
    version: i64,
}

impl From<ComplaintRow> for Complaint {
    fn from(row: ComplaintRow) -> Self {
        Complaint::restore(ComplaintRestoreParams {
            id: row.id,
            product_id: row.product_id,
            content: row.content,
            created_at: row.created_at,
            reported_by: row.reported_by,
            country: row.country,
            counter: row.counter,
            version: row.version,
        })
    }
}

#[derive(Clone)]
pub struct PostgresComplaintRepository {
    pool: Arc<PgPool>,
}

impl PostgresComplaintRepository {
    pub async fn new(config: &PostgresInstanceConfig) -> anyhow::Result<Self> {
        let mut options = PgPoolOptions::new()
            .max_connections(config.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS));
        if let Some(min) = config.min_connections {
            options = options.min_connections(min);
        }

        let pool = options
            .connect(&config.url)
            .await
            .context("failed to connect to postgres")?;

        let repository = Self {
            pool: Arc::new(pool),
        };
        repository.ensure_schema().await?;
        Ok(repository)
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 幂等建表（包含去重键唯一约束）
    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        sqlx::query(CREATE_COMPLAINTS_TABLE)
            .execute(self.pool())
            .await
            .context("failed to create complaints table")?;
        info!("complaints schema ready");
        Ok(())
    }
}

fn map_insert_error(err: sqlx::Error, complaint: &NewComplaint) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            RepositoryError::DuplicateKey {
                product_id: complaint.product_id.clone(),
                reported_by: complaint.reported_by.clone(),
            }
        }
        _ => RepositoryError::Other(anyhow::Error::new(err).context("failed to insert complaint")),
    }
}

#[async_trait]
impl ComplaintRepository for PostgresComplaintRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Complaint>> {
        let rows = sqlx::query_as::<_, ComplaintRow>(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints ORDER BY id ASC"
        ))
        .fetch_all(self.pool())
        .await
        .context("failed to list complaints")?;

        Ok(rows.into_iter().map(Complaint::from).collect())
    }

    async fn find_by_id(&self, id: ComplaintId) -> RepositoryResult<Option<Complaint>> {
        let row = sqlx::query_as::<_, ComplaintRow>(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .with_context(|| format!("failed to load complaint {id}"))?;

        Ok(row.map(Complaint::from))
    }

    async fn find_by_product_id_and_reported_by(
        &self,
        product_id: &str,
        reported_by: &str,
    ) -> RepositoryResult<Option<Complaint>> {
        let row = sqlx::query_as::<_, ComplaintRow>(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE product_id = $1 AND reported_by = $2"
        ))
        .bind(product_id)
        .bind(reported_by)
        .fetch_optional(self.pool())
        .await
        .context("failed to load complaint by product and reporter")?;

        Ok(row.map(Complaint::from))
    }

    async fn insert(&self, complaint: &NewComplaint) -> RepositoryResult<Complaint> {
        let row = sqlx::query_as::<_, ComplaintRow>(&format!(
            r#"
            INSERT INTO complaints (product_id, content, created_at, reported_by, country, counter, version)
            VALUES ($1, $2, $3, $4, $5, 1, 0)
            RETURNING {COMPLAINT_COLUMNS}
            "#
        ))
        .bind(&complaint.product_id)
        .bind(&complaint.content)
        .bind(complaint.created_at)
        .bind(&complaint.reported_by)
        .bind(&complaint.country)
        .fetch_one(self.pool())
        .await
        .map_err(|err| map_insert_error(err, complaint))?;

        Ok(row.into())
    }

    async fn save(&self, complaint: &Complaint) -> RepositoryResult<Complaint> {
        // 只有 content / counter 可变；版本号不一致说明期间有其他写入
        let row = sqlx::query_as::<_, ComplaintRow>(&format!(
            r#"
            UPDATE complaints
            SET content = $2, counter = $3, version = version + 1
            WHERE id = $1 AND version = $4
            RETURNING {COMPLAINT_COLUMNS}
            "#
        ))
        .bind(complaint.id())
        .bind(complaint.content())
        .bind(complaint.counter())
        .bind(complaint.version())
        .fetch_optional(self.pool())
        .await
        .with_context(|| format!("failed to save complaint {}", complaint.id()))?;

        row.map(Complaint::from)
            .ok_or(RepositoryError::StaleWrite(complaint.id()))
    }
}
