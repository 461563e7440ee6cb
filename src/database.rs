use crate::models::{NewSurvey, SurveyRecord};
use crate::storage::MediaUploader;
use anyhow::{Context, Result};
use axum::async_trait;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SurveyStore>,
    pub uploader: Arc<dyn MediaUploader>,
}

/// Persistence for survey records.
#[async_trait]
pub trait SurveyStore: Send + Sync {
    async fn insert_survey(&self, survey: NewSurvey) -> Result<SurveyRecord>;

    /// Every stored survey, oldest first.
    async fn list_surveys(&self) -> Result<Vec<SurveyRecord>>;
}

pub async fn connect_db(database_url: &str, max_connections: u32) -> Result<Pool<Postgres>> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &Pool<Postgres>) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run migrations")?;
    Ok(())
}

#[derive(Clone)]
pub struct PgSurveyStore {
    pool: Pool<Postgres>,
}

impl PgSurveyStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl SurveyStore for PgSurveyStore {
    async fn insert_survey(&self, survey: NewSurvey) -> Result<SurveyRecord> {
        let record = sqlx::query_as::<_, SurveyRecord>(
            r#"
            INSERT INTO surveys (id, demographics, awareness, readiness, text_answers, images)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, demographics, awareness, readiness, text_answers, images, created_at
            "#,
        )
        .bind(uuid::Uuid::new_v4())
        .bind(&survey.demographics)
        .bind(&survey.awareness)
        .bind(&survey.readiness)
        .bind(&survey.text_answers)
        .bind(&survey.images)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert survey")?;

        Ok(record)
    }

    async fn list_surveys(&self) -> Result<Vec<SurveyRecord>> {
        let records = sqlx::query_as::<_, SurveyRecord>(
            r#"
            SELECT id, demographics, awareness, readiness, text_answers, images, created_at
            FROM surveys
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch surveys")?;

        Ok(records)
    }
}
