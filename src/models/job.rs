use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::collectors::CollectedJob;
use crate::error::StoreError;
use crate::scoring::Scorer;

const COLUMNS: &str = "source, company, job_id, title, location, url, score, is_new, is_applied, first_seen, last_seen";

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Job {
    pub source: String,
    pub company: String,
    pub job_id: String,
    pub title: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub score: i64,
    pub is_new: bool,
    pub is_applied: bool,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Identity of a posting: `(source, company, job_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobKey {
    pub source: String,
    pub company: String,
    pub job_id: String,
}

impl Job {
    pub fn key(&self) -> JobKey {
        JobKey {
            source: self.source.clone(),
            company: self.company.clone(),
            job_id: self.job_id.clone(),
        }
    }

    /// Apply one source's batch in a single transaction and return the jobs
    /// seen for the first time.
    ///
    /// Existing rows get fresh content, score and `last_seen`, and lose their
    /// `is_new` flag; `first_seen` and `is_applied` are left alone. Lookups run
    /// inside the transaction, so a key repeated within the batch is inserted
    /// once and then overwritten by its later occurrences like any seen row.
    pub async fn upsert_batch(
        pool: &SqlitePool,
        scorer: &Scorer,
        batch: &[CollectedJob],
        now: DateTime<Utc>,
    ) -> Result<Vec<Job>, StoreError> {
        let mut tx = pool.begin().await?;
        let mut created = Vec::new();

        for collected in batch {
            let source = collected.source.as_str();
            let score = scorer.score(collected.title.as_deref(), collected.location.as_deref());

            let exists: Option<(i64,)> = sqlx::query_as(
                "SELECT 1 FROM jobs WHERE source = ?1 AND company = ?2 AND job_id = ?3",
            )
            .bind(source)
            .bind(&collected.company)
            .bind(&collected.job_id)
            .fetch_optional(&mut *tx)
            .await?;

            if exists.is_some() {
                sqlx::query(
                    "UPDATE jobs SET title = ?4, location = ?5, url = ?6, score = ?7, is_new = 0, last_seen = ?8 WHERE source = ?1 AND company = ?2 AND job_id = ?3",
                )
                .bind(source)
                .bind(&collected.company)
                .bind(&collected.job_id)
                .bind(&collected.title)
                .bind(&collected.location)
                .bind(&collected.url)
                .bind(score)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            } else {
                sqlx::query(
                    "INSERT INTO jobs (source, company, job_id, title, location, url, score, is_new, is_applied, first_seen, last_seen) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, 0, ?8, ?8)",
                )
                .bind(source)
                .bind(&collected.company)
                .bind(&collected.job_id)
                .bind(&collected.title)
                .bind(&collected.location)
                .bind(&collected.url)
                .bind(score)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                created.push(Job {
                    source: source.to_string(),
                    company: collected.company.clone(),
                    job_id: collected.job_id.clone(),
                    title: collected.title.clone(),
                    location: collected.location.clone(),
                    url: collected.url.clone(),
                    score,
                    is_new: true,
                    is_applied: false,
                    first_seen: now,
                    last_seen: now,
                });
            }
        }

        tx.commit().await?;
        Ok(created)
    }

    pub async fn get(pool: &SqlitePool, key: &JobKey) -> Result<Option<Job>, StoreError> {
        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {COLUMNS} FROM jobs WHERE source = ?1 AND company = ?2 AND job_id = ?3"
        ))
        .bind(&key.source)
        .bind(&key.company)
        .bind(&key.job_id)
        .fetch_optional(pool)
        .await?;
        Ok(job)
    }

    /// Jobs still flagged new, best first.
    pub async fn list_new(pool: &SqlitePool) -> Result<Vec<Job>, StoreError> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            "SELECT {COLUMNS} FROM jobs WHERE is_new = 1 ORDER BY score DESC, last_seen DESC"
        ))
        .fetch_all(pool)
        .await?;
        Ok(jobs)
    }

    /// Jobs first seen on `day` (UTC), best first, optionally capped.
    pub async fn list_first_seen_on(
        pool: &SqlitePool,
        day: NaiveDate,
        limit: Option<i64>,
    ) -> Result<Vec<Job>, StoreError> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            "SELECT {COLUMNS} FROM jobs WHERE DATE(first_seen) = ?1 ORDER BY score DESC, last_seen DESC LIMIT ?2"
        ))
        .bind(day.format("%Y-%m-%d").to_string())
        .bind(limit.unwrap_or(-1))
        .fetch_all(pool)
        .await?;
        Ok(jobs)
    }

    pub async fn list_by_score(
        pool: &SqlitePool,
        min_score: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<Job>, StoreError> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            "SELECT {COLUMNS} FROM jobs WHERE (?1 IS NULL OR score >= ?1) ORDER BY score DESC, last_seen DESC LIMIT ?2"
        ))
        .bind(min_score)
        .bind(limit.unwrap_or(-1))
        .fetch_all(pool)
        .await?;
        Ok(jobs)
    }

    /// Recompute every stored score, e.g. after the scoring tables change.
    pub async fn rescore_all(pool: &SqlitePool, scorer: &Scorer) -> Result<u64, StoreError> {
        let mut tx = pool.begin().await?;
        let rows: Vec<(String, String, String, Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT source, company, job_id, title, location FROM jobs",
        )
        .fetch_all(&mut *tx)
        .await?;

        let mut updated = 0;
        for (source, company, job_id, title, location) in rows {
            let score = scorer.score(title.as_deref(), location.as_deref());
            updated += sqlx::query(
                "UPDATE jobs SET score = ?4 WHERE source = ?1 AND company = ?2 AND job_id = ?3",
            )
            .bind(source)
            .bind(company)
            .bind(job_id)
            .bind(score)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;
        Ok(updated)
    }

    /// Clear the new flag on the given jobs.
    pub async fn mark_seen(pool: &SqlitePool, keys: &[JobKey]) -> Result<u64, StoreError> {
        let mut tx = pool.begin().await?;
        let mut cleared = 0;
        for key in keys {
            cleared += sqlx::query(
                "UPDATE jobs SET is_new = 0 WHERE source = ?1 AND company = ?2 AND job_id = ?3",
            )
            .bind(&key.source)
            .bind(&key.company)
            .bind(&key.job_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }
        tx.commit().await?;
        Ok(cleared)
    }

    /// Clear every new flag.
    pub async fn reset_new(pool: &SqlitePool) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE jobs SET is_new = 0 WHERE is_new = 1")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// User-managed applied flag. Returns false when no such job exists.
    pub async fn set_applied(
        pool: &SqlitePool,
        key: &JobKey,
        applied: bool,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE jobs SET is_applied = ?4 WHERE source = ?1 AND company = ?2 AND job_id = ?3",
        )
        .bind(&key.source)
        .bind(&key.company)
        .bind(&key.job_id)
        .bind(applied)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
