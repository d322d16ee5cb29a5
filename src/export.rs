use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::SqlitePool;

use crate::error::ExportError;
use crate::models::job::{Job, JobKey};

pub const HEADER: [&str; 9] = [
    "Source",
    "Company",
    "Job ID",
    "Title",
    "Location",
    "URL",
    "Score",
    "First Seen",
    "Last Seen",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exported {
    pub path: PathBuf,
    pub rows: usize,
}

/// Write every job still flagged new to `{out_dir}/{day}/new_jobs.csv`.
/// Exported rows lose their new flag unless `keep_new` is set.
/// Returns `None` when there is nothing to export.
pub async fn export_new(
    pool: &SqlitePool,
    out_dir: &Path,
    day: NaiveDate,
    keep_new: bool,
) -> Result<Option<Exported>, ExportError> {
    let jobs = Job::list_new(pool).await?;
    if jobs.is_empty() {
        return Ok(None);
    }

    let path = out_dir.join(day.format("%Y-%m-%d").to_string()).join("new_jobs.csv");
    write_file(&path, &jobs)?;

    if !keep_new {
        let keys: Vec<JobKey> = jobs.iter().map(Job::key).collect();
        Job::mark_seen(pool, &keys).await?;
    }
    tracing::info!("Exported {} new jobs to {}", jobs.len(), path.display());
    Ok(Some(Exported {
        path,
        rows: jobs.len(),
    }))
}

/// Write the best `limit` jobs first seen on `day` to
/// `{out_dir}/{day}/top-jobs/top_{limit}_jobs.csv`.
pub async fn export_top(
    pool: &SqlitePool,
    out_dir: &Path,
    day: NaiveDate,
    limit: i64,
) -> Result<Option<Exported>, ExportError> {
    let jobs = Job::list_first_seen_on(pool, day, Some(limit)).await?;
    if jobs.is_empty() {
        return Ok(None);
    }

    let path = out_dir
        .join(day.format("%Y-%m-%d").to_string())
        .join("top-jobs")
        .join(format!("top_{limit}_jobs.csv"));
    write_file(&path, &jobs)?;
    tracing::info!("Exported top {} jobs to {}", jobs.len(), path.display());
    Ok(Some(Exported {
        path,
        rows: jobs.len(),
    }))
}

fn write_file(path: &Path, jobs: &[Job]) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    let file = fs::File::create(path).map_err(io_err)?;
    write_csv(file, jobs)
}

/// Header plus one row per job, in the fixed column order.
pub fn write_csv<W: io::Write>(writer: W, jobs: &[Job]) -> Result<(), ExportError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(HEADER)?;
    for job in jobs {
        out.write_record([
            job.source.as_str(),
            job.company.as_str(),
            job.job_id.as_str(),
            job.title.as_deref().unwrap_or_default(),
            job.location.as_deref().unwrap_or_default(),
            job.url.as_deref().unwrap_or_default(),
            job.score.to_string().as_str(),
            timestamp(job.first_seen).as_str(),
            timestamp(job.last_seen).as_str(),
        ])?;
    }
    out.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, false)
}
