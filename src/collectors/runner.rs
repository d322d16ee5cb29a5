use chrono::{DateTime, SubsecRound, Utc};
use sqlx::SqlitePool;

use crate::collectors::http::HttpSettings;
use crate::collectors::{BuiltinRegistry, CollectorRegistry, JobCollector, Locator};
use crate::error::{ConfigError, StoreError};
use crate::models::job::Job;
use crate::models::source::SourceEntry;
use crate::scoring::Scorer;

/// Current time at the store's second precision.
pub fn utc_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Collected { found: usize, new: usize },
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct SourceReport {
    pub name: String,
    pub outcome: SourceOutcome,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub sources: Vec<SourceReport>,
    pub new_jobs: Vec<Job>,
}

impl RunReport {
    /// New jobs, best score first. Ties keep discovery order.
    pub fn ranked(&self) -> Vec<&Job> {
        let mut ranked: Vec<&Job> = self.new_jobs.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }

    pub fn summary(&self) -> String {
        let mut out = String::new();
        for source in &self.sources {
            let line = match &source.outcome {
                SourceOutcome::Collected { new: 0, .. } => format!("{}: no new jobs", source.name),
                SourceOutcome::Collected { new, .. } => format!("{}: {new} new job(s)", source.name),
                SourceOutcome::Skipped(reason) => format!("{}: skipped ({reason})", source.name),
                SourceOutcome::Failed(error) => format!("{}: failed ({error})", source.name),
            };
            out.push_str(&line);
            out.push('\n');
        }

        if self.new_jobs.is_empty() {
            out.push_str("\nNo new jobs found.\n");
            return out;
        }

        out.push_str("\n=== NEW JOBS ===\n");
        for job in self.ranked() {
            let location = job
                .location
                .as_deref()
                .map(|l| format!(" ({l})"))
                .unwrap_or_default();
            out.push_str(&format!(
                "[Score: {:3}] {}: {}{location}\n  {}\n",
                job.score,
                job.company,
                job.title.as_deref().unwrap_or_default(),
                job.url.as_deref().unwrap_or_default()
            ));
        }
        out
    }
}

/// Drives every configured source through its collector and into the store.
pub struct Runner<R = BuiltinRegistry> {
    pool: SqlitePool,
    scorer: Scorer,
    http: HttpSettings,
    registry: R,
}

impl Runner<BuiltinRegistry> {
    pub fn new(pool: SqlitePool, scorer: Scorer, http: HttpSettings) -> Self {
        Self {
            pool,
            scorer,
            http,
            registry: BuiltinRegistry,
        }
    }
}

impl<R: CollectorRegistry> Runner<R> {
    pub fn with_registry<T: CollectorRegistry>(self, registry: T) -> Runner<T> {
        Runner {
            pool: self.pool,
            scorer: self.scorer,
            http: self.http,
            registry,
        }
    }

    /// Process `entries` in order. Config and fetch failures skip the entry;
    /// a store failure aborts the run.
    pub async fn run(
        &self,
        entries: &[SourceEntry],
        now: DateTime<Utc>,
    ) -> Result<RunReport, StoreError> {
        let mut report = RunReport::default();

        for entry in entries {
            let name = entry.display_name().to_string();

            let (collector, locator) = match self.prepare(entry) {
                Ok(prepared) => prepared,
                Err(e) => {
                    tracing::warn!("Skipping {name}: {e}");
                    report.sources.push(SourceReport {
                        name,
                        outcome: SourceOutcome::Skipped(e.to_string()),
                    });
                    continue;
                }
            };

            let fetched = match self.http.session() {
                Ok(client) => collector.collect(&client, &locator).await,
                Err(e) => Err(e),
            };
            let mut jobs = match fetched {
                Ok(jobs) => jobs,
                Err(e) => {
                    tracing::error!("[ERROR] {name} ({}): {e}", locator.board);
                    report.sources.push(SourceReport {
                        name,
                        outcome: SourceOutcome::Failed(e.to_string()),
                    });
                    continue;
                }
            };

            // The friendly name is part of the identity key from here on.
            for job in &mut jobs {
                job.company.clone_from(&name);
            }

            let created = Job::upsert_batch(&self.pool, &self.scorer, &jobs, now).await?;
            tracing::info!(
                "{name}: {} found, {} new via {}",
                jobs.len(),
                created.len(),
                collector.platform()
            );
            report.sources.push(SourceReport {
                name,
                outcome: SourceOutcome::Collected {
                    found: jobs.len(),
                    new: created.len(),
                },
            });
            report.new_jobs.extend(created);
        }

        Ok(report)
    }

    fn prepare(&self, entry: &SourceEntry) -> Result<(&dyn JobCollector, Locator), ConfigError> {
        let collector = self.registry.collector(entry.platform()?);
        let locator = collector.resolve_locator(entry)?;
        Ok((collector, locator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(title: &str, score: i64) -> Job {
        let now = utc_now();
        Job {
            source: "lever".into(),
            company: "Acme".into(),
            job_id: title.into(),
            title: Some(title.into()),
            location: None,
            url: Some(format!("https://jobs.lever.co/acme/{title}")),
            score,
            is_new: true,
            is_applied: false,
            first_seen: now,
            last_seen: now,
        }
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let report = RunReport {
            sources: vec![],
            new_jobs: vec![job("a", 5), job("b", 9), job("c", 5), job("d", -2)],
        };
        let order: Vec<_> = report.ranked().iter().map(|j| j.job_id.as_str()).collect();
        assert_eq!(order, ["b", "a", "c", "d"]);
    }

    #[test]
    fn summary_lists_sources_and_new_jobs() {
        let report = RunReport {
            sources: vec![
                SourceReport {
                    name: "Acme".into(),
                    outcome: SourceOutcome::Collected { found: 3, new: 1 },
                },
                SourceReport {
                    name: "Beta".into(),
                    outcome: SourceOutcome::Failed("boom".into()),
                },
            ],
            new_jobs: vec![job("ML Engineer", 12)],
        };
        let text = report.summary();
        assert!(text.contains("Acme: 1 new job(s)"));
        assert!(text.contains("Beta: failed (boom)"));
        assert!(text.contains("[Score:  12] Acme: ML Engineer\n  https://jobs.lever.co/acme/ML Engineer"));
    }

    #[test]
    fn empty_summary_says_so() {
        assert!(RunReport::default().summary().ends_with("No new jobs found.\n"));
    }
}
