use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use jobsweep::collectors::runner::{Runner, utc_now};
use jobsweep::config::{Command, Config, SourcesFile};
use jobsweep::db;
use jobsweep::export;
use jobsweep::models::job::{Job, JobKey};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jobsweep=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();

    tracing::info!("Opening database {}", config.database.display());
    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;

    match config.resolved_command() {
        Command::Run => {
            let file = SourcesFile::load(&config.config)?;
            if file.companies.is_empty() {
                println!("No companies found in {}", config.config.display());
                return Ok(ExitCode::FAILURE);
            }

            let runner = Runner::new(pool, file.scoring, config.http_settings());
            let report = runner.run(&file.companies, utc_now()).await?;
            print!("{}", report.summary());
            Ok(exit_for(!report.new_jobs.is_empty()))
        }
        Command::Export {
            out_dir,
            limit,
            keep_new,
        } => {
            let today = utc_now().date_naive();
            let new = export::export_new(&pool, &out_dir, today, keep_new).await?;
            match &new {
                Some(done) => println!("Exported {} new jobs to {}", done.rows, done.path.display()),
                None => println!("No new jobs found."),
            }
            match export::export_top(&pool, &out_dir, today, limit).await? {
                Some(done) => println!(
                    "Exported top {} jobs by score to {}",
                    done.rows,
                    done.path.display()
                ),
                None => println!("No jobs first seen today."),
            }
            Ok(exit_for(new.is_some()))
        }
        Command::Rescore => {
            let scorer = SourcesFile::load(&config.config)?.scoring;
            let updated = Job::rescore_all(&pool, &scorer).await?;
            println!("Rescored {updated} jobs");
            Ok(ExitCode::SUCCESS)
        }
        Command::Top { min_score, limit } => {
            for job in Job::list_by_score(&pool, min_score, Some(limit)).await? {
                println!(
                    "[Score: {:3}] {}: {} ({})\n  {}",
                    job.score,
                    job.company,
                    job.title.as_deref().unwrap_or_default(),
                    job.location.as_deref().unwrap_or("n/a"),
                    job.url.as_deref().unwrap_or_default()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::ResetNew => {
            let cleared = Job::reset_new(&pool).await?;
            println!("Cleared new flag on {cleared} jobs");
            Ok(ExitCode::SUCCESS)
        }
        Command::Applied {
            source,
            company,
            job_id,
            undo,
        } => {
            let key = JobKey {
                source,
                company,
                job_id,
            };
            if Job::set_applied(&pool, &key, !undo).await? {
                Ok(ExitCode::SUCCESS)
            } else {
                anyhow::bail!(
                    "No job {} / {} / {}",
                    key.source,
                    key.company,
                    key.job_id
                );
            }
        }
    }
}

/// Scheduled callers tell "found something" from "nothing to do" by exit code.
fn exit_for(found: bool) -> ExitCode {
    if found {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
