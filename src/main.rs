use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use jobqueue::config::PoolConfig;
use jobqueue::error::JobQueueError;
use jobqueue::scheduler::Job;
use jobqueue::service::JobService;
use jobqueue::shutdown::install_shutdown_handler;
use jobqueue::worker::SimulatedExecutor;

#[derive(Parser, Debug)]
#[command(name = "jobqueue")]
#[command(version)]
#[command(about = "A bounded job queue with a fixed worker pool and per-job deadlines")]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run a worker pool over a batch of tasks and print their final status
    Run(RunArgs),
}

// =============================================================================
// Run Arguments
// =============================================================================

#[derive(Parser, Debug)]
struct RunArgs {
    /// Number of workers
    #[arg(long, short = 'w', default_value = "3")]
    workers: usize,

    /// Job queue buffer size
    #[arg(long, short = 'q', default_value = "100")]
    queue: usize,

    /// Job execution timeout in seconds
    #[arg(long, short = 't', default_value = "30")]
    timeout: u64,

    /// Base duration of the simulated work, in milliseconds
    #[arg(long, default_value = "2000")]
    task_base_ms: u64,

    /// Extra simulated work per (id length % 3) step, in milliseconds
    #[arg(long, default_value = "1000")]
    task_step_ms: u64,

    /// Output format
    #[arg(long, short = 'o', default_value = "table")]
    output: OutputFormat,

    /// Task descriptions. Read one per line from stdin when omitted.
    tasks: Vec<String>,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Create a job, reporting rejections on stderr instead of aborting the batch.
async fn create_job(service: &JobService, task: String) -> Result<(), Box<dyn std::error::Error>> {
    match service.create_job(task).await {
        Ok(_) => Ok(()),
        Err(JobQueueError::QueueFull { id }) => {
            eprintln!("Rejected job {}: queue is full", id);
            Ok(())
        }
        Err(JobQueueError::InvalidTask) => {
            eprintln!("Skipped task: description is blank");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn submit_from_stdin(
    service: &JobService,
    shutdown: &CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = shutdown.cancelled() => return Ok(()),
        };
        match line {
            Some(task) if task.trim().is_empty() => continue,
            Some(task) => create_job(service, task).await?,
            None => return Ok(()),
        }
    }
}

fn print_jobs(jobs: &[Job], output_format: &OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(jobs)?);
        }
        OutputFormat::Table => {
            if jobs.is_empty() {
                println!("No jobs found.");
                return Ok(());
            }

            println!("{:<38} {:<10} {:<24} ERROR", "JOB ID", "STATUS", "TASK");
            println!("{}", "-".repeat(90));
            for job in jobs {
                // Truncate task if too long
                let task_display = if job.task.chars().count() > 24 {
                    format!("{}...", job.task.chars().take(21).collect::<String>())
                } else {
                    job.task.clone()
                };
                println!(
                    "{:<38} {:<10} {:<24} {}",
                    job.id,
                    job.status,
                    task_display,
                    job.error.as_deref().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}

// =============================================================================
// Run Implementation
// =============================================================================

async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = PoolConfig::new(args.workers, args.queue, Duration::from_secs(args.timeout));
    let executor = SimulatedExecutor::new(
        Duration::from_millis(args.task_base_ms),
        Duration::from_millis(args.task_step_ms),
    );

    let shutdown = install_shutdown_handler()?;
    let service = JobService::start(config, Arc::new(executor))?;

    if args.tasks.is_empty() {
        submit_from_stdin(&service, &shutdown).await?;
    } else {
        for task in args.tasks {
            create_job(&service, task).await?;
        }
    }

    tokio::select! {
        _ = service.wait_idle(Duration::from_millis(100)) => {
            tracing::info!("All jobs reached a final status");
        }
        _ = shutdown.cancelled() => {}
    }

    let store = service.shutdown().await;
    print_jobs(&store.list().await, &args.output)?;

    Ok(())
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Run(run_args) => run(run_args).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_positional_task_does_not_abort_batch() {
        let config = PoolConfig::new(1, 4, Duration::from_secs(1));
        let executor = SimulatedExecutor::new(Duration::from_millis(1), Duration::ZERO);
        let service = JobService::start(config, Arc::new(executor)).unwrap();

        create_job(&service, "  ".to_string()).await.unwrap();
        create_job(&service, "real work".to_string()).await.unwrap();

        let jobs = service.list_jobs().await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].task, "real work");
        service.shutdown().await;
    }
}
