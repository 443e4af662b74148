use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::broadcast;
use tracing::{info, warn};

use shift_scheduler::api;
use shift_scheduler::cli::{Cli, Command};
use shift_scheduler::config::SchedulerConfig;
use shift_scheduler::lock::{InMemoryLockManager, LockManager, RedisLockManager};
use shift_scheduler::membership::MembershipClient;
use shift_scheduler::pool::WorkerPool;
use shift_scheduler::schedule::{AssignmentGenerator, calendar};
use shift_scheduler::service::ScheduleService;
use shift_scheduler::store::{InMemoryJobRepository, JobRepository};
use shift_scheduler::sweep::PromotionSweep;
use shift_scheduler::telemetry;
use shift_scheduler::ui::SchedulePrinter;
use shift_scheduler::worker::GenerationWorker;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(if cli.verbose { "debug" } else { "info" }, cli.json_logs);

    let config = SchedulerConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve { bind } => serve(config, bind).await,
        Command::Preview {
            staff,
            week_begin,
            seed,
            json,
        } => preview(&config, staff, week_begin, seed, json),
    }
}

async fn serve(config: SchedulerConfig, bind: Option<String>) -> Result<()> {
    let jobs: Arc<dyn JobRepository> = Arc::new(InMemoryJobRepository::new());

    let locks: Arc<dyn LockManager> = match config.redis_url.as_deref() {
        Some(url) => Arc::new(
            RedisLockManager::connect(url)
                .await
                .with_context(|| format!("failed to connect to redis at {url}"))?,
        ),
        None => {
            warn!("no redis_url configured, job locks are local to this process");
            Arc::new(InMemoryLockManager::new())
        }
    };

    let directory = Arc::new(
        MembershipClient::new(&config.membership).context("invalid membership client config")?,
    );
    let worker = GenerationWorker::new(
        jobs.clone(),
        locks,
        directory,
        AssignmentGenerator::new(config.rules),
        config.lock.key_prefix.clone(),
        config.lock.ttl(),
    );
    let pool = Arc::new(WorkerPool::start(
        worker,
        config.worker.pool_size,
        config.worker.queue_capacity,
    ));

    let (shutdown_tx, _) = broadcast::channel(1);
    let sweep = config.sweep.enabled.then(|| {
        PromotionSweep::new(jobs.clone()).spawn_daily(config.sweep.run_at, shutdown_tx.subscribe())
    });

    let service = Arc::new(ScheduleService::new(jobs, pool.clone()));
    let app = api::build_router(service);

    let bind = bind.unwrap_or(config.server.bind);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(%bind, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await?;

    let _ = shutdown_tx.send(());
    pool.shutdown().await;
    if let Some(handle) = sweep {
        let _ = handle.await;
    }
    info!(stats = ?pool.stats(), "stopped");
    Ok(())
}

fn preview(
    config: &SchedulerConfig,
    staff: Vec<String>,
    week_begin: NaiveDate,
    seed: Option<u64>,
    json: bool,
) -> Result<()> {
    if !calendar::is_week_start(week_begin) {
        bail!("--week-begin {week_begin} is not a Monday");
    }
    let staff: BTreeSet<String> = staff
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if staff.is_empty() {
        bail!("--staff needs at least one id");
    }

    let generator = AssignmentGenerator::new(config.rules);
    let assignments = match seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            generator.generate_with_rng(&staff, week_begin, &mut rng)?
        }
        None => generator.generate(&staff, week_begin)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&assignments)?);
    } else {
        SchedulePrinter::new().print_schedule(week_begin, &assignments);
    }
    Ok(())
}
