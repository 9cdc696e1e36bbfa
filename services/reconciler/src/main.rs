use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use api::{config::AppConfig, engine::Reconciler, repositories::Repositories};
use common::database::{DatabaseConfig, health_check, init_pool};

async fn reconcile_once(reconciler: &Reconciler) {
    match reconciler.run().await {
        Ok(report) => info!(
            "Reconciliation finished: {} users and {} projects repaired",
            report.users_repaired, report.projects_repaired
        ),
        Err(e) => error!("Reconciliation failed: {}", e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting reconciler service");

    let config = AppConfig::from_env()?;

    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;
    if !health_check(&pool).await? {
        anyhow::bail!("Failed to connect to database");
    }

    let reconciler = Reconciler::new(Repositories::postgres(pool));

    // Repair whatever drifted while the service was down
    reconcile_once(&reconciler).await;

    let scheduler = JobScheduler::new().await?;
    let job = Job::new_async(config.reconcile_schedule.as_str(), move |_, _| {
        let reconciler = reconciler.clone();
        Box::pin(async move {
            info!("Reconciliation job executed");
            reconcile_once(&reconciler).await;
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    info!(
        "Started reconciliation scheduler with schedule: {}",
        config.reconcile_schedule
    );

    // Keep the service running
    tokio::signal::ctrl_c().await?;
    info!("Shutting down reconciler service");

    Ok(())
}
