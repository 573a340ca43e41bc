// Rust guideline compliant 2026-10-15

//! SaferPlace entry point.
//!
//! Wires the intake and moderation pipeline from configuration:
//!
//! ```text
//! generator -> Reporter -> MemoryQueue -> N x ModerationWorker -> Database + Notifier
//!                                                                      |
//!                                       demo reviewer + viewer  <------+
//! ```
//!
//! All tasks share one `CancellationToken`: the first worker failure, a
//! failing demo reviewer, or CTRL+C cancels the rest.
//!
//! # Usage
//!
//! ```text
//! # Defaults: in-memory queue and database, demo traffic on
//! RUST_LOG=info cargo run --bin saferplace
//!
//! # Explicit config file, SQLite store
//! SAFERPLACE_DATABASE_PROVIDER=sqlite cargo run --bin saferplace -- saferplace.toml
//! ```

mod adapters;
mod config;
mod demo;

use std::time::Duration;

use adapters::DatabaseBackend;
use adapters::in_memory_database::InMemoryDatabase;
use adapters::in_memory_storage::InMemoryStorage;
use adapters::log_notifier::LogNotifier;
use adapters::memory_queue::MemoryQueue;
use adapters::sqlite_database::SqliteDatabase;
use anyhow::Context as _;
use config::{AppConfig, DatabaseProvider, NotifierProvider, QueueProvider};
use demo::DemoReviewer;
use domain::{Coordinates, Incident};
use moderation::{ModerationWorker, WorkerConfig};
use report::generator::{Generator, GeneratorConfig};
use report::{ReportConfig, Reporter};
use review::{ReviewConfig, Reviewer};
use score::{ScoreConfig, ScoreEngine};
use stations::{AddressResolver, Catalog};
use tokio_util::sync::CancellationToken;
use tracing::Instrument as _;
use tracing_subscriber::EnvFilter;
use viewer::{Viewer, ViewerConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env before reading SAFERPLACE_* variables; report the outcome
    // once logging is up.
    let dotenv = dotenvy::dotenv();

    let path =
        config::config_path(std::env::args().nth(1), std::env::var("SAFERPLACE_CONFIG").ok());
    let mut app = AppConfig::load(&path).context("failed to load configuration")?;
    app.apply_env(|key| std::env::var(key).ok()).context("invalid environment override")?;
    app.validate().context("invalid configuration")?;

    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&app.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter.context("invalid log filter")?)
        .init();

    match dotenv {
        Ok(env_path) => tracing::info!(path = %env_path.display(), "main.dotenv.loaded"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "main.dotenv.ignored"),
    }
    tracing::info!(
        path = %path.display(),
        database = ?app.database.provider,
        workers = app.moderation.workers,
        "main.config.loaded"
    );

    // -- Safety score: static catalog, calibrated once --
    let catalog = Catalog::load_files(&app.stations.locations, &app.stations.crimes)
        .context("failed to load station catalog")?;
    let score_config = ScoreConfig::builder()
        .nearest(app.score.nearest)
        .years(app.score.years)
        .reference_year(app.score.reference_year)
        .noise_floor(app.score.noise_floor)
        .build()
        .context("failed to build score config")?;
    let engine = ScoreEngine::new(catalog, score_config).context("failed to build score engine")?;
    let centre = Coordinates::new(app.demo.centre_lat, app.demo.centre_lon);
    let centre_score =
        engine.score(centre.lat, centre.lon).context("failed to score demo centre")?;
    tracing::info!(lat = centre.lat, lon = centre.lon, score = centre_score, "main.score.centre");

    // -- Address search: rough prefix -> coordinates -> score --
    let resolver = AddressResolver::load_file(&app.stations.prefixes)
        .context("failed to load address prefixes")?;
    for address in &app.demo.searches {
        match engine.score_address(&resolver, address) {
            Ok(found) => tracing::info!(
                address = %address,
                name = %found.name,
                score = found.score,
                rounded = found.rounded,
                "main.search.scored"
            ),
            Err(e) => tracing::warn!(address = %address, error = %e, "main.search.failed"),
        }
    }

    // -- Adapters, selected by provider --
    let queue: MemoryQueue<Incident> = match app.queue.provider {
        QueueProvider::Memory => MemoryQueue::new(app.queue.capacity),
    };
    let db = match app.database.provider {
        DatabaseProvider::Memory => DatabaseBackend::Memory(InMemoryDatabase::new()),
        DatabaseProvider::Sqlite => DatabaseBackend::Sqlite(
            SqliteDatabase::new(&app.database.url)
                .await
                .context("failed to open SQLite database")?,
        ),
    };
    let notifier = match app.notifier.provider {
        NotifierProvider::Log => LogNotifier::new(&app.notifier.review_url),
    };
    let storage = InMemoryStorage::new();

    // -- Components --
    let worker_config = WorkerConfig::builder()
        .failure_policy(app.failure_policy()?)
        .build()
        .context("failed to build worker config")?;
    let worker = ModerationWorker::new(worker_config);

    let reporter =
        Reporter::new(ReportConfig::builder().build().context("failed to build report config")?);
    let mut generator_config =
        GeneratorConfig::builder(centre).interval(Duration::from_millis(app.demo.interval_ms));
    if let Some(n) = app.demo.iterations {
        generator_config = generator_config.iterations(n);
    }
    let generator =
        Generator::new(generator_config.build().context("failed to build generator config")?);

    let reviewer = Reviewer::new(
        ReviewConfig::builder()
            .session_ttl(Duration::from_secs(app.session.ttl_secs))
            .build()
            .context("failed to build review config")?,
    );
    let viewer =
        Viewer::new(ViewerConfig::builder().build().context("failed to build viewer config")?);

    let cancel = CancellationToken::new();

    // -- Moderation workers: the first error cancels everything --
    let workers = {
        let count = app.moderation.workers;
        let (worker, queue, db, notifier, cancel) = (&worker, &queue, &db, &notifier, &cancel);
        async move {
            let runs = (0..count).map(move |n| {
                async move {
                    let result = worker.run(queue, db, notifier, cancel).await;
                    if let Err(e) = &result {
                        tracing::error!(error = %e, "main.worker.failed: cancelling");
                        cancel.cancel();
                    }
                    result
                }
                .instrument(tracing::info_span!("worker", n))
            });
            let result = futures::future::try_join_all(runs).await.map(drop);
            // Queue closed or worker failed: nothing left to moderate.
            cancel.cancel();
            result
        }
    };

    // -- Report generator: closes the queue when done so workers drain --
    let generate = async {
        if !app.demo.enabled {
            return Ok(());
        }
        let result = tokio::select! {
            () = cancel.cancelled() => Ok(()),
            r = generator.run(&reporter, &queue, &storage) => r,
        };
        queue.close();
        result
    }
    .instrument(tracing::info_span!("generator"));

    // -- Demo reviewer and map viewer --
    let review = async {
        if !app.demo.enabled {
            return Ok(());
        }
        let demo = DemoReviewer {
            db: &db,
            reviewer: &reviewer,
            viewer: &viewer,
            centre,
            interval: Duration::from_millis(app.demo.review_interval_ms),
        };
        let result = demo.run(&cancel).await;
        if result.is_err() {
            cancel.cancel();
        }
        result
    }
    .instrument(tracing::info_span!("reviewer"));

    // -- CTRL+C --
    let signal = async {
        tokio::select! {
            r = tokio::signal::ctrl_c() => {
                r.context("failed to listen for ctrl_c")?;
                tracing::info!("main.shutdown: ctrl_c received, cancelling");
                cancel.cancel();
            }
            () = cancel.cancelled() => {}
        }
        anyhow::Ok(())
    };

    let (w, g, r, s) = tokio::join!(workers, generate, review, signal);
    tracing::info!(pending = queue.len(), "main.shutdown: complete");
    w.context("moderation worker failed")
        .and(g.context("report generator failed"))
        .and(r.context("demo reviewer failed"))
        .and(s)
}
