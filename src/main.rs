//! ClaimGuard HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use claimguard::config::Config;
use claimguard::consensus::ConsensusEngine;
use claimguard::evidence::{AggregatorConfig, EvidenceAggregator};
use claimguard::explain::Explainer;
use claimguard::gateway::{AppState, create_router};
use claimguard::memory::{MemoryStore, PruneScheduler};
use claimguard::observability::Telemetry;
use claimguard::pipeline::Analyzer;
use claimguard::providers::{CompletionProvider, DuckDuckGoSearch, GenaiProvider};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        storage_path = %config.storage_path.display(),
        verifiers = ?config.verifier_models,
        "ClaimGuard starting"
    );

    let telemetry = Telemetry::tracing();

    let search = Arc::new(DuckDuckGoSearch::new(config.search_region.clone()));
    let evidence = EvidenceAggregator::new(
        search,
        AggregatorConfig {
            call_timeout: config.call_timeout,
            ..AggregatorConfig::default()
        },
        telemetry.clone(),
    );

    let backends = config
        .verifier_models
        .iter()
        .map(|model| Arc::new(GenaiProvider::new(model.clone())) as Arc<dyn CompletionProvider>)
        .collect();
    let consensus = ConsensusEngine::new(backends, telemetry.clone())
        .with_retry(config.retry_policy())
        .with_call_timeout(config.call_timeout);

    let explainer = Explainer::new(
        Arc::new(GenaiProvider::new(config.explainer_model.clone())),
        telemetry.clone(),
    )
    .with_call_timeout(config.call_timeout);

    let memory = MemoryStore::open(config.memory_config())?;
    let scheduler = PruneScheduler::new(memory.clone(), config.prune_interval);
    let _prune_task = scheduler.start();

    let analyzer = Analyzer::new(evidence, consensus, explainer, memory, telemetry);
    let app = create_router(AppState::new(analyzer));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(scheduler))
        .await?;

    tracing::info!("ClaimGuard shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var(Config::ENV_PORT)
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let Ok(rt) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return 1;
    };

    rt.block_on(async {
        let Ok(client) = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        else {
            return 1;
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal(scheduler: PruneScheduler) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }

    scheduler.stop();
}
