//! Service binary: configure, connect, awaken, serve
//!
//! Exit codes: 0 normal shutdown, 64 bad configuration, 69 port in use,
//! 74 store unavailable in strict mode.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cynic_core::storage::Store;
use cynic_kernel::config::{exit_codes, KernelConfig};
use cynic_kernel::context::KernelContext;
use cynic_kernel::service::router;
use cynic_storage_turso::TursoStore;

#[derive(Parser)]
#[command(name = "cynic-kernel")]
#[command(about = "Judgment and learning kernel behind the host's hooks")]
#[command(version, long_about = None)]
struct Cli {
    /// HTTP port (overrides CYNIC_KERNEL_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Database URL (overrides CYNIC_DB_URL)
    #[arg(long, value_name = "URL")]
    db: Option<String>,

    /// Refuse to start without a reachable store (exit 74 instead of SAFE mode)
    #[arg(long)]
    strict: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose || std::env::var("CYNIC_DEBUG").is_ok() {
        "debug,libsql=info"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let config = match KernelConfig::from_env(cli.port, cli.db, cli.strict) {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "bad configuration");
            return ExitCode::from(exit_codes::CONFIG);
        }
    };

    let store: Option<Arc<dyn Store>> = match connect_store(&config).await {
        Some(store) => Some(store),
        None if config.strict => {
            error!(db = %config.db_url, "store unavailable in strict mode");
            return ExitCode::from(exit_codes::STORE_UNAVAILABLE);
        }
        None => {
            warn!(db = %config.db_url, "store unavailable, continuing in SAFE mode");
            None
        }
    };

    let addr = format!("127.0.0.1:{}", config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
            error!(%addr, "port already in use");
            return ExitCode::from(exit_codes::PORT_IN_USE);
        }
        Err(err) => {
            error!(%err, %addr, "failed to bind");
            return ExitCode::from(exit_codes::PORT_IN_USE);
        }
    };

    if let Err(err) = cynic_kernel::llm::detect_and_write(&config.llm_detection_path()).await {
        warn!(%err, "llm detection failed");
    }

    let ctx = match KernelContext::initialize(config, store).await {
        Ok(ctx) => ctx,
        Err(err) => {
            error!(%err, "kernel initialization failed");
            return ExitCode::from(exit_codes::STORE_UNAVAILABLE);
        }
    };

    info!(%addr, mode = ?ctx.boot.mode, "kernel listening");
    let app = router(Arc::clone(&ctx));
    let shutdown_ctx = Arc::clone(&ctx);

    let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
    });

    if let Err(err) = serve.await {
        error!(%err, "server error");
        return ExitCode::from(exit_codes::PORT_IN_USE);
    }

    // Session end: flush counters, seal orphans, write the handoff
    if let Err(err) = shutdown_ctx.shutdown().await {
        error!(%err, "session flush failed");
    }
    info!("kernel asleep");
    ExitCode::from(exit_codes::OK)
}

/// Try the store with the transient-retry policy; `None` means exhausted
async fn connect_store(config: &KernelConfig) -> Option<Arc<dyn Store>> {
    match cynic_storage_turso::with_retry("connect_store", || {
        TursoStore::connect(&config.db_url, "")
    })
    .await
    {
        Ok(store) => {
            info!(db = %config.db_url, "store connected");
            Some(Arc::new(store))
        }
        Err(err) => {
            warn!(%err, "store connection failed after retries");
            None
        }
    }
}
