//! The kernel context: one record owning every component
//!
//! No global singletons. The context is built once at boot, wrapped in an
//! `Arc`, and handed to the HTTP layer as axum state; tests construct it
//! against a temp store or in SAFE mode.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use cynic_core::chain::Chain;
use cynic_core::storage::Store;
use cynic_core::{HarmonicLoop, Judge, Learner, Perceiver, Result};

use crate::config::KernelConfig;
use crate::orchestrator::{self, BootReport, SessionCounters};
use crate::service::workers::WorkerPool;

/// How often the chain writer sweeps orphans into a block
const CHAIN_SEAL_INTERVAL_SECS: u64 = 30;

/// Everything the service needs, dependency-injected
pub struct KernelContext {
    pub config: KernelConfig,
    pub store: Option<Arc<dyn Store>>,
    pub judge: Arc<Judge>,
    pub learner: Arc<Learner>,
    pub harmonic: Arc<HarmonicLoop>,
    pub chain: Option<Chain>,
    pub perceiver: Perceiver,
    pub workers: WorkerPool,
    pub boot: BootReport,
    pub counters: SessionCounters,
    pub started_at: Instant,
}

impl KernelContext {
    /// Wire up the full kernel against an optional store.
    ///
    /// `store = None` is SAFE mode: judging and in-memory learning still
    /// work, nothing persists, `degraded` is reported everywhere.
    pub async fn initialize(
        config: KernelConfig,
        store: Option<Arc<dyn Store>>,
    ) -> Result<Arc<Self>> {
        let judge = Arc::new(Judge::new());
        let learner = Arc::new(Learner::new(store.clone()));
        let harmonic = Arc::new(HarmonicLoop::new(
            store.clone(),
            Arc::clone(&learner),
            Arc::clone(&judge),
        ));
        let chain = store.clone().map(Chain::new);
        let workers = WorkerPool::spawn(
            store.clone(),
            Arc::clone(&learner),
            Arc::clone(&harmonic),
        );

        let boot = orchestrator::awaken(&config, store.as_ref()).await?;
        info!(mode = ?boot.mode, experience = ?boot.experience, "kernel awake");

        if let Some(chain) = chain.clone() {
            spawn_chain_writer(chain);
        }

        Ok(Arc::new(Self {
            config,
            store,
            judge,
            learner,
            harmonic,
            chain,
            perceiver: Perceiver::new(),
            workers,
            boot,
            counters: SessionCounters::default(),
            started_at: Instant::now(),
        }))
    }

    pub fn degraded(&self) -> bool {
        self.boot.degraded
    }

    /// Flush session state at shutdown
    pub async fn shutdown(&self) -> Result<()> {
        if let Some(chain) = &self.chain {
            if let Err(err) = chain.adopt_orphans().await {
                error!(%err, "final orphan adoption failed");
            }
        }
        let duration_ms = self.started_at.elapsed().as_millis() as u64;
        orchestrator::sleep(
            &self.config,
            self.store.as_ref(),
            &self.harmonic,
            &self.counters,
            duration_ms,
        )
        .await?;
        Ok(())
    }
}

/// The single chain-writer task: periodically sweeps orphan judgments
/// into the next block. Sealing is serialized inside `Chain`; this task
/// is merely the clock.
fn spawn_chain_writer(chain: Chain) {
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(CHAIN_SEAL_INTERVAL_SECS));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match chain.adopt_orphans().await {
                Ok(Some(block)) => {
                    info!(
                        block_number = block.block_number,
                        judgments = block.judgment_count,
                        "sealed pending judgments"
                    );
                }
                Ok(None) => {}
                Err(err) => error!(%err, "chain sealing failed"),
            }
        }
    });
}
