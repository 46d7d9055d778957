//! Application wiring and main loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rpe_auction::AuctionEngine;
use rpe_consensus::{consensus, fetch_all, HttpPriceSource, PriceSource, ReserveTwap};
use rpe_engine::RiskEngine;
use rpe_publisher::{load_signer, LoggingTransport, Publisher};
use rpe_session::{MarketCalendar, SessionClassifier};
use rpe_toxicity::ToxicityHandle;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::{ConsensusSection, NodeConfig};
use crate::error::AppResult;

/// The assembled node.
pub struct Application {
    config: NodeConfig,
    engine: Arc<RiskEngine>,
}

impl Application {
    /// Build the engine from configuration. Rejects bad holiday
    /// entries and unusable estimator settings up front rather than
    /// at first use.
    pub fn new(config: NodeConfig) -> AppResult<Self> {
        let mut calendar = MarketCalendar::default();
        for entry in &config.session.extra_holidays {
            calendar.add_holiday(entry)?;
        }

        let engine = Arc::new(RiskEngine::new(
            ToxicityHandle::new(config.toxicity.clone())?,
            SessionClassifier::new(calendar),
            AuctionEngine::new(config.auction.engine.clone()),
        ));

        Ok(Self { config, engine })
    }

    #[must_use]
    pub fn engine(&self) -> Arc<RiskEngine> {
        Arc::clone(&self.engine)
    }

    /// Run until ctrl-c.
    pub async fn run(self) -> AppResult<()> {
        let signer = load_signer(&self.config.publisher.key_source())?;
        info!(address = %signer.address(), "publisher key loaded");

        let publisher = Arc::new(Publisher::new(
            self.engine(),
            Arc::new(LoggingTransport),
            signer,
            self.config.publisher.publisher.clone(),
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut tasks = Vec::new();
        tasks.push(tokio::spawn(publisher.run(shutdown_rx.clone())));
        tasks.push(tokio::spawn(consensus_loop(
            self.engine(),
            self.config.consensus.clone(),
            shutdown_rx.clone(),
        )));
        tasks.push(tokio::spawn(sweep_loop(
            self.engine(),
            self.config.auction.sweep_secs,
            shutdown_rx,
        )));

        tokio::signal::ctrl_c().await?;
        info!("shutdown requested");
        let _ = shutdown_tx.send(true);

        for task in tasks {
            let _ = task.await;
        }
        info!("node stopped");
        Ok(())
    }
}

/// Poll external sources and install the consensus observation.
///
/// Successful consensus prices are also recorded into the reserve
/// window, so a total source outage degrades to recent history.
async fn consensus_loop(
    engine: Arc<RiskEngine>,
    section: ConsensusSection,
    mut shutdown: watch::Receiver<bool>,
) {
    let sources: Vec<Arc<dyn PriceSource>> = section
        .sources
        .iter()
        .map(|s| {
            Arc::new(HttpPriceSource::new(&s.name, &s.url, s.kind)) as Arc<dyn PriceSource>
        })
        .collect();
    if sources.is_empty() {
        warn!("no price sources configured, consensus will run degraded");
    }

    let mut twap = ReserveTwap::new(section.aggregator.twap_window_secs);
    let mut poll = tokio::time::interval(Duration::from_secs(section.poll_secs.max(1)));
    poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = poll.tick() => {
                let now = Utc::now();
                let observations =
                    fetch_all(&sources, &section.asset, section.aggregator.source_timeout_ms).await;
                let result = consensus(&observations, Some(&twap), &section.aggregator, now);

                if result.confidence > 0.0 && result.price.is_positive() {
                    twap.record(now, result.price.inner());
                }
                engine.apply_consensus(result);
            }
            res = shutdown.changed() => {
                if res.is_err() || *shutdown.borrow() {
                    info!("consensus loop stopping");
                    break;
                }
            }
        }
    }
}

/// Settle due auctions and garbage-collect old ones on a timer.
async fn sweep_loop(engine: Arc<RiskEngine>, sweep_secs: u64, mut shutdown: watch::Receiver<bool>) {
    let mut poll = tokio::time::interval(Duration::from_secs(sweep_secs.max(1)));
    poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = poll.tick() => {
                engine.auctions().sweep(Utc::now());
            }
            res = shutdown.changed() => {
                if res.is_err() || *shutdown.borrow() {
                    info!("sweep loop stopping");
                    break;
                }
            }
        }
    }
}
