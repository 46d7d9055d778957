//! Publish loop: periodic ticks plus change triggers.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use alloy::signers::local::PrivateKeySigner;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rpe_engine::{EngineSnapshot, RiskEngine};
use rpe_session::Regime;
use rpe_telemetry::Metrics;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::PublishResult;
use crate::transport::BroadcastTransport;
use crate::update::{ParameterUpdate, SignedParameterUpdate};

/// Publisher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Channel identifier stamped into every update.
    #[serde(default = "default_channel_id")]
    pub channel_id: String,

    /// Unconditional publish interval.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: i64,

    /// Publish immediately when toxicity moved at least this much
    /// since the last published update.
    #[serde(default = "default_toxicity_delta")]
    pub toxicity_delta: f64,

    /// How often the loop samples the engine for change triggers.
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,
}

fn default_channel_id() -> String {
    "risk-params/main".to_string()
}
fn default_interval_secs() -> i64 {
    15
}
fn default_toxicity_delta() -> f64 {
    0.1
}
fn default_poll_secs() -> u64 {
    1
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            channel_id: default_channel_id(),
            interval_secs: default_interval_secs(),
            toxicity_delta: default_toxicity_delta(),
            poll_secs: default_poll_secs(),
        }
    }
}

/// What the publisher last put on the wire. Only updated after a
/// successful send, so a failed publish is naturally re-detected and
/// retried on the next tick.
#[derive(Debug, Default)]
struct PublishState {
    last_seq: u64,
    last_regime: Option<Regime>,
    last_toxicity: Option<f64>,
    last_published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, PartialEq)]
enum Decision {
    /// A newer snapshot was already published; drop this one.
    Superseded,
    /// Nothing changed and the interval has not elapsed.
    Hold,
    Publish,
}

/// Signs and broadcasts parameter updates.
pub struct Publisher {
    engine: Arc<RiskEngine>,
    transport: Arc<dyn BroadcastTransport>,
    signer: PrivateKeySigner,
    cfg: PublisherConfig,
    state: Mutex<PublishState>,
}

impl Publisher {
    #[must_use]
    pub fn new(
        engine: Arc<RiskEngine>,
        transport: Arc<dyn BroadcastTransport>,
        signer: PrivateKeySigner,
        cfg: PublisherConfig,
    ) -> Self {
        Self {
            engine,
            transport,
            signer,
            cfg,
            state: Mutex::new(PublishState::default()),
        }
    }

    /// Offer one snapshot for publication.
    ///
    /// Returns `Ok(true)` when an update went out. Snapshots with a
    /// `seq` at or below the last published one are dropped: updates
    /// are superseded, never re-ordered. Signing and sending happen
    /// with no lock held.
    pub async fn offer(&self, snapshot: EngineSnapshot, now: DateTime<Utc>) -> PublishResult<bool> {
        let decision = self.decide(&snapshot, now);
        match decision {
            Decision::Superseded => {
                Metrics::publish("skipped");
                debug!(seq = snapshot.seq, "snapshot superseded, dropped");
                return Ok(false);
            }
            Decision::Hold => return Ok(false),
            Decision::Publish => {}
        }

        let update = ParameterUpdate::from_snapshot(self.cfg.channel_id.clone(), &snapshot);
        let signed = SignedParameterUpdate::sign(update, &self.signer).await?;

        match self.transport.send(&signed).await {
            Ok(()) => {
                let mut state = self.state.lock();
                state.last_seq = snapshot.seq;
                state.last_regime = Some(snapshot.regime);
                state.last_toxicity = Some(snapshot.toxicity);
                state.last_published_at = Some(now);
                Metrics::publish("sent");
                Ok(true)
            }
            Err(e) => {
                // State untouched: the same change fires again next tick.
                Metrics::publish("failed");
                Err(e)
            }
        }
    }

    fn decide(&self, snapshot: &EngineSnapshot, now: DateTime<Utc>) -> Decision {
        let state = self.state.lock();

        if snapshot.seq <= state.last_seq {
            return Decision::Superseded;
        }

        let due = match state.last_published_at {
            None => true,
            Some(at) => now - at >= Duration::seconds(self.cfg.interval_secs),
        };
        let regime_changed = state
            .last_regime
            .map_or(true, |last| last != snapshot.regime);
        let toxicity_moved = state
            .last_toxicity
            .map_or(true, |last| (snapshot.toxicity - last).abs() >= self.cfg.toxicity_delta);

        if due || regime_changed || toxicity_moved {
            Decision::Publish
        } else {
            Decision::Hold
        }
    }

    /// Run until the shutdown signal flips.
    ///
    /// Samples the engine every `poll_secs` so change triggers fire
    /// promptly; the unconditional interval is enforced inside
    /// [`Publisher::offer`]. Transport failures are logged and retried
    /// on the next tick.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut poll =
            tokio::time::interval(StdDuration::from_secs(self.cfg.poll_secs.max(1)));
        poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(
            channel = %self.cfg.channel_id,
            interval_secs = self.cfg.interval_secs,
            "publisher started"
        );

        loop {
            tokio::select! {
                _ = poll.tick() => {
                    let now = Utc::now();
                    let snapshot = self.engine.snapshot(now);
                    if let Err(e) = self.offer(snapshot, now).await {
                        warn!(error = %e, "publish failed, retrying next tick");
                    }
                }
                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        info!("publisher shutting down");
                        break;
                    }
                }
            }
        }
    }
}
