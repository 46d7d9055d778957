//! Broadcast transports.

use std::pin::Pin;

use parking_lot::Mutex;
use tracing::info;

use crate::error::{PublishError, PublishResult};
use crate::update::SignedParameterUpdate;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Delivery channel for signed parameter updates.
///
/// The production transport (on-chain or gossip broadcast) lives
/// outside this crate; implementors plug in here.
pub trait BroadcastTransport: Send + Sync {
    fn send<'a>(&'a self, update: &'a SignedParameterUpdate) -> BoxFuture<'a, PublishResult<()>>;
}

/// Stand-in transport that traces each update instead of delivering it.
#[derive(Debug, Default)]
pub struct LoggingTransport;

impl BroadcastTransport for LoggingTransport {
    fn send<'a>(&'a self, update: &'a SignedParameterUpdate) -> BoxFuture<'a, PublishResult<()>> {
        Box::pin(async move {
            info!(
                channel = %update.update.channel_id,
                seq = update.update.seq,
                regime = %update.update.regime,
                fee_bps = update.update.recommended_fee_bps,
                breaker = update.update.breaker_level,
                signer = %update.signer,
                "parameter update published"
            );
            Ok(())
        })
    }
}

/// In-memory transport that records every update it receives.
/// Intended for tests; can be toggled to fail.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<SignedParameterUpdate>>,
    fail: Mutex<bool>,
}

impl RecordingTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (or succeed again).
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock() = fail;
    }

    #[must_use]
    pub fn sent(&self) -> Vec<SignedParameterUpdate> {
        self.sent.lock().clone()
    }

    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

impl BroadcastTransport for RecordingTransport {
    fn send<'a>(&'a self, update: &'a SignedParameterUpdate) -> BoxFuture<'a, PublishResult<()>> {
        Box::pin(async move {
            if *self.fail.lock() {
                return Err(PublishError::Transport("injected failure".to_string()));
            }
            self.sent.lock().push(update.clone());
            Ok(())
        })
    }
}
