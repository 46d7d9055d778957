//! External price sources and concurrent fan-out.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rpe_core::{Price, PriceObservation, PriceSourceKind};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ConsensusError, ConsensusResult};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// An independent external price source.
///
/// Implementations perform network calls; the aggregator tolerates any
/// subset being unavailable.
pub trait PriceSource: Send + Sync {
    /// Human-readable source name for logging.
    fn name(&self) -> &str;

    /// Fetch the current price for an asset.
    fn get_price<'a>(&'a self, asset: &'a str) -> BoxFuture<'a, ConsensusResult<PriceObservation>>;
}

/// Fetch all sources concurrently with a per-source timeout.
///
/// A slow source must not stall the others: every call is issued
/// immediately and individually bounded. Failures and timeouts are
/// logged and dropped; whatever succeeded is returned.
pub async fn fetch_all(
    sources: &[Arc<dyn PriceSource>],
    asset: &str,
    timeout_ms: u64,
) -> Vec<PriceObservation> {
    let timeout = Duration::from_millis(timeout_ms);

    let calls = sources.iter().map(|source| {
        let source = Arc::clone(source);
        let asset = asset.to_string();
        async move {
            let result = match tokio::time::timeout(timeout, source.get_price(&asset)).await {
                Ok(inner) => inner,
                Err(_) => Err(ConsensusError::Timeout(timeout_ms)),
            };
            match result {
                Ok(obs) => Some(obs),
                Err(e) => {
                    warn!(source = source.name(), error = %e, "price source dropped");
                    None
                }
            }
        }
    });

    let results = futures_util::future::join_all(calls).await;
    let observations: Vec<PriceObservation> = results.into_iter().flatten().collect();
    debug!(
        fetched = observations.len(),
        total = sources.len(),
        "source fan-out complete"
    );
    observations
}

/// JSON payload shape the HTTP source expects.
#[derive(Debug, Deserialize)]
struct PricePayload {
    price: String,
    #[serde(default = "default_payload_confidence")]
    confidence: f64,
    published_at: DateTime<Utc>,
}

fn default_payload_confidence() -> f64 {
    1.0
}

/// Price source backed by an HTTP JSON endpoint.
///
/// Expects `GET {base_url}/{asset}` returning
/// `{"price": "...", "confidence": 0.95, "published_at": "..."}`.
pub struct HttpPriceSource {
    name: String,
    base_url: String,
    kind: PriceSourceKind,
    client: reqwest::Client,
}

impl HttpPriceSource {
    #[must_use]
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, kind: PriceSourceKind) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            kind,
            client: reqwest::Client::new(),
        }
    }
}

impl PriceSource for HttpPriceSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_price<'a>(&'a self, asset: &'a str) -> BoxFuture<'a, ConsensusResult<PriceObservation>> {
        Box::pin(async move {
            let url = format!("{}/{}", self.base_url.trim_end_matches('/'), asset);
            let payload: PricePayload = self
                .client
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            let price: Price = payload
                .price
                .parse()
                .map_err(|e| ConsensusError::MalformedPayload(format!("price: {e}")))?;

            Ok(PriceObservation::new(
                price,
                payload.published_at,
                self.kind,
                payload.confidence,
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    struct FixedSource {
        name: &'static str,
        price: Price,
        delay_ms: u64,
        fail: bool,
    }

    impl PriceSource for FixedSource {
        fn name(&self) -> &str {
            self.name
        }

        fn get_price<'a>(
            &'a self,
            _asset: &'a str,
        ) -> BoxFuture<'a, ConsensusResult<PriceObservation>> {
            Box::pin(async move {
                if self.delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
                }
                if self.fail {
                    return Err(ConsensusError::MalformedPayload("bad body".into()));
                }
                Ok(PriceObservation::new(
                    self.price,
                    Utc.timestamp_opt(1_760_000_000, 0).unwrap(),
                    PriceSourceKind::Primary,
                    0.9,
                ))
            })
        }
    }

    #[tokio::test]
    async fn test_fetch_all_collects_successes() {
        let sources: Vec<Arc<dyn PriceSource>> = vec![
            Arc::new(FixedSource {
                name: "a",
                price: Price::new(dec!(100)),
                delay_ms: 0,
                fail: false,
            }),
            Arc::new(FixedSource {
                name: "b",
                price: Price::new(dec!(101)),
                delay_ms: 0,
                fail: false,
            }),
        ];

        let obs = fetch_all(&sources, "XYZ", 200).await;
        assert_eq!(obs.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_all_drops_failures() {
        let sources: Vec<Arc<dyn PriceSource>> = vec![
            Arc::new(FixedSource {
                name: "ok",
                price: Price::new(dec!(100)),
                delay_ms: 0,
                fail: false,
            }),
            Arc::new(FixedSource {
                name: "broken",
                price: Price::new(dec!(0)),
                delay_ms: 0,
                fail: true,
            }),
        ];

        let obs = fetch_all(&sources, "XYZ", 200).await;
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].price.inner(), dec!(100));
    }

    #[tokio::test]
    async fn test_slow_source_times_out_without_stalling() {
        let sources: Vec<Arc<dyn PriceSource>> = vec![
            Arc::new(FixedSource {
                name: "fast",
                price: Price::new(dec!(100)),
                delay_ms: 0,
                fail: false,
            }),
            Arc::new(FixedSource {
                name: "slow",
                price: Price::new(dec!(999)),
                delay_ms: 5_000,
                fail: false,
            }),
        ];

        let started = std::time::Instant::now();
        let obs = fetch_all(&sources, "XYZ", 100).await;
        // The fast source's result survives and the whole fan-out is
        // bounded by the timeout, not the slow source.
        assert_eq!(obs.len(), 1);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_fetch_all_empty_sources() {
        let sources: Vec<Arc<dyn PriceSource>> = Vec::new();
        let obs = fetch_all(&sources, "XYZ", 100).await;
        assert!(obs.is_empty());
    }
}
