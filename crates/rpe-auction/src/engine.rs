//! Concurrent auction registry.
//!
//! Holds every live auction in a `DashMap` keyed by id; all mutation
//! goes through per-entry locks, so independent auctions never contend.
//! Phase transitions are lazy (checked against deadlines on every
//! access) and `sweep` provides the equivalent background path.

use alloy::primitives::B256;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rpe_core::{PoolId, Price};
use rpe_telemetry::Metrics;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auction::{commitment_hash, AuctionConfig, AuctionPhase, GapAuction, Reveal};
use crate::error::{AuctionError, AuctionResult};

/// Read-only view of an auction at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct AuctionStatus {
    pub id: Uuid,
    pub pool: PoolId,
    pub phase: AuctionPhase,
    pub gap_percent: Decimal,
    pub current_min_bid: Price,
    pub commitments: usize,
    pub reveals: usize,
    pub winner: Option<String>,
}

/// Commit-reveal auction engine.
///
/// Validates gap size and liquidity only; whether the venue is in a
/// window where gap auctions make sense is the caller's decision.
pub struct AuctionEngine {
    auctions: DashMap<Uuid, GapAuction>,
    cfg: AuctionConfig,
}

impl AuctionEngine {
    #[must_use]
    pub fn new(cfg: AuctionConfig) -> Self {
        Self {
            auctions: DashMap::new(),
            cfg,
        }
    }

    /// Open a new auction for an overnight gap.
    pub fn start(
        &self,
        pool: PoolId,
        gap_percent: Decimal,
        liquidity_value: Price,
        now: DateTime<Utc>,
    ) -> AuctionResult<Uuid> {
        let auction = GapAuction::new(pool, gap_percent, liquidity_value, now)?;
        let id = auction.id;
        info!(
            %id,
            pool = pool.0,
            gap = %gap_percent,
            floor = %auction.min_bid_base,
            "gap auction started"
        );
        self.auctions.insert(id, auction);
        Ok(id)
    }

    /// Record a bid commitment. Only during the commit phase, one per
    /// bidder.
    pub fn commit(
        &self,
        id: Uuid,
        bidder: &str,
        hash: B256,
        now: DateTime<Utc>,
    ) -> AuctionResult<()> {
        let mut auction = self
            .auctions
            .get_mut(&id)
            .ok_or(AuctionError::UnknownAuction(id))?;
        auction.advance(&self.cfg, now);

        let phase = auction.phase_at(&self.cfg, now);
        if phase != AuctionPhase::Commit {
            Metrics::auction_commit("rejected");
            return Err(AuctionError::PhaseViolation {
                expected: AuctionPhase::Commit,
                actual: phase,
            });
        }
        if auction.commitments.contains_key(bidder) {
            Metrics::auction_commit("rejected");
            return Err(AuctionError::DuplicateCommitment(bidder.to_string()));
        }

        auction.commitments.insert(bidder.to_string(), hash);
        Metrics::auction_commit("accepted");
        debug!(%id, bidder, "commitment recorded");
        Ok(())
    }

    /// Reveal a committed bid.
    ///
    /// The revealed amount and salt must hash to the stored commitment.
    /// A correct reveal below the current floor is recorded (it shows
    /// up in status and audit) but marked invalid and reported as
    /// `BidBelowMinimum`; it can never win.
    pub fn reveal(
        &self,
        id: Uuid,
        bidder: &str,
        amount: Price,
        salt: &str,
        now: DateTime<Utc>,
    ) -> AuctionResult<()> {
        let mut auction = self
            .auctions
            .get_mut(&id)
            .ok_or(AuctionError::UnknownAuction(id))?;
        auction.advance(&self.cfg, now);

        let phase = auction.phase_at(&self.cfg, now);
        if phase != AuctionPhase::Reveal {
            Metrics::auction_reveal("rejected");
            return Err(AuctionError::PhaseViolation {
                expected: AuctionPhase::Reveal,
                actual: phase,
            });
        }
        if auction.reveals.contains_key(bidder) {
            Metrics::auction_reveal("rejected");
            return Err(AuctionError::DuplicateReveal(bidder.to_string()));
        }

        match auction.commitments.get(bidder) {
            Some(&hash) if hash == commitment_hash(bidder, amount, salt) => {}
            Some(&hash) => {
                Metrics::auction_reveal("rejected");
                warn!(%id, bidder, "reveal does not match commitment");
                return Err(AuctionError::CommitmentMismatch {
                    bidder: bidder.to_string(),
                    committed: hash,
                });
            }
            None => {
                Metrics::auction_reveal("rejected");
                return Err(AuctionError::CommitmentMismatch {
                    bidder: bidder.to_string(),
                    committed: B256::ZERO,
                });
            }
        }

        let required = auction.current_min_bid(now);
        let valid = amount >= required;
        auction.reveals.insert(
            bidder.to_string(),
            Reveal {
                amount,
                salt: salt.to_string(),
                revealed_at: now,
                valid,
            },
        );

        if valid {
            Metrics::auction_reveal("valid");
            debug!(%id, bidder, %amount, %required, "valid reveal");
            Ok(())
        } else {
            Metrics::auction_reveal("below_min");
            debug!(%id, bidder, %amount, %required, "reveal below floor, recorded as invalid");
            Err(AuctionError::BidBelowMinimum {
                offered: amount,
                required,
            })
        }
    }

    /// Settle an auction whose reveal deadline has passed.
    ///
    /// Winner is the highest valid reveal; ties break to the earliest
    /// `revealed_at`, then the smallest bidder id. Idempotent: settling
    /// a settled auction returns the recorded winner.
    pub fn settle(&self, id: Uuid, now: DateTime<Utc>) -> AuctionResult<Option<String>> {
        let mut auction = self
            .auctions
            .get_mut(&id)
            .ok_or(AuctionError::UnknownAuction(id))?;

        if auction.phase == AuctionPhase::Settled {
            return Ok(auction.winner.clone());
        }
        if now < auction.reveal_deadline(&self.cfg) {
            return Err(AuctionError::PhaseViolation {
                expected: AuctionPhase::Settled,
                actual: auction.phase_at(&self.cfg, now),
            });
        }

        let mut candidates: Vec<(&String, &Reveal)> =
            auction.reveals.iter().filter(|(_, r)| r.valid).collect();
        candidates.sort_by(|(a_bidder, a), (b_bidder, b)| {
            b.amount
                .cmp(&a.amount)
                .then(a.revealed_at.cmp(&b.revealed_at))
                .then(a_bidder.cmp(b_bidder))
        });
        let winner = candidates.first().map(|(bidder, _)| (*bidder).clone());

        match &winner {
            Some(bidder) => info!(%id, bidder, "auction settled"),
            None => info!(%id, "auction settled with no valid bids"),
        }

        auction.winner = winner.clone();
        auction.phase = AuctionPhase::Settled;
        auction.settled_at = Some(now);
        Ok(winner)
    }

    /// Point-in-time view. Reflects deadline passage without mutating:
    /// an auction past its reveal deadline reads as `Settled` even if
    /// `settle` has not run yet (winner still `None` in that window).
    pub fn status(&self, id: Uuid, now: DateTime<Utc>) -> AuctionResult<AuctionStatus> {
        let auction = self
            .auctions
            .get(&id)
            .ok_or(AuctionError::UnknownAuction(id))?;

        Ok(self.view(&auction, now))
    }

    /// Statuses of every auction still in its commit or reveal window,
    /// ordered by start time. Bidders discover the current auction here
    /// and then follow it by id through `status`. Settled auctions are
    /// excluded but stay readable by id until retention expires.
    #[must_use]
    pub fn active(&self, now: DateTime<Utc>) -> Vec<AuctionStatus> {
        let mut live: Vec<(DateTime<Utc>, AuctionStatus)> = self
            .auctions
            .iter()
            .filter(|a| a.phase_at(&self.cfg, now) != AuctionPhase::Settled)
            .map(|a| (a.started_at, self.view(&a, now)))
            .collect();
        live.sort_by(|(a_started, a), (b_started, b)| {
            a_started.cmp(b_started).then(a.id.cmp(&b.id))
        });
        live.into_iter().map(|(_, status)| status).collect()
    }

    fn view(&self, auction: &GapAuction, now: DateTime<Utc>) -> AuctionStatus {
        AuctionStatus {
            id: auction.id,
            pool: auction.pool,
            phase: auction.phase_at(&self.cfg, now),
            gap_percent: auction.gap_percent,
            current_min_bid: auction.current_min_bid(now),
            commitments: auction.commitments.len(),
            reveals: auction.reveals.len(),
            winner: auction.winner.clone(),
        }
    }

    /// Background maintenance: settle everything past its reveal
    /// deadline, then drop settled auctions past the retention period.
    /// Behaviorally identical to lazy access, just proactive.
    pub fn sweep(&self, now: DateTime<Utc>) {
        let due: Vec<Uuid> = self
            .auctions
            .iter()
            .filter(|e| {
                e.phase != AuctionPhase::Settled && now >= e.reveal_deadline(&self.cfg)
            })
            .map(|e| e.id)
            .collect();
        for id in due {
            if let Err(e) = self.settle(id, now) {
                warn!(%id, error = %e, "sweep settlement failed");
            }
        }

        let retention = Duration::seconds(self.cfg.settled_retention_secs);
        self.auctions.retain(|_, a| match a.settled_at {
            Some(at) => now - at < retention,
            None => true,
        });
    }

    /// Number of auctions currently tracked (live and retained).
    #[must_use]
    pub fn len(&self) -> usize {
        self.auctions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.auctions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_760_000_000 + secs, 0).unwrap()
    }

    fn engine() -> AuctionEngine {
        AuctionEngine::new(AuctionConfig::default())
    }

    fn start(engine: &AuctionEngine) -> Uuid {
        engine
            .start(PoolId(7), dec!(20.00), Price::new(dec!(1000000)), at(0))
            .unwrap()
    }

    #[test]
    fn test_full_auction_happy_path() {
        let engine = engine();
        let id = start(&engine);

        let amount = Price::new(dec!(150000));
        engine
            .commit(id, "alice", commitment_hash("alice", amount, "a1"), at(5))
            .unwrap();

        // Reveal window opens at t=30.
        engine.reveal(id, "alice", amount, "a1", at(35)).unwrap();

        let winner = engine.settle(id, at(61)).unwrap();
        assert_eq!(winner.as_deref(), Some("alice"));

        let status = engine.status(id, at(61)).unwrap();
        assert_eq!(status.phase, AuctionPhase::Settled);
        assert_eq!(status.winner.as_deref(), Some("alice"));
    }

    #[test]
    fn test_commit_after_deadline_rejected() {
        let engine = engine();
        let id = start(&engine);

        let err = engine.commit(id, "late", B256::ZERO, at(31));
        assert!(matches!(err, Err(AuctionError::PhaseViolation { .. })));
    }

    #[test]
    fn test_duplicate_commitment_rejected() {
        let engine = engine();
        let id = start(&engine);

        engine.commit(id, "alice", B256::ZERO, at(1)).unwrap();
        let err = engine.commit(id, "alice", B256::ZERO, at(2));
        assert!(matches!(err, Err(AuctionError::DuplicateCommitment(_))));
    }

    #[test]
    fn test_reveal_during_commit_rejected() {
        let engine = engine();
        let id = start(&engine);

        let amount = Price::new(dec!(150000));
        engine
            .commit(id, "alice", commitment_hash("alice", amount, "a1"), at(1))
            .unwrap();
        let err = engine.reveal(id, "alice", amount, "a1", at(10));
        assert!(matches!(err, Err(AuctionError::PhaseViolation { .. })));
    }

    #[test]
    fn test_mismatched_reveal_rejected_and_not_recorded() {
        let engine = engine();
        let id = start(&engine);

        let amount = Price::new(dec!(150000));
        engine
            .commit(id, "alice", commitment_hash("alice", amount, "a1"), at(1))
            .unwrap();

        // Wrong salt.
        let err = engine.reveal(id, "alice", amount, "wrong", at(35));
        assert!(matches!(err, Err(AuctionError::CommitmentMismatch { .. })));
        assert_eq!(engine.status(id, at(35)).unwrap().reveals, 0);
    }

    #[test]
    fn test_reveal_without_commitment_rejected() {
        let engine = engine();
        let id = start(&engine);

        let err = engine.reveal(id, "ghost", Price::new(dec!(150000)), "s", at(35));
        assert!(matches!(err, Err(AuctionError::CommitmentMismatch { .. })));
    }

    #[test]
    fn test_boundary_bid_accepted_one_cent_lower_rejected() {
        // 200 -> 240 overnight move is a 20.00% gap. A reveal one
        // minute in must clear 0.70 * 0.20 * V * e^(-0.4).
        let engine = AuctionEngine::new(AuctionConfig {
            commit_secs: 30,
            reveal_secs: 120,
            settled_retention_secs: 3600,
        });
        let liquidity = Price::new(dec!(1000000));
        let gap = Price::new(dec!(240)).pct_from(Price::new(dec!(200))).unwrap();
        assert_eq!(gap, dec!(20));
        let id = engine.start(PoolId(1), gap, liquidity, at(0)).unwrap();

        let exact = crate::auction::min_bid(gap, liquidity, Duration::minutes(1));
        let low = exact - Price::new(dec!(0.01));

        engine
            .commit(id, "alice", commitment_hash("alice", exact, "a"), at(1))
            .unwrap();
        engine
            .commit(id, "bob", commitment_hash("bob", low, "b"), at(1))
            .unwrap();

        // Boundary-equal accepted.
        engine.reveal(id, "alice", exact, "a", at(60)).unwrap();
        // One cent below the floor is recorded but invalid.
        let err = engine.reveal(id, "bob", low, "b", at(60));
        assert!(matches!(err, Err(AuctionError::BidBelowMinimum { .. })));
        assert_eq!(engine.status(id, at(61)).unwrap().reveals, 2);
    }

    #[test]
    fn test_low_bid_never_wins_even_if_largest() {
        // A bid revealed late (after the floor decayed past it) can be
        // invalid while a smaller, earlier valid bid wins.
        let engine = AuctionEngine::new(AuctionConfig {
            commit_secs: 30,
            reveal_secs: 360,
            settled_retention_secs: 3600,
        });
        let liquidity = Price::new(dec!(1000000));
        let id = engine.start(PoolId(1), dec!(20), liquidity, at(0)).unwrap();

        let small = Price::new(dec!(100));
        let big = Price::new(dec!(200));
        engine
            .commit(id, "early", commitment_hash("early", small, "e"), at(1))
            .unwrap();
        engine
            .commit(id, "big", commitment_hash("big", big, "b"), at(1))
            .unwrap();

        // At t=5min the floor is zero: tiny bids become valid.
        engine.reveal(id, "early", small, "e", at(301)).unwrap();

        // Invalidate the big bid by hand: reveal while the floor is
        // still far above it (t=31s, floor ~= 140k).
        let err = engine.reveal(id, "big", big, "b", at(31));
        assert!(matches!(err, Err(AuctionError::BidBelowMinimum { .. })));

        let winner = engine.settle(id, at(400)).unwrap();
        assert_eq!(winner.as_deref(), Some("early"));
    }

    #[test]
    fn test_tie_break_earliest_then_smallest_bidder() {
        let engine = AuctionEngine::new(AuctionConfig {
            commit_secs: 30,
            reveal_secs: 360,
            settled_retention_secs: 3600,
        });
        let id = engine
            .start(PoolId(1), dec!(20), Price::new(dec!(1000)), at(0))
            .unwrap();

        let amount = Price::new(dec!(500));
        for bidder in ["zed", "amy", "bob"] {
            engine
                .commit(id, bidder, commitment_hash(bidder, amount, bidder), at(1))
                .unwrap();
        }

        // Floor is zero by t=5min, all three reveals are valid.
        engine.reveal(id, "zed", amount, "zed", at(310)).unwrap();
        engine.reveal(id, "amy", amount, "amy", at(320)).unwrap();
        engine.reveal(id, "bob", amount, "bob", at(310)).unwrap();

        // zed and bob tie on time; bob is lexicographically smaller.
        let winner = engine.settle(id, at(400)).unwrap();
        assert_eq!(winner.as_deref(), Some("bob"));
    }

    #[test]
    fn test_settle_before_deadline_rejected_and_idempotent_after() {
        let engine = engine();
        let id = start(&engine);

        assert!(matches!(
            engine.settle(id, at(59)),
            Err(AuctionError::PhaseViolation { .. })
        ));

        let first = engine.settle(id, at(61)).unwrap();
        let second = engine.settle(id, at(120)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_auction() {
        let engine = engine();
        assert!(matches!(
            engine.status(Uuid::new_v4(), at(0)),
            Err(AuctionError::UnknownAuction(_))
        ));
    }

    #[test]
    fn test_sweep_settles_and_garbage_collects() {
        let engine = AuctionEngine::new(AuctionConfig {
            commit_secs: 30,
            reveal_secs: 30,
            settled_retention_secs: 100,
        });
        let id = engine
            .start(PoolId(1), dec!(10), Price::new(dec!(1000)), at(0))
            .unwrap();

        engine.sweep(at(61));
        assert_eq!(engine.status(id, at(61)).unwrap().phase, AuctionPhase::Settled);

        // Retention expires; the auction disappears.
        engine.sweep(at(200));
        assert!(matches!(
            engine.status(id, at(200)),
            Err(AuctionError::UnknownAuction(_))
        ));
    }

    #[test]
    fn test_active_lists_live_auctions_in_start_order() {
        let engine = engine();
        let first = start(&engine);
        let second = engine
            .start(PoolId(8), dec!(10), Price::new(dec!(1000)), at(40))
            .unwrap();

        // At t=45 the first auction is revealing, the second committing.
        let live = engine.active(at(45));
        assert_eq!(live.len(), 2);
        assert_eq!(live[0].id, first);
        assert_eq!(live[0].phase, AuctionPhase::Reveal);
        assert_eq!(live[1].id, second);
        assert_eq!(live[1].phase, AuctionPhase::Commit);
        assert!(live[1].current_min_bid.is_positive());

        // Past the first auction's reveal deadline only the second is
        // still actionable; it stays reachable by id regardless.
        let live = engine.active(at(61));
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, second);
        assert!(engine.status(first, at(61)).is_ok());

        assert!(engine.active(at(500)).is_empty());
    }

    #[test]
    fn test_status_reflects_deadline_without_settle() {
        let engine = engine();
        let id = start(&engine);

        let status = engine.status(id, at(61)).unwrap();
        assert_eq!(status.phase, AuctionPhase::Settled);
        assert!(status.winner.is_none());
    }
}
