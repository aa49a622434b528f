//! The Reconciler — background reclamation of lapsed leases.
//!
//! Lazy expiry on `check` only reclaims vouchers somebody still asks about.
//! The reconciler sweeps the rest: every `Reserved` row whose lease deadline
//! has passed goes back to `Unused` so the voucher is sellable again.
//!
//! Safe to run concurrently with live traffic: each reclamation is the same
//! single-row compare-and-swap the engine uses, and a lost race just means
//! lazy expiry or a takeover got there first — the row is skipped, not an
//! error. Repeated sweeps over the same voucher are no-ops.

use std::sync::Arc;

use admitgate_types::{Clock, EngineConfig, GateError, Result};
use admitgate_store::VoucherStore;

/// Periodic or on-demand sweep over lapsed reservations.
pub struct Reconciler {
    store: Arc<dyn VoucherStore>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
}

impl Reconciler {
    #[must_use]
    pub fn new(store: Arc<dyn VoucherStore>, config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            config,
            clock,
        }
    }

    /// One sweep: return every lapsed reservation to `Unused`.
    /// Returns the number of leases reclaimed by **this** sweep.
    pub fn sweep(&self) -> Result<usize> {
        let ttl = self.config.lease_ttl();
        let mut reclaimed = 0usize;

        for row in self.store.scan_reserved()? {
            let now = self.clock.now();
            if !row.voucher.lease_lapsed(now, ttl) {
                continue;
            }
            let mut updated = row.voucher.clone();
            updated.clear_lease()?;
            match self.store.apply_transition(row.version, updated) {
                Ok(_) => {
                    tracing::debug!(voucher = %row.voucher.id, "reclaimed lapsed lease");
                    reclaimed += 1;
                }
                // Someone else moved the row between scan and write —
                // already reclaimed, taken over, or consumed. Skip.
                Err(GateError::VersionConflict { .. }) => {}
                Err(err) => return Err(err),
            }
        }

        if reclaimed > 0 {
            tracing::info!(reclaimed, "reconciler sweep reclaimed lapsed leases");
        }
        Ok(reclaimed)
    }

    /// Drive sweeps on a fixed period until the surrounding task is
    /// cancelled. Sweep failures are logged and the loop carries on — a
    /// transient storage outage must not kill reclamation forever.
    pub async fn run(&self, period: std::time::Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.sweep() {
                Ok(reclaimed) => {
                    tracing::debug!(reclaimed, "reconciler sweep complete");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "reconciler sweep failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admitgate_store::MemoryVoucherStore;
    use admitgate_types::{LeaseToken, ManualClock, Voucher, VoucherCode, VoucherStatus};
    use chrono::{Duration, Utc};

    fn reserved_store(codes: &[&str], clock: &ManualClock) -> Arc<MemoryVoucherStore> {
        let store = Arc::new(MemoryVoucherStore::new());
        for code in codes {
            let mut v = Voucher::dummy(code);
            v.valid_until = clock.now() + Duration::hours(2);
            store.insert(v).unwrap();
            let row = store
                .find_by_code(&VoucherCode::new(*code))
                .unwrap()
                .unwrap();
            let mut reserved = row.voucher.clone();
            reserved.reserve(LeaseToken::new(), clock.now()).unwrap();
            store.apply_transition(row.version, reserved).unwrap();
        }
        store
    }

    #[test]
    fn sweep_reclaims_only_lapsed_leases() {
        let clock = Arc::new(ManualClock::starting_at(Utc::now()));
        let store = reserved_store(&["1111111111"], &clock);

        // Second reservation five minutes later: still live after advance.
        clock.advance(Duration::minutes(10));
        {
            let v = {
                let mut v = Voucher::dummy("2222222222");
                v.valid_until = clock.now() + Duration::hours(2);
                v
            };
            store.insert(v).unwrap();
            let row = store
                .find_by_code(&VoucherCode::new("2222222222"))
                .unwrap()
                .unwrap();
            let mut reserved = row.voucher.clone();
            reserved.reserve(LeaseToken::new(), clock.now()).unwrap();
            store.apply_transition(row.version, reserved).unwrap();
        }

        // 10 + 6 minutes: first lease lapsed, second still live.
        clock.advance(Duration::minutes(6));
        let reconciler = Reconciler::new(store.clone(), EngineConfig::default(), clock.clone());
        assert_eq!(reconciler.sweep().unwrap(), 1);

        let first = store
            .find_by_code(&VoucherCode::new("1111111111"))
            .unwrap()
            .unwrap();
        assert_eq!(first.voucher.status, VoucherStatus::Unused);
        assert!(first.voucher.lease_token.is_none());

        let second = store
            .find_by_code(&VoucherCode::new("2222222222"))
            .unwrap()
            .unwrap();
        assert_eq!(second.voucher.status, VoucherStatus::Reserved);
    }

    #[test]
    fn repeated_sweeps_are_noops() {
        let clock = Arc::new(ManualClock::starting_at(Utc::now()));
        let store = reserved_store(&["1111111111", "3333333333"], &clock);
        clock.advance(Duration::minutes(16));

        let reconciler = Reconciler::new(store, EngineConfig::default(), clock);
        assert_eq!(reconciler.sweep().unwrap(), 2);
        assert_eq!(reconciler.sweep().unwrap(), 0);
        assert_eq!(reconciler.sweep().unwrap(), 0);
    }

    #[test]
    fn live_leases_survive_sweep() {
        let clock = Arc::new(ManualClock::starting_at(Utc::now()));
        let store = reserved_store(&["1111111111"], &clock);
        clock.advance(Duration::minutes(14));

        let reconciler = Reconciler::new(store.clone(), EngineConfig::default(), clock);
        assert_eq!(reconciler.sweep().unwrap(), 0);
        let row = store
            .find_by_code(&VoucherCode::new("1111111111"))
            .unwrap()
            .unwrap();
        assert_eq!(row.voucher.status, VoucherStatus::Reserved);
    }

    #[tokio::test]
    async fn periodic_runner_sweeps() {
        tokio::time::pause();
        let clock = Arc::new(ManualClock::starting_at(Utc::now()));
        let store = reserved_store(&["1111111111"], &clock);
        clock.advance(Duration::minutes(16));

        let reconciler = Arc::new(Reconciler::new(
            store.clone(),
            EngineConfig::default(),
            clock,
        ));
        let task = {
            let reconciler = reconciler.clone();
            tokio::spawn(async move {
                reconciler.run(std::time::Duration::from_secs(60)).await;
            })
        };

        // First tick fires immediately; let it run.
        tokio::task::yield_now().await;
        tokio::time::advance(std::time::Duration::from_millis(1)).await;
        tokio::task::yield_now().await;

        let row = store
            .find_by_code(&VoucherCode::new("1111111111"))
            .unwrap()
            .unwrap();
        assert_eq!(row.voucher.status, VoucherStatus::Unused);
        task.abort();
    }
}
