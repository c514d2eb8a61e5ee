//! Availability state machine and the recovery probe

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, SystemTime};

use crate::pool::PoolCore;
use crate::policy::PoolPolicy;

/// Binary up/down state of the resource provider, as observed by the pool.
pub(crate) struct Availability {
    pub(crate) available: bool,
    pub(crate) since: Option<SystemTime>,
}

impl Availability {
    pub(crate) fn new() -> Self {
        Self {
            available: true,
            since: None,
        }
    }
}

impl<P: PoolPolicy> PoolCore<P> {
    pub(crate) fn is_available(&self) -> bool {
        self.availability.lock().unwrap().available
    }

    pub(crate) fn unavailable_since(&self) -> Option<SystemTime> {
        self.availability.lock().unwrap().since
    }

    /// Check-then-set transition to unavailable.
    ///
    /// Returns `false` without side effects when the pool is already down,
    /// so re-entrant calls never start a second probe.
    pub(crate) fn set_unavailable(core: &Arc<Self>) -> bool {
        {
            let mut availability = core.availability.lock().unwrap();
            if !availability.available {
                return false;
            }
            availability.available = false;
            availability.since = Some(SystemTime::now());
        }
        tracing::warn!(pool = %core.options.name, "marked unavailable");
        core.policy.on_unavailable();
        Self::spawn_probe(core);
        true
    }

    /// Start the recovery worker: one probe per unavailability episode.
    ///
    /// The worker holds only a weak pool reference, so it dies on recovery,
    /// on shutdown, or within one interval of the last handle dropping.
    fn spawn_probe(core: &Arc<Self>) {
        let weak = Arc::downgrade(core);
        let name = format!("{}-probe", core.options.name);
        let spawned = std::thread::Builder::new().name(name).spawn(move || {
            loop {
                let Some(core) = weak.upgrade() else { return };
                let interval = core.options.check_interval;
                let guard = core.probe_lock.lock().unwrap();
                let _ = core.probe_signal.wait_timeout(guard, interval).unwrap();
                if core.shutdown.load(Ordering::SeqCst) {
                    return;
                }
                if core.probe_once() {
                    return;
                }
            }
        });
        if let Err(err) = spawned {
            tracing::warn!(
                pool = %core.options.name,
                error = %err,
                "failed to spawn recovery probe"
            );
        }
    }

    /// One probe attempt. Returns `true` once the pool recovered.
    ///
    /// Enters the acquire path with the availability gate and waiter
    /// enrolment both bypassed: only the free list and capacity growth are
    /// tried, so a pool saturated by stuck callers cannot hang the probe.
    /// The slot goes back through the normal release path whatever the
    /// verdict.
    fn probe_once(&self) -> bool {
        let (value, id) = match self.acquire_value(Duration::ZERO, false, false) {
            Ok(Some(pair)) => pair,
            Ok(None) => {
                tracing::debug!(pool = %self.options.name, "probe found no lendable slot");
                return false;
            }
            Err(err) => {
                tracing::debug!(
                    pool = %self.options.name,
                    error = %err,
                    "probe could not obtain a slot"
                );
                return false;
            }
        };
        let verdict = self.policy.check_available(&value);
        if let Err(err) = self.release_value(value, id, false) {
            tracing::warn!(pool = %self.options.name, slot = id, error = %err, "probe release failed");
        }
        match verdict {
            Ok(true) => {
                self.recover();
                true
            }
            Ok(false) => {
                tracing::debug!(pool = %self.options.name, "provider still down");
                false
            }
            Err(err) => {
                tracing::debug!(
                    pool = %self.options.name,
                    error = %err,
                    "availability check failed"
                );
                false
            }
        }
    }

    /// Check-then-set transition back to available.
    ///
    /// Every known slot's lend/return timestamps are reset to the epoch
    /// sentinel so age-sensitive policies treat them as stale.
    fn recover(&self) {
        {
            let mut availability = self.availability.lock().unwrap();
            if availability.available {
                return;
            }
            availability.available = true;
            availability.since = None;
        }
        for entry in self.slots.iter() {
            entry.value().reset_times();
        }
        tracing::info!(pool = %self.options.name, "available again");
        self.policy.on_available();
    }
}
