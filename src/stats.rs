//! Pool statistics snapshots and rendering

use std::fmt;

use crate::pool::PoolCore;
use crate::policy::PoolPolicy;

/// Point-in-time snapshot of a pool's counters.
///
/// Assembled from live counters without locking the pool, so fields may be
/// mildly inconsistent with each other under concurrent traffic.
#[derive(Debug, Clone)]
pub struct PoolStats {
    /// Pool name from [`PoolOptions`](crate::PoolOptions)
    pub name: String,

    /// Slots idle on the free list
    pub free: usize,

    /// Slots that exist, free or lent
    pub total: usize,

    /// Hard upper bound on total slots
    pub capacity: usize,

    /// Enrolled blocking waiters (stale ones included until discarded)
    pub blocking_waiters: usize,

    /// Enrolled deferred waiters (stale ones included until discarded)
    pub deferred_waiters: usize,

    /// Whether the pool currently accepts acquires
    pub available: bool,
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: free {}/{} (capacity {}), blocking waiters {}, deferred waiters {}{}",
            self.name,
            self.free,
            self.total,
            self.capacity,
            self.blocking_waiters,
            self.deferred_waiters,
            if self.available { "" } else { ", UNAVAILABLE" },
        )
    }
}

impl<P: PoolPolicy> PoolCore<P> {
    pub(crate) fn stats_snapshot(&self) -> PoolStats {
        PoolStats {
            name: self.options.name.clone(),
            free: self.free.len(),
            total: self.total_count(),
            capacity: self.options.pool_size,
            blocking_waiters: self.waiters.blocking_len(),
            deferred_waiters: self.waiters.deferred_len(),
            available: self.is_available(),
        }
    }

    /// The terse summary followed by one metadata line per slot.
    pub(crate) fn render_full(&self) -> String {
        let mut out = self.stats_snapshot().to_string();
        let mut ids: Vec<usize> = self.slots.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        for id in ids {
            let Some(entry) = self.slots.get(&id) else {
                continue;
            };
            let meta = entry.value();
            let (get_millis, return_millis) = meta.millis_pair();
            out.push_str(&format!(
                "\n  slot {}: gets {}, last get {}ms by {:?}, last return {}ms by {:?}",
                id,
                meta.get_times(),
                get_millis,
                meta.last_get_thread(),
                return_millis,
                meta.last_return_thread(),
            ));
        }
        out
    }
}
