//! Core pool implementation: free list, capacity growth, acquire and release

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, Weak};
use std::time::{Duration, SystemTime};

use crossbeam::queue::ArrayQueue;
use dashmap::DashMap;

use crate::availability::Availability;
use crate::config::PoolOptions;
use crate::errors::{PoolError, PoolResult};
use crate::policy::PoolPolicy;
use crate::slot::{PooledSlot, SlotMeta};
use crate::stats::PoolStats;
use crate::waiters::{Handoff, WaitQueues, WaiterKind};

/// Shared pool state behind the [`Pool`] handle.
pub(crate) struct PoolCore<P: PoolPolicy> {
    pub(crate) policy: P,
    pub(crate) options: PoolOptions,
    pub(crate) free: ArrayQueue<Handoff<P::Resource>>,
    pub(crate) waiters: WaitQueues<P::Resource>,
    pub(crate) slots: DashMap<usize, Arc<SlotMeta>>,
    /// Count of slots that exist; guarded growth keeps it at or below
    /// `options.pool_size`.
    pub(crate) created: Mutex<usize>,
    next_id: AtomicUsize,
    pub(crate) availability: Mutex<Availability>,
    pub(crate) shutdown: AtomicBool,
    pub(crate) probe_lock: Mutex<()>,
    pub(crate) probe_signal: Condvar,
}

impl<P: PoolPolicy> PoolCore<P> {
    fn meta_of(&self, id: usize) -> Arc<SlotMeta> {
        let entry = self.slots.get(&id).expect("slot metadata missing");
        Arc::clone(entry.value())
    }

    /// Try the free list, then capacity growth. Never waits.
    pub(crate) fn try_obtain(&self) -> PoolResult<Option<Handoff<P::Resource>>> {
        if let Some(pair) = self.free.pop() {
            return Ok(Some(pair));
        }
        self.try_grow()
    }

    /// Double-checked growth: reserve capacity under the mutex, create the
    /// value outside it. A failed `create` surrenders the reservation.
    fn try_grow(&self) -> PoolResult<Option<Handoff<P::Resource>>> {
        {
            let mut created = self.created.lock().unwrap();
            if *created >= self.options.pool_size {
                return Ok(None);
            }
            *created += 1;
        }
        match self.policy.create() {
            Ok(value) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                self.slots.insert(id, Arc::new(SlotMeta::new(id)));
                Ok(Some((value, id)))
            }
            Err(err) => {
                *self.created.lock().unwrap() -= 1;
                Err(PoolError::Hook(err))
            }
        }
    }

    /// The shared acquire path. `gate` enforces the availability check;
    /// `wait` allows waiter enrolment when the pool is saturated (the
    /// recovery probe passes `false` for both).
    pub(crate) fn acquire_value(
        &self,
        timeout: Duration,
        gate: bool,
        wait: bool,
    ) -> PoolResult<Option<Handoff<P::Resource>>> {
        if gate && !self.is_available() {
            return Err(PoolError::Unavailable);
        }
        if let Some(pair) = self.try_obtain()? {
            return Ok(Some(pair));
        }
        if !wait {
            return Ok(None);
        }
        let waiter = self.waiters.enroll_blocking();
        match waiter.wait(timeout) {
            Some(pair) => Ok(Some(pair)),
            None => {
                self.policy.on_acquire_timeout();
                Ok(None)
            }
        }
    }

    /// Run the pre-use hook and stamp the lend metadata.
    ///
    /// A hook failure sends the slot straight back through [`release_value`],
    /// which may hand it to the next waiter.
    ///
    /// [`release_value`]: PoolCore::release_value
    pub(crate) fn finish_lend(
        core: &Arc<Self>,
        mut value: P::Resource,
        id: usize,
        deferred: bool,
    ) -> PoolResult<PooledSlot<P>> {
        let meta = core.meta_of(id);
        let hook = if deferred {
            core.policy.on_acquire_deferred(&mut value, &meta)
        } else {
            core.policy.on_acquire(&mut value, &meta)
        };
        if let Err(err) = hook {
            if let Err(release_err) = core.release_value(value, id, false) {
                tracing::warn!(
                    pool = %core.options.name,
                    slot = id,
                    error = %release_err,
                    "release after failed acquire hook also failed"
                );
            }
            return Err(PoolError::Hook(err));
        }
        meta.mark_lent();
        Ok(PooledSlot::new(value, id, meta, Arc::downgrade(core)))
    }

    /// Return a slot: recreate the value if asked, then hand it to the
    /// oldest live waiter, else run the release hook and free-list it.
    ///
    /// Timed-out and cancelled waiters are discarded as they are met; the
    /// hand-off goes to the first waiter still alive, in enrolment order.
    /// A release hook failure propagates only after the slot is back on the
    /// free list.
    pub(crate) fn release_value(
        &self,
        value: P::Resource,
        id: usize,
        recreate: bool,
    ) -> PoolResult<()> {
        let meta = self.meta_of(id);
        let mut value = value;
        if recreate {
            self.policy.destroy(value);
            value = match self.policy.create() {
                Ok(fresh) => fresh,
                Err(err) => {
                    // The slot is gone; surrender its capacity so a later
                    // acquire can grow a replacement.
                    self.slots.remove(&id);
                    *self.created.lock().unwrap() -= 1;
                    return Err(PoolError::Hook(err));
                }
            };
        }
        meta.mark_returned();
        let mut payload = Some((value, id));
        while let Some(kind) = self.waiters.next_kind() {
            match kind {
                WaiterKind::Blocking => {
                    let waiter = self.waiters.take_blocking();
                    match waiter.assign(payload.take().unwrap()) {
                        Ok(()) => break,
                        Err(returned) => payload = Some(returned),
                    }
                }
                WaiterKind::Deferred => {
                    let sender = self.waiters.take_deferred();
                    match sender.send(payload.take().unwrap()) {
                        Ok(()) => break,
                        Err(returned) => payload = Some(returned),
                    }
                }
            }
        }
        let Some((mut value, id)) = payload.take() else {
            return Ok(());
        };
        let hook = self.policy.on_release(&mut value);
        let _ = self.free.push((value, id));
        hook.map_err(PoolError::Hook)
    }

    pub(crate) fn total_count(&self) -> usize {
        *self.created.lock().unwrap()
    }
}

/// Thread-safe pool of expensive reusable resources.
///
/// Slots are created lazily up to [`PoolOptions::pool_size`] and never
/// destroyed. When the pool is saturated, acquires enrol as waiters and are
/// served strictly in enrolment order across both the blocking and deferred
/// kinds. Cloning the handle shares the pool.
pub struct Pool<P: PoolPolicy> {
    pub(crate) core: Arc<PoolCore<P>>,
}

impl<P: PoolPolicy> Clone for Pool<P> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<P: PoolPolicy> Pool<P> {
    /// Create an empty pool. No resource is created until the first acquire.
    pub fn new(policy: P, options: PoolOptions) -> Self {
        let capacity = options.pool_size.max(1);
        Self {
            core: Arc::new(PoolCore {
                policy,
                free: ArrayQueue::new(capacity),
                waiters: WaitQueues::new(),
                slots: DashMap::new(),
                created: Mutex::new(0),
                next_id: AtomicUsize::new(0),
                availability: Mutex::new(Availability::new()),
                shutdown: AtomicBool::new(false),
                probe_lock: Mutex::new(()),
                probe_signal: Condvar::new(),
                options,
            }),
        }
    }

    /// Blocking acquire with the default [`PoolOptions::sync_get_timeout`].
    ///
    /// `Ok(None)` is returned for a timeout only when
    /// [`PoolOptions::timeout_is_error`] is `false`; otherwise a timeout is
    /// [`PoolError::Timeout`].
    pub fn acquire(&self) -> PoolResult<Option<PooledSlot<P>>> {
        self.acquire_timeout(self.core.options.sync_get_timeout)
    }

    /// Blocking acquire with an explicit timeout.
    pub fn acquire_timeout(&self, timeout: Duration) -> PoolResult<Option<PooledSlot<P>>> {
        match self.core.acquire_value(timeout, true, true)? {
            Some((value, id)) => Ok(Some(PoolCore::finish_lend(&self.core, value, id, false)?)),
            None => {
                if self.core.options.timeout_is_error {
                    Err(PoolError::Timeout(timeout))
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Deferred acquire: never blocks the calling thread.
    ///
    /// Resolves when a release hands a slot over. There is no intrinsic
    /// timeout; race the future against a timer to impose one. Dropping the
    /// future cancels the waiter, and the release path skips it.
    ///
    /// Enrolment and the [`PoolError::QueueFull`] check happen before the
    /// first await point, so a saturated queue is reported without
    /// suspending.
    pub async fn acquire_deferred(&self) -> PoolResult<PooledSlot<P>> {
        let core = &self.core;
        if !core.is_available() {
            return Err(PoolError::Unavailable);
        }
        if let Some((value, id)) = core.try_obtain()? {
            return PoolCore::finish_lend(core, value, id, true);
        }
        let capacity = core.options.async_get_capacity;
        if capacity != 0 && core.waiters.deferred_len() >= capacity - 1 {
            return Err(PoolError::QueueFull);
        }
        let rx = core.waiters.enroll_deferred();
        let (value, id) = rx.await.map_err(|_| PoolError::Cancelled)?;
        PoolCore::finish_lend(core, value, id, true)
    }

    /// Return a slot to the pool, propagating any post-use hook failure.
    ///
    /// Dropping the slot releases it too, but reports hook failures through
    /// `tracing` instead of to the caller.
    pub fn release(&self, slot: PooledSlot<P>) -> PoolResult<()> {
        debug_assert!(
            Weak::ptr_eq(slot.pool_ref(), &Arc::downgrade(&self.core)),
            "slot released to a foreign pool"
        );
        let (value, id) = slot.into_parts();
        self.core.release_value(value, id, false)
    }

    /// Return a slot, disposing of its current value and creating a fresh
    /// one first.
    pub fn recreate(&self, slot: PooledSlot<P>) -> PoolResult<()> {
        debug_assert!(
            Weak::ptr_eq(slot.pool_ref(), &Arc::downgrade(&self.core)),
            "slot released to a foreign pool"
        );
        let (value, id) = slot.into_parts();
        self.core.release_value(value, id, true)
    }

    /// Mark the resource provider as down and start the recovery probe.
    ///
    /// Returns `false` when the pool is already unavailable; the probe is
    /// not started a second time.
    pub fn set_unavailable(&self) -> bool {
        PoolCore::set_unavailable(&self.core)
    }

    pub fn is_available(&self) -> bool {
        self.core.is_available()
    }

    /// When the current unavailability began, if the pool is down
    pub fn unavailable_since(&self) -> Option<SystemTime> {
        self.core.unavailable_since()
    }

    /// Signal teardown: the recovery probe exits at its next wake-up.
    ///
    /// Best-effort; the probe also dies once every pool handle is dropped.
    pub fn shutdown(&self) {
        self.core.shutdown.store(true, Ordering::SeqCst);
        let _guard = self.core.probe_lock.lock().unwrap();
        self.core.probe_signal.notify_all();
    }

    /// Snapshot of the pool's counters
    pub fn stats(&self) -> PoolStats {
        self.core.stats_snapshot()
    }

    /// Terse one-line summary: free/total slots and waiter counts
    pub fn statistics(&self) -> String {
        self.core.stats_snapshot().to_string()
    }

    /// The summary followed by one line of metadata per slot
    pub fn statistics_full(&self) -> String {
        self.core.render_full()
    }

    /// Slots currently idle on the free list
    pub fn free_count(&self) -> usize {
        self.core.free.len()
    }

    /// Slots that exist, free or lent
    pub fn total_count(&self) -> usize {
        self.core.total_count()
    }

    /// Hard upper bound on total slots
    pub fn capacity(&self) -> usize {
        self.core.options.pool_size
    }

    /// Enrolled blocking waiters, including not-yet-discarded stale ones
    pub fn blocking_waiter_count(&self) -> usize {
        self.core.waiters.blocking_len()
    }

    /// Enrolled deferred waiters, including not-yet-discarded stale ones
    pub fn deferred_waiter_count(&self) -> usize {
        self.core.waiters.deferred_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::HookError;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::AtomicU32;
    use std::thread;
    use std::time::{Instant, UNIX_EPOCH};

    #[derive(Debug, Default)]
    struct TestState {
        created: AtomicU32,
        destroyed: AtomicU32,
        released: AtomicU32,
        timeouts: AtomicU32,
        acquire_calls: AtomicU32,
        fail_every_other_acquire: AtomicBool,
        fail_release: AtomicBool,
        fail_create: AtomicBool,
    }

    /// Hands out incrementing integers as resource values.
    #[derive(Clone, Debug, Default)]
    struct TestPolicy {
        state: Arc<TestState>,
    }

    impl PoolPolicy for TestPolicy {
        type Resource = u32;

        fn create(&self) -> Result<u32, HookError> {
            if self.state.fail_create.load(Ordering::SeqCst) {
                return Err("provider refused to create".into());
            }
            Ok(self.state.created.fetch_add(1, Ordering::SeqCst) + 1)
        }

        fn destroy(&self, _value: u32) {
            self.state.destroyed.fetch_add(1, Ordering::SeqCst);
        }

        fn on_acquire(&self, _value: &mut u32, _meta: &SlotMeta) -> Result<(), HookError> {
            let call = self.state.acquire_calls.fetch_add(1, Ordering::SeqCst);
            if self.state.fail_every_other_acquire.load(Ordering::SeqCst) && call % 2 == 1 {
                return Err("pre-use check failed".into());
            }
            Ok(())
        }

        fn on_release(&self, _value: &mut u32) -> Result<(), HookError> {
            self.state.released.fetch_add(1, Ordering::SeqCst);
            if self.state.fail_release.load(Ordering::SeqCst) {
                return Err("post-use check failed".into());
            }
            Ok(())
        }

        fn on_acquire_timeout(&self) {
            self.state.timeouts.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn pool_of(size: usize) -> (Pool<TestPolicy>, Arc<TestState>) {
        let policy = TestPolicy::default();
        let state = Arc::clone(&policy.state);
        let pool = Pool::new(
            policy,
            PoolOptions::new("test")
                .with_pool_size(size)
                .with_sync_get_timeout(Duration::from_secs(10)),
        );
        (pool, state)
    }

    #[test]
    fn acquire_then_release_round_trip() {
        let (pool, state) = pool_of(2);

        let slot = pool.acquire().unwrap().unwrap();
        assert_eq!(*slot, 1);
        assert_eq!(pool.total_count(), 1);
        assert_eq!(pool.free_count(), 0);

        pool.release(slot).unwrap();
        assert_eq!(pool.total_count(), 1);
        assert_eq!(pool.free_count(), 1);
        assert_eq!(pool.blocking_waiter_count(), 0);
        // the post-use hook ran on the no-waiter path
        assert_eq!(state.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_returns_the_slot() {
        let (pool, _) = pool_of(1);
        {
            let _slot = pool.acquire().unwrap().unwrap();
            assert_eq!(pool.free_count(), 0);
        }
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn grows_to_capacity_then_times_out() {
        let (pool, state) = pool_of(2);

        let a = pool.acquire().unwrap().unwrap();
        let b = pool.acquire().unwrap().unwrap();
        assert_eq!(*a, 1);
        assert_eq!(*b, 2);

        let started = Instant::now();
        let err = pool.acquire_timeout(Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, PoolError::Timeout(_)));
        assert!(started.elapsed() >= Duration::from_millis(100));
        assert_eq!(state.timeouts.load(Ordering::SeqCst), 1);

        // the timed-out waiter is skipped; the slot lands on the free list
        let a_value = *a;
        pool.release(a).unwrap();
        let d = pool.acquire().unwrap().unwrap();
        assert_eq!(*d, a_value);
        drop(b);
        drop(d);
    }

    #[test]
    fn lenient_timeout_reports_none() {
        let policy = TestPolicy::default();
        let state = Arc::clone(&policy.state);
        let pool = Pool::new(
            policy,
            PoolOptions::new("lenient")
                .with_pool_size(1)
                .with_lenient_timeout(),
        );

        let held = pool.acquire().unwrap().unwrap();
        let got = pool.acquire_timeout(Duration::from_millis(50)).unwrap();
        assert!(got.is_none());
        assert_eq!(state.timeouts.load(Ordering::SeqCst), 1);
        drop(held);
    }

    #[test]
    fn blocking_waiters_are_served_in_enrolment_order() {
        let (pool, _) = pool_of(1);
        let held = pool.acquire().unwrap().unwrap();
        let order = Arc::new(StdMutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..3 {
            let pool = pool.clone();
            let order = Arc::clone(&order);
            handles.push(thread::spawn(move || {
                let slot = pool.acquire_timeout(Duration::from_secs(5)).unwrap().unwrap();
                order.lock().unwrap().push(i);
                thread::sleep(Duration::from_millis(10));
                pool.release(slot).unwrap();
            }));
            // stagger so enrolment order matches spawn order
            thread::sleep(Duration::from_millis(50));
        }

        pool.release(held).unwrap();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn handoff_racing_timeout_never_loses_the_slot() {
        let (pool, _) = pool_of(1);

        for _ in 0..200 {
            let held = pool.acquire().unwrap().unwrap();
            let waiter = {
                let pool = pool.clone();
                thread::spawn(move || match pool.acquire_timeout(Duration::from_millis(2)) {
                    Ok(Some(slot)) => {
                        pool.release(slot).unwrap();
                    }
                    Ok(None) => panic!("timeouts are configured to be errors"),
                    Err(PoolError::Timeout(_)) => {}
                    Err(err) => panic!("unexpected acquire error: {err}"),
                })
            };
            // release lands around the moment the waiter's timer expires
            thread::sleep(Duration::from_millis(2));
            pool.release(held).unwrap();
            waiter.join().unwrap();

            assert_eq!(pool.free_count(), 1);
            assert_eq!(pool.total_count(), 1);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn deferred_and_blocking_share_one_fifo() {
        let (pool, _) = pool_of(1);
        let held = pool.acquire().unwrap().unwrap();
        let order = Arc::new(StdMutex::new(Vec::new()));

        let deferred = {
            let pool = pool.clone();
            let order = Arc::clone(&order);
            tokio::spawn(async move {
                let slot = pool.acquire_deferred().await.unwrap();
                order.lock().unwrap().push("deferred");
                pool.release(slot).unwrap();
            })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        let blocking = {
            let pool = pool.clone();
            let order = Arc::clone(&order);
            thread::spawn(move || {
                let slot = pool.acquire_timeout(Duration::from_secs(5)).unwrap().unwrap();
                order.lock().unwrap().push("blocking");
                pool.release(slot).unwrap();
            })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        pool.release(held).unwrap();
        deferred.await.unwrap();
        tokio::task::spawn_blocking(move || blocking.join().unwrap())
            .await
            .unwrap();

        // the deferred waiter enrolled first, so it resolves first
        assert_eq!(*order.lock().unwrap(), vec!["deferred", "blocking"]);
        assert_eq!(pool.free_count(), 1);
    }

    #[tokio::test]
    async fn deferred_queue_capacity_is_enforced() {
        let policy = TestPolicy::default();
        let pool = Pool::new(
            policy,
            PoolOptions::new("capped")
                .with_pool_size(1)
                .with_async_get_capacity(2),
        );

        let held = pool.acquire().unwrap().unwrap();
        let pending = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.acquire_deferred().await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        // the second deferred acquire hits the cap and fails synchronously
        let err = pool.acquire_deferred().await.unwrap_err();
        assert!(matches!(err, PoolError::QueueFull));

        pool.release(held).unwrap();
        let slot = pending.await.unwrap().unwrap();
        pool.release(slot).unwrap();

        // with the queue drained there is room again
        let slot = pool.acquire_deferred().await.unwrap();
        pool.release(slot).unwrap();
    }

    #[tokio::test]
    async fn cancelled_deferred_waiter_is_skipped() {
        let (pool, _) = pool_of(1);
        let held = pool.acquire().unwrap().unwrap();

        let task = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.acquire_deferred().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        task.abort();
        let _ = task.await;

        assert_eq!(pool.deferred_waiter_count(), 1);
        pool.release(held).unwrap();
        assert_eq!(pool.free_count(), 1);
        assert_eq!(pool.deferred_waiter_count(), 0);
    }

    #[test]
    fn acquire_hook_failure_returns_slot_before_propagating() {
        let (pool, state) = pool_of(1);
        state.fail_every_other_acquire.store(true, Ordering::SeqCst);

        let a = pool.acquire().unwrap().unwrap();
        pool.release(a).unwrap();

        let err = pool.acquire().unwrap_err();
        assert!(matches!(err, PoolError::Hook(_)));
        assert_eq!(pool.free_count(), 1);
        assert_eq!(pool.total_count(), 1);

        let b = pool.acquire().unwrap().unwrap();
        assert_eq!(*b, 1);
        pool.release(b).unwrap();
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn release_hook_failure_keeps_the_slot_pooled() {
        let (pool, state) = pool_of(1);
        let slot = pool.acquire().unwrap().unwrap();

        state.fail_release.store(true, Ordering::SeqCst);
        let err = pool.release(slot).unwrap_err();
        assert!(matches!(err, PoolError::Hook(_)));
        // the slot went back to the free list before the error surfaced
        assert_eq!(pool.free_count(), 1);
        assert_eq!(pool.total_count(), 1);
    }

    #[test]
    fn recreate_replaces_the_value() {
        let (pool, state) = pool_of(1);

        let a = pool.acquire().unwrap().unwrap();
        assert_eq!(*a, 1);
        pool.recreate(a).unwrap();
        assert_eq!(state.destroyed.load(Ordering::SeqCst), 1);

        let b = pool.acquire().unwrap().unwrap();
        assert_eq!(*b, 2);
        pool.release(b).unwrap();
    }

    #[test]
    fn recreate_failure_surrenders_capacity() {
        let (pool, state) = pool_of(1);

        let a = pool.acquire().unwrap().unwrap();
        state.fail_create.store(true, Ordering::SeqCst);
        let err = pool.recreate(a).unwrap_err();
        assert!(matches!(err, PoolError::Hook(_)));
        assert_eq!(pool.total_count(), 0);
        assert_eq!(pool.free_count(), 0);

        state.fail_create.store(false, Ordering::SeqCst);
        let b = pool.acquire().unwrap().unwrap();
        assert_eq!(pool.total_count(), 1);
        pool.release(b).unwrap();
    }

    #[test]
    fn slot_metadata_tracks_usage() {
        let (pool, _) = pool_of(1);

        let slot = pool.acquire().unwrap().unwrap();
        let id = slot.meta().id();
        assert_eq!(slot.meta().get_times(), 1);
        assert!(slot.meta().last_get_time() > UNIX_EPOCH);
        assert!(!slot.meta().last_get_thread().is_empty());
        assert_eq!(slot.meta().last_return_time(), UNIX_EPOCH);

        pool.release(slot).unwrap();
        let meta = Arc::clone(pool.core.slots.get(&id).unwrap().value());
        assert!(meta.last_return_time() > UNIX_EPOCH);
        assert!(!meta.last_return_thread().is_empty());
    }

    #[test]
    fn concurrent_workload_leaks_nothing() {
        let (pool, _) = pool_of(3);
        let successes = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            let successes = Arc::clone(&successes);
            handles.push(thread::spawn(move || {
                for _ in 0..200 {
                    let slot = loop {
                        match pool.acquire_timeout(Duration::from_secs(1)) {
                            Ok(Some(slot)) => break slot,
                            Ok(None) => panic!("timeouts are configured to be errors"),
                            Err(PoolError::Timeout(_)) => continue,
                            Err(err) => panic!("unexpected acquire error: {err}"),
                        }
                    };
                    successes.fetch_add(1, Ordering::SeqCst);
                    pool.release(slot).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let total = pool.total_count();
        assert!(total <= 3);
        assert_eq!(pool.free_count(), total);
        assert_eq!(pool.blocking_waiter_count(), 0);
        assert_eq!(pool.deferred_waiter_count(), 0);

        let lends: u64 = pool.core.slots.iter().map(|e| e.value().get_times()).sum();
        assert_eq!(lends as usize, successes.load(Ordering::SeqCst));
    }
}
