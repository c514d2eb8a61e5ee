//! Pooled slots and their usage metadata

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::pool::PoolCore;
use crate::policy::PoolPolicy;

/// Timestamp value meaning "long ago"; recovery resets slot times to this so
/// age-sensitive policies treat every slot as stale.
const EPOCH_SENTINEL: u64 = 0;

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(EPOCH_SENTINEL)
}

fn thread_label() -> String {
    let current = std::thread::current();
    match current.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", current.id()),
    }
}

/// Usage metadata for one slot.
///
/// Counters and timestamps are atomics, so readers may observe them while a
/// lend or return is in flight; fields are individually consistent only.
#[derive(Debug)]
pub struct SlotMeta {
    id: usize,
    get_times: AtomicU64,
    last_get_time: AtomicU64,
    last_return_time: AtomicU64,
    last_get_thread: Mutex<String>,
    last_return_thread: Mutex<String>,
}

impl SlotMeta {
    pub(crate) fn new(id: usize) -> Self {
        Self {
            id,
            get_times: AtomicU64::new(0),
            last_get_time: AtomicU64::new(EPOCH_SENTINEL),
            last_return_time: AtomicU64::new(EPOCH_SENTINEL),
            last_get_thread: Mutex::new(String::new()),
            last_return_thread: Mutex::new(String::new()),
        }
    }

    /// Identifier of the slot within its pool
    pub fn id(&self) -> usize {
        self.id
    }

    /// Number of successful lends of this slot
    pub fn get_times(&self) -> u64 {
        self.get_times.load(Ordering::Relaxed)
    }

    /// Wall-clock time of the last lend; the epoch if never lent or reset
    pub fn last_get_time(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(self.last_get_time.load(Ordering::Relaxed))
    }

    /// Wall-clock time of the last return; the epoch if never returned or reset
    pub fn last_return_time(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(self.last_return_time.load(Ordering::Relaxed))
    }

    /// Label of the thread that last acquired this slot
    pub fn last_get_thread(&self) -> String {
        self.last_get_thread.lock().unwrap().clone()
    }

    /// Label of the thread that last returned this slot
    pub fn last_return_thread(&self) -> String {
        self.last_return_thread.lock().unwrap().clone()
    }

    pub(crate) fn mark_lent(&self) {
        self.get_times.fetch_add(1, Ordering::Relaxed);
        self.last_get_time.store(now_millis(), Ordering::Relaxed);
        *self.last_get_thread.lock().unwrap() = thread_label();
    }

    pub(crate) fn mark_returned(&self) {
        self.last_return_time.store(now_millis(), Ordering::Relaxed);
        *self.last_return_thread.lock().unwrap() = thread_label();
    }

    pub(crate) fn reset_times(&self) {
        self.last_get_time.store(EPOCH_SENTINEL, Ordering::Relaxed);
        self.last_return_time.store(EPOCH_SENTINEL, Ordering::Relaxed);
    }

    pub(crate) fn millis_pair(&self) -> (u64, u64) {
        (
            self.last_get_time.load(Ordering::Relaxed),
            self.last_return_time.load(Ordering::Relaxed),
        )
    }
}

/// A slot lent out by a [`Pool`](crate::Pool).
///
/// Dereferences to the resource value. Dropping the slot returns it to the
/// pool; use [`Pool::release`](crate::Pool::release) instead when post-use
/// hook failures must be observed, or
/// [`Pool::recreate`](crate::Pool::recreate) to replace the value on return.
#[derive(Debug)]
pub struct PooledSlot<P: PoolPolicy> {
    value: Option<P::Resource>,
    id: usize,
    meta: Arc<SlotMeta>,
    pool: Weak<PoolCore<P>>,
}

impl<P: PoolPolicy> PooledSlot<P> {
    pub(crate) fn new(
        value: P::Resource,
        id: usize,
        meta: Arc<SlotMeta>,
        pool: Weak<PoolCore<P>>,
    ) -> Self {
        Self {
            value: Some(value),
            id,
            meta,
            pool,
        }
    }

    /// Usage metadata of this slot
    pub fn meta(&self) -> &SlotMeta {
        &self.meta
    }

    /// Take the value and slot id, disarming the drop-time return.
    pub(crate) fn into_parts(mut self) -> (P::Resource, usize) {
        let value = self.value.take().expect("value already taken");
        (value, self.id)
    }

    pub(crate) fn pool_ref(&self) -> &Weak<PoolCore<P>> {
        &self.pool
    }
}

impl<P: PoolPolicy> Deref for PooledSlot<P> {
    type Target = P::Resource;

    fn deref(&self) -> &Self::Target {
        self.value.as_ref().expect("value already taken")
    }
}

impl<P: PoolPolicy> DerefMut for PooledSlot<P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.value.as_mut().expect("value already taken")
    }
}

impl<P: PoolPolicy> Drop for PooledSlot<P> {
    fn drop(&mut self) {
        let Some(value) = self.value.take() else {
            return;
        };
        match self.pool.upgrade() {
            Some(core) => {
                if let Err(err) = core.release_value(value, self.id, false) {
                    tracing::warn!(slot = self.id, error = %err, "release on drop failed");
                }
            }
            None => {
                tracing::debug!(slot = self.id, "pool gone before slot was returned");
            }
        }
    }
}
