//! The policy trait - the pool's sole boundary to application code

use crate::errors::HookError;
use crate::slot::SlotMeta;

/// Creates resource values and hooks into the pool's lifecycle.
///
/// Only [`create`](PoolPolicy::create) is required; every other hook has a
/// no-op default. Hooks run without any pool lock held, so they may block or
/// perform I/O.
///
/// # Examples
///
/// ```
/// use lendpool::{HookError, PoolPolicy};
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// struct Numbered(AtomicU32);
///
/// impl PoolPolicy for Numbered {
///     type Resource = u32;
///
///     fn create(&self) -> Result<u32, HookError> {
///         Ok(self.0.fetch_add(1, Ordering::Relaxed) + 1)
///     }
/// }
/// ```
pub trait PoolPolicy: Send + Sync + 'static {
    /// The pooled resource value
    type Resource: Send + 'static;

    /// Produce a fresh resource value.
    ///
    /// Called lazily when the pool grows, and again when a slot is recreated
    /// via [`Pool::recreate`](crate::Pool::recreate). A failure during growth
    /// surrenders the capacity reservation, so a later acquire may retry.
    fn create(&self) -> Result<Self::Resource, HookError>;

    /// Dispose of the previous value when a slot is recreated.
    fn destroy(&self, _value: Self::Resource) {}

    /// Pre-use hook for blocking acquires.
    ///
    /// A failure forces the slot back into the pool (possibly straight to the
    /// next waiter) and is propagated to the caller.
    fn on_acquire(
        &self,
        _value: &mut Self::Resource,
        _meta: &SlotMeta,
    ) -> Result<(), HookError> {
        Ok(())
    }

    /// Pre-use hook for deferred acquires. Defaults to [`on_acquire`].
    ///
    /// [`on_acquire`]: PoolPolicy::on_acquire
    fn on_acquire_deferred(
        &self,
        value: &mut Self::Resource,
        meta: &SlotMeta,
    ) -> Result<(), HookError> {
        self.on_acquire(value, meta)
    }

    /// Post-use hook; runs only when the slot goes back to the free list
    /// rather than straight to a waiter.
    ///
    /// A failure is propagated to the releasing caller, but only after the
    /// slot is back on the free list.
    fn on_release(&self, _value: &mut Self::Resource) -> Result<(), HookError> {
        Ok(())
    }

    /// Notification that a blocking acquire gave up waiting.
    fn on_acquire_timeout(&self) {}

    /// Notification that the pool transitioned to unavailable.
    fn on_unavailable(&self) {}

    /// Notification that the pool recovered.
    fn on_available(&self) {}

    /// Probe predicate used by the recovery worker.
    ///
    /// Return `Ok(true)` once the resource provider is reachable again;
    /// `Ok(false)` or an error keeps the pool unavailable.
    fn check_available(&self, _value: &Self::Resource) -> Result<bool, HookError> {
        Ok(true)
    }
}
