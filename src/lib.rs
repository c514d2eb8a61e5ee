//! # lendpool
//!
//! Thread-safe object pool for expensive reusable resources such as database
//! connections or network sockets.
//!
//! ## Features
//!
//! - Lazy, bounded growth up to a configured capacity
//! - Blocking acquire with a race-safe timeout protocol
//! - Deferred acquire resolved as a future when a slot is returned
//! - Strict FIFO hand-off to waiters, fair across both waiter kinds
//! - Automatic return of slots via RAII (Drop trait)
//! - Availability state machine with a background recovery probe
//! - Lifecycle hooks through a single policy trait
//!
//! ## Quick Start
//!
//! ```rust
//! use lendpool::{HookError, Pool, PoolOptions, PoolPolicy};
//! use std::sync::atomic::{AtomicU32, Ordering};
//!
//! struct Numbered(AtomicU32);
//!
//! impl PoolPolicy for Numbered {
//!     type Resource = u32;
//!
//!     fn create(&self) -> Result<u32, HookError> {
//!         Ok(self.0.fetch_add(1, Ordering::Relaxed) + 1)
//!     }
//! }
//!
//! let pool = Pool::new(
//!     Numbered(AtomicU32::new(0)),
//!     PoolOptions::new("demo").with_pool_size(2),
//! );
//! {
//!     let slot = pool.acquire().unwrap().unwrap();
//!     assert_eq!(*slot, 1);
//!     // slot returns to the pool when dropped
//! }
//! assert_eq!(pool.free_count(), 1);
//! ```

mod availability;
mod config;
mod errors;
mod policy;
mod pool;
mod slot;
mod stats;
mod waiters;

pub use config::PoolOptions;
pub use errors::{HookError, PoolError, PoolResult};
pub use policy::PoolPolicy;
pub use pool::Pool;
pub use slot::{PooledSlot, SlotMeta};
pub use stats::PoolStats;
