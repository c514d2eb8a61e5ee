//! Error types for the pool

use thiserror::Error;

/// Boxed error returned by policy hooks.
///
/// Hook failures are propagated to the caller unchanged, wrapped in
/// [`PoolError::Hook`].
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("pool is unavailable - resource provider is down")]
    Unavailable,

    #[error("acquire timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("deferred waiter queue is at capacity")]
    QueueFull,

    #[error("pool was dropped before the waiter was served")]
    Cancelled,

    #[error("policy hook failed: {0}")]
    Hook(#[source] HookError),
}

pub type PoolResult<T> = Result<T, PoolError>;
