//! Pool configuration options

use std::time::Duration;

/// Tuning options for a pool.
///
/// The lifecycle hooks live on [`PoolPolicy`](crate::PoolPolicy); this struct
/// carries the numeric knobs.
///
/// # Examples
///
/// ```
/// use lendpool::PoolOptions;
/// use std::time::Duration;
///
/// let options = PoolOptions::new("db")
///     .with_pool_size(20)
///     .with_sync_get_timeout(Duration::from_secs(5))
///     .with_async_get_capacity(64);
///
/// assert_eq!(options.pool_size, 20);
/// assert_eq!(options.async_get_capacity, 64);
/// ```
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Human label used in log messages and statistics output
    pub name: String,

    /// Hard upper bound on the total number of slots
    pub pool_size: usize,

    /// Default timeout for blocking acquire
    pub sync_get_timeout: Duration,

    /// Maximum number of enrolled deferred waiters; `0` disables the limit
    pub async_get_capacity: usize,

    /// Period of the recovery probe while the pool is unavailable
    pub check_interval: Duration,

    /// Whether a blocking acquire that times out is an error
    ///
    /// When `false`, `acquire` reports the timeout as `Ok(None)` instead.
    pub timeout_is_error: bool,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            name: "pool".to_string(),
            pool_size: 16,
            sync_get_timeout: Duration::from_secs(30),
            async_get_capacity: 0,
            check_interval: Duration::from_secs(10),
            timeout_is_error: true,
        }
    }
}

impl PoolOptions {
    /// Create options with the given pool name and default values
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the hard upper bound on total slots
    ///
    /// # Examples
    ///
    /// ```
    /// use lendpool::PoolOptions;
    ///
    /// let options = PoolOptions::new("workers").with_pool_size(4);
    /// assert_eq!(options.pool_size, 4);
    /// ```
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Set the default timeout for blocking acquire
    pub fn with_sync_get_timeout(mut self, timeout: Duration) -> Self {
        self.sync_get_timeout = timeout;
        self
    }

    /// Set the deferred waiter capacity (`0` disables the limit)
    pub fn with_async_get_capacity(mut self, capacity: usize) -> Self {
        self.async_get_capacity = capacity;
        self
    }

    /// Set the recovery probe period
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Report blocking-acquire timeouts as `Ok(None)` instead of an error
    ///
    /// # Examples
    ///
    /// ```
    /// use lendpool::PoolOptions;
    ///
    /// let options = PoolOptions::new("quiet").with_lenient_timeout();
    /// assert!(!options.timeout_is_error);
    /// ```
    pub fn with_lenient_timeout(mut self) -> Self {
        self.timeout_is_error = false;
        self
    }
}
