// Quick demo binary - the actual library is in lib.rs

use lendpool::{HookError, Pool, PoolOptions, PoolPolicy};
use std::sync::atomic::{AtomicU32, Ordering};

struct Numbered(AtomicU32);

impl PoolPolicy for Numbered {
    type Resource = u32;

    fn create(&self) -> Result<u32, HookError> {
        Ok(self.0.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

fn main() {
    println!("=== lendpool demo ===");
    println!();

    let pool = Pool::new(
        Numbered(AtomicU32::new(0)),
        PoolOptions::new("demo").with_pool_size(2),
    );

    {
        let slot = pool.acquire().unwrap().expect("acquire timed out");
        println!("got resource: {}", *slot);
    }

    println!("{}", pool.statistics_full());
}
