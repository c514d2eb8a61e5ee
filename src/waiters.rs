//! Waiter queues and the cross-kind order log

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crossbeam::queue::SegQueue;
use tokio::sync::oneshot;

/// Which queue an enrolled waiter sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaiterKind {
    Blocking,
    Deferred,
}

/// Slot payload handed from a releaser to a waiter: the value and its id.
pub(crate) type Handoff<T> = (T, usize);

struct WaiterCell<T> {
    result: Option<Handoff<T>>,
    timed_out: bool,
}

/// One blocking waiter: a result cell and timed-out flag behind a mutex,
/// plus the wake signal.
///
/// The cell mutex serialises the releaser's hand-off against the waiter's
/// timeout transition; exactly one of the two wins.
pub(crate) struct BlockingWaiter<T> {
    cell: Mutex<WaiterCell<T>>,
    signal: Condvar,
}

impl<T> BlockingWaiter<T> {
    fn new() -> Self {
        Self {
            cell: Mutex::new(WaiterCell {
                result: None,
                timed_out: false,
            }),
            signal: Condvar::new(),
        }
    }

    /// Wait until a slot is assigned or the deadline passes.
    ///
    /// On expiry the waiter commits `timed_out` under the cell mutex, but
    /// only if no result has landed; a hand-off that raced the timer is
    /// still claimed as a success.
    pub(crate) fn wait(&self, timeout: Duration) -> Option<Handoff<T>> {
        let deadline = Instant::now() + timeout;
        let mut cell = self.cell.lock().unwrap();
        while cell.result.is_none() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let (guard, _) = self.signal.wait_timeout(cell, deadline - now).unwrap();
            cell = guard;
        }
        if let Some(handoff) = cell.result.take() {
            return Some(handoff);
        }
        cell.timed_out = true;
        None
    }

    /// Assign a slot from the release path.
    ///
    /// Returns the payload back when the waiter already timed out, so the
    /// releaser can serve the next waiter instead.
    pub(crate) fn assign(&self, handoff: Handoff<T>) -> Result<(), Handoff<T>> {
        let mut cell = self.cell.lock().unwrap();
        if cell.timed_out {
            return Err(handoff);
        }
        cell.result = Some(handoff);
        self.signal.notify_one();
        Ok(())
    }
}

/// The three FIFOs coordinating saturated acquires: one queue per waiter
/// kind plus the order log that preserves enrolment order across kinds.
///
/// Enrolment pushes the record before its tag, so the multiset of tags in
/// the order log never exceeds the records present per kind.
pub(crate) struct WaitQueues<T> {
    blocking: SegQueue<Arc<BlockingWaiter<T>>>,
    deferred: SegQueue<oneshot::Sender<Handoff<T>>>,
    order: SegQueue<WaiterKind>,
}

impl<T> WaitQueues<T> {
    pub(crate) fn new() -> Self {
        Self {
            blocking: SegQueue::new(),
            deferred: SegQueue::new(),
            order: SegQueue::new(),
        }
    }

    pub(crate) fn enroll_blocking(&self) -> Arc<BlockingWaiter<T>> {
        let waiter = Arc::new(BlockingWaiter::new());
        self.blocking.push(Arc::clone(&waiter));
        self.order.push(WaiterKind::Blocking);
        waiter
    }

    pub(crate) fn enroll_deferred(&self) -> oneshot::Receiver<Handoff<T>> {
        let (tx, rx) = oneshot::channel();
        self.deferred.push(tx);
        self.order.push(WaiterKind::Deferred);
        rx
    }

    pub(crate) fn next_kind(&self) -> Option<WaiterKind> {
        self.order.pop()
    }

    pub(crate) fn take_blocking(&self) -> Arc<BlockingWaiter<T>> {
        pop_pending(&self.blocking)
    }

    pub(crate) fn take_deferred(&self) -> oneshot::Sender<Handoff<T>> {
        pop_pending(&self.deferred)
    }

    pub(crate) fn blocking_len(&self) -> usize {
        self.blocking.len()
    }

    pub(crate) fn deferred_len(&self) -> usize {
        self.deferred.len()
    }
}

/// A tag is pushed only after its record, so a popped tag has a matching
/// record at most an in-flight push away; retry until it lands.
fn pop_pending<T>(queue: &SegQueue<T>) -> T {
    let mut spins = 0u32;
    loop {
        if let Some(item) = queue.pop() {
            return item;
        }
        spins += 1;
        if spins < 64 {
            std::hint::spin_loop();
        } else {
            std::thread::yield_now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn assign_wakes_waiter() {
        let queues: WaitQueues<u32> = WaitQueues::new();
        let waiter = queues.enroll_blocking();

        assert_eq!(queues.next_kind(), Some(WaiterKind::Blocking));
        let handle = {
            let waiter = Arc::clone(&waiter);
            thread::spawn(move || waiter.wait(Duration::from_secs(5)))
        };
        queues.take_blocking().assign((7, 0)).unwrap();
        assert_eq!(handle.join().unwrap(), Some((7, 0)));
    }

    #[test]
    fn timed_out_waiter_rejects_assignment() {
        let waiter: BlockingWaiter<u32> = BlockingWaiter::new();
        assert_eq!(waiter.wait(Duration::from_millis(10)), None);
        assert_eq!(waiter.assign((1, 0)), Err((1, 0)));
    }

    #[test]
    fn late_assignment_beats_expired_timer() {
        // Assign before the waiter inspects the cell: even a zero timeout
        // must claim the result.
        let waiter: BlockingWaiter<u32> = BlockingWaiter::new();
        waiter.assign((9, 3)).unwrap();
        assert_eq!(waiter.wait(Duration::ZERO), Some((9, 3)));
    }

    #[test]
    fn order_log_tracks_both_kinds() {
        let queues: WaitQueues<u32> = WaitQueues::new();
        let _w = queues.enroll_blocking();
        let _rx = queues.enroll_deferred();
        let _w2 = queues.enroll_blocking();

        assert_eq!(queues.blocking_len(), 2);
        assert_eq!(queues.deferred_len(), 1);
        assert_eq!(queues.next_kind(), Some(WaiterKind::Blocking));
        assert_eq!(queues.next_kind(), Some(WaiterKind::Deferred));
        assert_eq!(queues.next_kind(), Some(WaiterKind::Blocking));
        assert_eq!(queues.next_kind(), None);
    }

    #[test]
    fn dropped_receiver_fails_send() {
        let queues: WaitQueues<u32> = WaitQueues::new();
        let rx = queues.enroll_deferred();
        drop(rx);
        assert_eq!(queues.next_kind(), Some(WaiterKind::Deferred));
        assert!(queues.take_deferred().send((1, 0)).is_err());
    }
}
