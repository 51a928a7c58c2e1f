//! Pooled message allocator: the pool is serialized by a single mutex.
//! Pre-sized at 5000 by default, grows in steps of 250 on exhaustion;
//! only blocks once an optional hard cap is reached.

use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex};

use super::msg::StreamMsg;

const DEFAULT_INITIAL_SIZE: usize = 5000;
const DEFAULT_GROWTH_STEP: usize = 250;

struct PoolInner {
    free: Vec<StreamMsg>,
    total_allocated: usize,
}

pub struct StreamMsgPool {
    inner: Mutex<PoolInner>,
    not_empty: Condvar,
    growth_step: usize,
    max_size: Option<usize>,
}

impl StreamMsgPool {
    pub fn new(initial_size: usize, growth_step: usize, max_size: Option<usize>) -> Self {
        let free = (0..initial_size).map(|_| StreamMsg::default()).collect();
        Self {
            inner: Mutex::new(PoolInner { free, total_allocated: initial_size }),
            not_empty: Condvar::new(),
            growth_step,
            max_size,
        }
    }

    pub fn total_allocated(&self) -> usize {
        self.inner.lock().unwrap().total_allocated
    }

    /// Returns a zeroed message, growing the pool by `growth_step` on
    /// exhaustion; only blocks if `max_size` is set and already reached.
    pub fn get_from_pool(&self) -> PooledMsg<'_> {
        let mut guard = self.inner.lock().unwrap();
        loop {
            if let Some(msg) = guard.free.pop() {
                return PooledMsg { pool: self, msg: Some(msg) };
            }
            let can_grow = self.max_size.map(|max| guard.total_allocated < max).unwrap_or(true);
            if can_grow {
                let grow_by = self
                    .max_size
                    .map(|max| self.growth_step.min(max - guard.total_allocated))
                    .unwrap_or(self.growth_step)
                    .max(1);
                for _ in 0..grow_by {
                    guard.free.push(StreamMsg::default());
                }
                guard.total_allocated += grow_by;
                continue;
            }
            guard = self.not_empty.wait(guard).unwrap();
        }
    }

    fn release(&self, mut msg: StreamMsg) {
        msg.reset();
        let mut guard = self.inner.lock().unwrap();
        guard.free.push(msg);
        drop(guard);
        self.not_empty.notify_one();
    }

    /// Explicit release, equivalent to dropping the guard.
    pub fn return_to_pool(&self, pooled: PooledMsg<'_>) {
        drop(pooled);
    }
}

impl Default for StreamMsgPool {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_SIZE, DEFAULT_GROWTH_STEP, None)
    }
}

/// RAII handle returned by [`StreamMsgPool::get_from_pool`]; returns its
/// message to the pool on drop.
pub struct PooledMsg<'a> {
    pool: &'a StreamMsgPool,
    msg: Option<StreamMsg>,
}

impl Deref for PooledMsg<'_> {
    type Target = StreamMsg;

    fn deref(&self) -> &StreamMsg {
        self.msg.as_ref().expect("PooledMsg used after release")
    }
}

impl DerefMut for PooledMsg<'_> {
    fn deref_mut(&mut self) -> &mut StreamMsg {
        self.msg.as_mut().expect("PooledMsg used after release")
    }
}

impl Drop for PooledMsg<'_> {
    fn drop(&mut self) {
        if let Some(msg) = self.msg.take() {
            self.pool.release(msg);
        }
    }
}
