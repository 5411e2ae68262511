use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Bounds how many row chunks of one column are evaluated at the same time.
///
/// Permits are handed out as [`ChunkPermit`] guards and returned when the guard is dropped,
/// so a panicking row closure cannot leak one.
pub(crate) struct ChunkLimiter {
    free: Mutex<usize>,
    cv: Condvar,
}

/// One in-flight chunk slot. Released on drop.
pub(crate) struct ChunkPermit<'a> {
    limiter: &'a ChunkLimiter,
    waited: Duration,
}

impl ChunkLimiter {
    pub(crate) fn new(max_in_flight: usize) -> Self {
        Self {
            free: Mutex::new(max_in_flight.max(1)),
            cv: Condvar::new(),
        }
    }

    /// Block until a slot is free and take it.
    pub(crate) fn acquire(&self) -> ChunkPermit<'_> {
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        let mut started: Option<Instant> = None;
        while *free == 0 {
            started.get_or_insert_with(Instant::now);
            free = self.cv.wait(free).unwrap_or_else(PoisonError::into_inner);
        }
        *free -= 1;
        ChunkPermit {
            limiter: self,
            waited: started.map_or(Duration::ZERO, |s| s.elapsed()),
        }
    }

    fn give_back(&self) {
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        *free += 1;
        self.cv.notify_one();
    }
}

impl ChunkPermit<'_> {
    /// Time spent blocked before the slot became free.
    pub(crate) fn waited(&self) -> Duration {
        self.waited
    }
}

impl Drop for ChunkPermit<'_> {
    fn drop(&mut self) {
        self.limiter.give_back();
    }
}
