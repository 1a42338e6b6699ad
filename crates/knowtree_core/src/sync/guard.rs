//! Non-reentrant in-flight flag.

use std::sync::atomic::{AtomicBool, Ordering};

/// Coarse guard around one sync operation. Requests are dropped, not queued.
#[derive(Debug, Default)]
pub struct SyncGuard {
    in_flight: AtomicBool,
}

/// Proof that the holder owns the guard. Releases it on drop.
#[derive(Debug)]
pub struct SyncPermit<'g> {
    guard: &'g SyncGuard,
}

impl SyncGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the guard, or returns `None` while another holder has it.
    pub fn try_acquire(&self) -> Option<SyncPermit<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SyncPermit { guard: self })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl Drop for SyncPermit<'_> {
    fn drop(&mut self) {
        self.guard.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::SyncGuard;

    #[test]
    fn second_acquire_fails_while_held() {
        let guard = SyncGuard::new();
        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(guard.is_busy());
        assert!(guard.try_acquire().is_none());
    }

    #[test]
    fn dropping_permit_releases_guard() {
        let guard = SyncGuard::new();
        {
            let _permit = guard.try_acquire().unwrap();
        }
        assert!(!guard.is_busy());
        assert!(guard.try_acquire().is_some());
    }
}
