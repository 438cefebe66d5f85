//! Resize notification shared between the window event handler and the frame driver.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Reader side, owned by the frame driver.
#[derive(Debug, Default)]
pub struct ResizeSignal {
    flag: Arc<AtomicBool>,
}

impl ResizeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a writer that raises this signal.
    pub fn handle(&self) -> ResizeHandle {
        ResizeHandle {
            flag: Arc::clone(&self.flag),
        }
    }

    #[inline]
    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Lowers the flag once the swapchain has been rebuilt.
    #[inline]
    pub fn clear(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Writer side, held by whoever receives window resize events.
#[derive(Debug, Clone)]
pub struct ResizeHandle {
    flag: Arc<AtomicBool>,
}

impl ResizeHandle {
    /// Marks the swapchain stale; the next present triggers a rebuild.
    #[inline]
    pub fn notify(&self) {
        self.flag.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_starts_lowered() {
        assert!(!ResizeSignal::new().is_raised());
    }

    #[test]
    fn test_handle_raises_and_signal_clears() {
        let signal = ResizeSignal::new();
        let handle = signal.handle();

        handle.notify();
        assert!(signal.is_raised());

        signal.clear();
        assert!(!signal.is_raised());
    }

    #[test]
    fn test_cloned_handles_share_flag() {
        let signal = ResizeSignal::new();
        let first = signal.handle();
        let second = first.clone();

        second.notify();
        assert!(signal.is_raised());
        signal.clear();
        first.notify();
        first.notify();
        assert!(signal.is_raised());
    }

    #[test]
    fn test_handle_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ResizeHandle>();
    }
}
