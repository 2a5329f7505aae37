// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Window-system activity source.

/// Reports whether the display is currently inactive.
///
/// The master consults this once per activation; ongoing pause/resume
/// transitions arrive as events through the daemon loop.
pub trait ActivityMonitor {
    fn is_paused(&self) -> bool;
}

/// Always-active monitor for headless deployments.
#[derive(Debug, Default)]
pub struct NoopActivity;

impl ActivityMonitor for NoopActivity {
    fn is_paused(&self) -> bool {
        false
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Fake monitor with a settable pause flag.
    #[derive(Clone, Default)]
    pub struct FakeActivity {
        paused: Arc<AtomicBool>,
    }

    impl FakeActivity {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_paused(&self, paused: bool) {
            self.paused.store(paused, Ordering::SeqCst);
        }
    }

    impl ActivityMonitor for FakeActivity {
        fn is_paused(&self) -> bool {
            self.paused.load(Ordering::SeqCst)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeActivity;
