// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client fault notifications.
//!
//! `fault_package` notices carry no acknowledgement; delivery is
//! best-effort by design of the wire protocol.

use lwm_core::{ClientId, FaultNotice};

pub trait ClientNotify {
    /// Notify every connected client.
    fn broadcast(&mut self, notice: &FaultNotice);

    /// Notify a single client.
    fn unicast(&mut self, client: &ClientId, notice: &FaultNotice);
}

/// Emits notices to the log only (no client transport attached).
#[derive(Debug, Default)]
pub struct LogNotify;

impl ClientNotify for LogNotify {
    fn broadcast(&mut self, notice: &FaultNotice) {
        tracing::info!(
            pkgname = %notice.pkgname,
            filename = %notice.filename,
            funcname = %notice.funcname,
            "fault_package broadcast"
        );
    }

    fn unicast(&mut self, client: &ClientId, notice: &FaultNotice) {
        tracing::info!(
            client = %client,
            pkgname = %notice.pkgname,
            "fault_package unicast"
        );
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Fake notifier recording every notice.
    #[derive(Clone, Default)]
    pub struct FakeNotify {
        broadcasts: Arc<Mutex<Vec<FaultNotice>>>,
        unicasts: Arc<Mutex<Vec<(ClientId, FaultNotice)>>>,
    }

    impl FakeNotify {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn broadcasts(&self) -> Vec<FaultNotice> {
            self.broadcasts.lock().clone()
        }

        pub fn unicasts(&self) -> Vec<(ClientId, FaultNotice)> {
            self.unicasts.lock().clone()
        }
    }

    impl ClientNotify for FakeNotify {
        fn broadcast(&mut self, notice: &FaultNotice) {
            self.broadcasts.lock().push(notice.clone());
        }

        fn unicast(&mut self, client: &ClientId, notice: &FaultNotice) {
            self.unicasts.lock().push((client.clone(), notice.clone()));
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeNotify;
