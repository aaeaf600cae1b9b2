// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One-shot, cancellable timer that clears the form after a successful send.

use std::future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::{Sleep, sleep};

/// Delay between `Succeeded` and the automatic form reset.
pub const RESET_DELAY: Duration = Duration::from_millis(5000);

#[derive(Debug, Default)]
pub struct ResetTimer {
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ResetTimer {
    /// Arm (or re-arm) the timer to fire `delay` from now.
    pub fn arm(&mut self, delay: Duration) {
        self.sleep = Some(Box::pin(sleep(delay)));
    }

    pub fn cancel(&mut self) {
        self.sleep = None;
    }

    pub fn is_armed(&self) -> bool {
        self.sleep.is_some()
    }

    /// Resolves when the armed timer fires, then disarms it. Never resolves
    /// while disarmed.
    pub async fn fired(&mut self) {
        match self.sleep.as_mut() {
            Some(sleep) => {
                sleep.await;
                self.sleep = None;
            }
            None => future::pending().await,
        }
    }
}
