// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture-attempt tokens.
//
// Every photo attach gets a fresh token. A compression result is applied only
// if it carries the current token and nothing has invalidated it since, so a
// slow encode for a photo the user already retook can never land in the form.

/// Identifies one photo capture attempt. Monotonically increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CaptureToken(u64);

#[derive(Debug, Default)]
pub struct CaptureTracker {
    current: u64,
    outstanding: bool,
}

impl CaptureTracker {
    /// Start a new capture; any earlier token becomes stale.
    pub fn begin(&mut self) -> CaptureToken {
        self.current += 1;
        self.outstanding = true;
        CaptureToken(self.current)
    }

    /// Drop whatever is in flight. Safe to call any number of times.
    pub fn invalidate(&mut self) {
        self.current += 1;
        self.outstanding = false;
    }

    /// Whether the result for `token` may be applied. Consumes the token.
    pub fn accept(&mut self, token: CaptureToken) -> bool {
        if self.outstanding && token.0 == self.current {
            self.outstanding = false;
            true
        } else {
            false
        }
    }

    /// The current capture is being compressed.
    pub fn is_compressing(&self) -> bool {
        self.outstanding
    }
}
