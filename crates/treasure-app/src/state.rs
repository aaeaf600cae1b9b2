// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Observable session state, published by the controller after every change.

use treasure_core::human_errors::HumanError;
use treasure_core::types::{FormState, SubmissionState};

/// What a front end renders: the form, where the submission stands, and at
/// most one notice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub state: SubmissionState,
    pub form: FormState,
    /// The single message currently shown to the user. A new one replaces it.
    pub notice: Option<HumanError>,
    /// A photo is being compressed and has not landed in the form yet.
    pub compressing: bool,
}

impl SessionSnapshot {
    /// Whether the submit control must be disabled.
    pub fn busy(&self) -> bool {
        self.state.is_busy()
    }
}
