// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Report assembly and pre-dispatch validation.

use crate::error::ValidationError;
use crate::types::{FormState, ReportId, TreasureReport};

/// Packages the current form into a [`TreasureReport`].
///
/// Validation order matters: a missing recipient is reported before an empty
/// report, so the user fixes the address first.
#[derive(Debug)]
pub struct ReportBuilder<'a> {
    form: &'a FormState,
}

impl<'a> ReportBuilder<'a> {
    pub fn from_form(form: &'a FormState) -> Self {
        Self { form }
    }

    /// Snapshot the form into a report, or say why it cannot be sent.
    pub fn build(&self) -> Result<TreasureReport, ValidationError> {
        let recipient = self.form.email.trim();
        if recipient.is_empty() {
            return Err(ValidationError::MissingRecipient);
        }
        if !is_plausible_email(recipient) {
            return Err(ValidationError::InvalidRecipient);
        }

        let report = TreasureReport {
            id: ReportId::new(),
            recipient: recipient.to_owned(),
            description: self.form.description.clone(),
            coordinates: self.form.coordinates,
            image: self.form.image.clone(),
        };

        if !report.has_content() {
            return Err(ValidationError::EmptyReport);
        }
        Ok(report)
    }
}

/// Cheap syntactic check: `local@domain.tld`, no whitespace, one `@`.
pub fn is_plausible_email(address: &str) -> bool {
    if address.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty() && !domain.starts_with('.'),
        None => false,
    }
}
