// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The session shows exactly one of these at a time.

use crate::error::{GENERIC_TRANSPORT_FAILURE, GeolocationError, TreasureError, ValidationError};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip or busy service; trying again may work.
    Transient,
    /// User must do something (enter an address, pick another photo).
    ActionRequired,
    /// Cannot be fixed by retrying.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether a manual retry is worth offering. Nothing retries automatically.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `TreasureError` into a `HumanError`.
pub fn humanize_error(err: &TreasureError) -> HumanError {
    match err {
        // -- Image errors --
        TreasureError::Decode(_) => HumanError {
            message: "Could not read image.".into(),
            suggestion: "The file may be damaged or not a photo. Try a JPEG or PNG instead.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        TreasureError::ImageTooLarge { .. } => HumanError {
            message: "This photo is too detailed to send.".into(),
            suggestion: "Choose a different photo, or retake it with a plainer background.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        TreasureError::Encode(_) => HumanError {
            message: "The photo couldn't be prepared for sending.".into(),
            suggestion: "Try taking the picture again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Report errors --
        TreasureError::Validation(v) => humanize_validation(*v),

        TreasureError::Geolocation(g) => humanize_geolocation(*g),

        TreasureError::Transport(detail) => HumanError {
            message: format!("{GENERIC_TRANSPORT_FAILURE}."),
            suggestion: if detail.is_empty() || detail == GENERIC_TRANSPORT_FAILURE {
                "Please try again.".into()
            } else {
                format!("Please try again. ({detail})")
            },
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Setup --
        TreasureError::Config(detail) => HumanError {
            message: "The app isn't set up to send email.".into(),
            suggestion: format!("Check the email settings. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        TreasureError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The photo couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing it again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading the photo.".into(),
                    suggestion: "Try again. If this keeps happening, pick a different photo.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        TreasureError::Serialization(_) => HumanError {
            message: "The app had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        TreasureError::SessionClosed => HumanError {
            message: "This form has been closed.".into(),
            suggestion: "Open the form again to send a new report.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        TreasureError::PlatformUnavailable(feature) => HumanError {
            message: format!("This device has no {feature}."),
            suggestion: "Choose a photo from a file instead.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

fn humanize_validation(err: ValidationError) -> HumanError {
    match err {
        ValidationError::MissingRecipient => HumanError {
            message: "Please enter an email address.".into(),
            suggestion: "Type the address the report should be sent to.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        ValidationError::InvalidRecipient => HumanError {
            message: "That email address doesn't look right.".into(),
            suggestion: "Check it looks like name@example.com.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        ValidationError::EmptyReport => HumanError {
            message: "There's nothing to send yet.".into(),
            suggestion: "Add a photo, a description, or your location first.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

/// Geolocation failures are shown verbatim; they never block a submission.
fn humanize_geolocation(err: GeolocationError) -> HumanError {
    let suggestion = match err {
        GeolocationError::PermissionDenied => "Allow location access in your settings, then check again.",
        GeolocationError::PositionUnavailable | GeolocationError::Timeout => {
            "Move somewhere with a clearer view of the sky and check again."
        }
        GeolocationError::Unavailable => "You can still send the report without a location.",
    };
    HumanError {
        message: err.to_string(),
        suggestion: suggestion.into(),
        retriable: !matches!(err, GeolocationError::Unavailable),
        severity: match err {
            GeolocationError::PermissionDenied => Severity::ActionRequired,
            GeolocationError::Unavailable => Severity::Permanent,
            _ => Severity::Transient,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_reads_plainly() {
        let human = humanize_error(&TreasureError::Decode("bad SOI marker".into()));
        assert_eq!(human.message, "Could not read image.");
        assert_eq!(human.severity, Severity::Permanent);
    }

    #[test]
    fn too_large_needs_a_new_photo() {
        let err = TreasureError::ImageTooLarge {
            smallest: 50_000,
            budget: 35 * 1024,
        };
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }

    #[test]
    fn geolocation_message_is_verbatim() {
        let human = humanize_error(&GeolocationError::Timeout.into());
        assert_eq!(human.message, "Location request timed out");
        assert!(human.retriable);
    }

    #[test]
    fn transport_detail_is_surfaced() {
        let human = humanize_error(&TreasureError::Transport("domain not verified".into()));
        assert!(human.suggestion.contains("domain not verified"));
        assert_eq!(human.severity, Severity::Transient);
    }

    #[test]
    fn generic_transport_failure_not_repeated() {
        let human = humanize_error(&TreasureError::Transport(GENERIC_TRANSPORT_FAILURE.into()));
        assert_eq!(human.suggestion, "Please try again.");
    }

    #[test]
    fn missing_recipient_is_action_required() {
        let human = humanize_error(&ValidationError::MissingRecipient.into());
        assert_eq!(human.message, "Please enter an email address.");
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn missing_camera_points_to_files() {
        let human = humanize_error(&TreasureError::PlatformUnavailable("camera"));
        assert_eq!(human.message, "This device has no camera.");
        assert!(!human.retriable);
    }
}
