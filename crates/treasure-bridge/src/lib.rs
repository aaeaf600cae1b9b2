// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Treasure Bridge: the device collaborators the report form consumes
// (current position and a photo), behind traits so the session never
// touches platform APIs directly.

pub mod fixed;
pub mod stub;
pub mod traits;

pub use fixed::{FilePhotoSource, FixedPosition};
pub use stub::StubBridge;
pub use traits::{CoordinateProvider, PhotoSource, PlatformBridge};

/// Bridge for the platform this binary was built for.
///
/// Only the stub ships today; native location and camera bridges slot in
/// here behind `cfg(target_os)`.
pub fn platform_bridge() -> Box<dyn PlatformBridge> {
    Box::new(stub::StubBridge)
}
