// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer: the report session and the small pieces it is built from.

pub mod capture;
pub mod controller;
pub mod reset_timer;
