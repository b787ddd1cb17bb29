// SPDX-License-Identifier: GPL-3.0-only

//! Message handler modules
//!
//! Handlers are grouped by functional domain; each file adds methods to
//! [`Session`](crate::app::Session).

pub mod camera;
pub mod capture;
pub mod navigation;
