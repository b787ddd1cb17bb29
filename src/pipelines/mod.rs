// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines for captured photos
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Camera Frame │ ──▶ │  Photo Pipeline   │ ──▶ │  JPEG bytes  │
//! │   (RGBA)     │     │  - Cover-fit      │     │              │
//! │              │     │  - Pose layer     │     │              │
//! │              │     │  - Caption band   │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`photo`]: Compositing and encoding of booth photos

pub mod photo;
