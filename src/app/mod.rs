// SPDX-License-Identifier: MPL-2.0

//! Photo-booth session logic
//!
//! # Architecture
//!
//! - `selection`: Pose picks (up to four) and the countdown length
//! - `state`: Session state types (Session, SessionPhase, Message, SessionEvent)
//! - `update`: Message dispatch and timer firing
//! - `handlers`: Handlers grouped by domain (camera, capture, navigation)
//! - `scheduler`: Cancellable delayed messages on a virtual clock
//! - `gallery`: Finished photos in slot order
//! - `driver`: Runs a session on the tokio runtime
//!
//! # Flow
//!
//! ```text
//! Idle ─Start─► AwaitingPermission ─ok─► Ready ─► CountdownRunning ─► Capturing
//!                     │  ▲                 ▲                               │
//!                   fail │retry            │advance                        ▼
//!                     ▼  │                 └────────────────────── ReviewingPhoto
//!                 DeviceError                                              │
//!                                                          last slot filled▼
//!                                          Idle ◄─finish/cancel─── AllCaptured
//! ```

pub mod driver;
pub mod gallery;
mod handlers;
pub mod scheduler;
pub mod selection;
mod state;
mod update;

pub use driver::{Pace, run_session};
pub use gallery::{CapturedPhoto, Gallery};
pub use selection::{Selection, SelectionChange};
pub use state::{
    CaptureMode, CountdownDisplay, Message, Session, SessionEvent, SessionOptions, SessionPhase,
    TimerEvent,
};
