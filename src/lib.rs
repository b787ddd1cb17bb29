// SPDX-License-Identifier: MPL-2.0

//! Photo Booth - pose-guided photo sessions on a live camera
//!
//! The user picks up to four poses, the camera opens, and each pose gets a
//! countdown, a capture and a composited photo with the pose guide and a
//! caption band baked in. Finished photos are exported as JPEG files.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Selection, session state machine, scheduler, gallery
//! - [`backends`]: Camera backend abstraction (V4L2 and virtual)
//! - [`pipelines`]: Photo compositing and encoding
//! - [`poses`]: Pose catalog and decoded pose images
//! - [`config`]: User configuration handling
//! - [`storage`]: Export of finished photos
//!
//! # Example
//!
//! ```ignore
//! let selection = Selection::from_ids(&[1, 3])?;
//! let device = CaptureDevice::new(Box::new(VirtualCamera::default()));
//! let mut session = Session::new(&selection, device, SessionOptions::default())?;
//! session.update(Message::Start)?;
//! run_session(&mut session, Pace::Virtual, None, |_| {}).await;
//! session.finish(&mut DirectorySink::new("out"))?;
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod poses;
pub mod storage;

// Re-export commonly used types
pub use app::{Message, Selection, Session, SessionEvent, SessionOptions, SessionPhase};
pub use backends::camera::CaptureDevice;
pub use config::Config;
pub use errors::{AppError, AppResult};
