// SPDX-License-Identifier: GPL-3.0-only

//! Async session driver
//!
//! Runs a started [`Session`] on the tokio runtime: sleeps until the next
//! scheduled transition, fires it, and forwards controls arriving on a
//! channel. Everything still happens on one task, one step at a time.

use crate::app::state::{Message, Session, SessionEvent, SessionPhase};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

/// How the driver treats time between deadlines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pace {
    /// Wait for each deadline on the wall clock
    #[default]
    RealTime,
    /// Jump straight to each deadline
    Virtual,
}

/// Drive `session` until it settles
///
/// Returns when every slot is captured, the device fails, the session goes
/// back to idle, or nothing more can happen (no timer pending and no control
/// channel open). Every emitted event is passed to `observer` in order.
pub async fn run_session<F>(
    session: &mut Session,
    pace: Pace,
    mut controls: Option<UnboundedReceiver<Message>>,
    mut observer: F,
) -> SessionPhase
where
    F: FnMut(&SessionEvent),
{
    let origin = tokio::time::Instant::now();
    let base = session.now();

    loop {
        for event in session.take_events() {
            observer(&event);
        }

        if is_settled(session.phase()) {
            break;
        }

        let deadline = session.next_deadline();
        if deadline.is_none() && controls.is_none() {
            debug!(session = %session.id(), "Nothing scheduled, driver stopping");
            break;
        }

        tokio::select! {
            biased;

            _ = wait_for(deadline, pace, origin, base) => {
                if let Some(deadline) = deadline {
                    session.advance_to(deadline);
                }
            }

            message = recv(&mut controls) => match message {
                Some(message) => {
                    // Timers armed by the control count from now, not from the last deadline
                    if pace == Pace::RealTime {
                        session.advance_to(base + origin.elapsed());
                    }
                    if let Err(e) = session.update(message) {
                        warn!(error = %e, "Control ignored");
                    }
                }
                None => controls = None,
            },
        }
    }

    for event in session.take_events() {
        observer(&event);
    }
    session.phase().clone()
}

fn is_settled(phase: &SessionPhase) -> bool {
    matches!(
        phase,
        SessionPhase::Idle | SessionPhase::AllCaptured | SessionPhase::DeviceError(_)
    )
}

async fn wait_for(
    deadline: Option<Duration>,
    pace: Pace,
    origin: tokio::time::Instant,
    base: Duration,
) {
    match (deadline, pace) {
        (Some(deadline), Pace::RealTime) => {
            tokio::time::sleep_until(origin + deadline.saturating_sub(base)).await
        }
        (Some(_), Pace::Virtual) => {}
        (None, _) => std::future::pending().await,
    }
}

async fn recv(controls: &mut Option<UnboundedReceiver<Message>>) -> Option<Message> {
    match controls {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
