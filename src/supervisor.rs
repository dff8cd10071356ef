//! Session Supervisor
//!
//! A panel session is never repaired in place. When it fails, the
//! supervisor lets it drive the board safe, drops it, waits and starts a
//! fresh session from the factory, which reconnects, re-reads the
//! instrument and rebuilds every cached structure.

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};

use crate::config::PanelConfig;
use crate::error::Error;

/// A restartable unit of work
pub trait Session {
    /// Run until failure
    fn run(&mut self) -> Error;

    /// Drive outputs to a safe state after `cause`
    fn fail_safe(&mut self, cause: &Error);
}

/// Restart behaviour
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SupervisorPolicy {
    /// Wait between a failure and the next start
    pub restart_pause_ms: u32,
    /// Give up after this many restarts; `None` restarts forever
    pub max_restarts: Option<u32>,
}

impl SupervisorPolicy {
    /// Policy from the panel configuration
    #[must_use]
    pub const fn from_config(config: &PanelConfig) -> Self {
        Self {
            restart_pause_ms: config.restart_pause_ms,
            max_restarts: config.max_restarts,
        }
    }
}

impl Default for SupervisorPolicy {
    fn default() -> Self {
        Self::from_config(&PanelConfig::new())
    }
}

/// Start, run and restart sessions
///
/// `start` failures count as restarts like session failures. Returns the
/// last error once the restart limit is exhausted. The factory may use a
/// wider error type than the session, for hardware it acquires itself.
pub fn supervise<S, E, F, D>(mut start: F, policy: SupervisorPolicy, delay: &mut D) -> E
where
    S: Session,
    E: From<Error> + core::fmt::Display,
    F: FnMut() -> Result<S, E>,
    D: DelayNs,
{
    let mut restarts = 0u32;
    loop {
        let cause = match start() {
            Ok(mut session) => {
                info!("session started");
                let cause = session.run();
                session.fail_safe(&cause);
                E::from(cause)
            }
            Err(e) => {
                error!("session start failed: {e}");
                e
            }
        };

        if policy.max_restarts.is_some_and(|max| restarts >= max) {
            warn!("restart limit reached after {restarts} restarts");
            return cause;
        }
        restarts += 1;
        info!("restarting (#{restarts})");
        delay.delay_ms(policy.restart_pause_ms);
    }
}
