//! Stopping a node's whole process group: `SIGTERM`, a grace period, then `SIGKILL` if needed.

use std::{process::ExitStatus, thread};

use log::{debug, info, warn};
use nix::{
    errno::Errno,
    sys::signal::{Signal, killpg},
    unistd::Pid,
};

use crate::{
    error::{HarnessError, HarnessResult},
    node::launcher::{NodeProcess, NodeState},
};

/// How a node went down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeardownReport {
    pub status: ExitStatus,
    /// Whether the group had to be killed after the grace period.
    pub escalated: bool,
}

/// Terminates the node's process group and reaps the leader.
///
/// Signalling faults are logged and do not stop the reap. Only a failed wait for the leader is
/// returned as an error. A node that is already terminated reports its recorded exit status.
pub fn teardown(process: &mut NodeProcess) -> HarnessResult<TeardownReport> {
    if process.state == NodeState::Terminated {
        return Ok(TeardownReport {
            status: process.child.wait()?,
            escalated: false,
        });
    }

    let pgid = process.pgid;
    process.set_state(NodeState::Terminating);
    info!(pgid = pgid.as_raw(), grace_period:? = process.grace_period; "Stopping node process group");

    log_signal_fault(signal_group(pgid, Signal::SIGTERM));
    thread::sleep(process.grace_period);

    let leader_running = match process.child.try_wait() {
        Ok(status) => status.is_none(),
        Err(e) => {
            warn!(pgid = pgid.as_raw(); "Could not poll node process: {e}");
            true
        },
    };
    let escalated = leader_running || group_alive(pgid);
    if escalated {
        warn!(pgid = pgid.as_raw(), leader_running = leader_running; "Node survived SIGTERM, sending SIGKILL");
        log_signal_fault(signal_group(pgid, Signal::SIGKILL));
    }

    let waited = process.child.wait();
    process.set_state(NodeState::Terminated);
    let status = waited?;

    info!(pgid = pgid.as_raw(), status:% = status, escalated = escalated; "Node process group stopped");
    Ok(TeardownReport { status, escalated })
}

/// Sends `signal` to every member of the group. `Ok(false)` means the group no longer exists.
pub fn signal_group(pgid: Pid, signal: Signal) -> HarnessResult<bool> {
    match killpg(pgid, signal) {
        Ok(()) => {
            debug!(pgid = pgid.as_raw(), signal:? = signal; "Signal delivered to process group");
            Ok(true)
        },
        Err(Errno::ESRCH) => Ok(false),
        Err(source) => Err(HarnessError::Signal {
            pgid: pgid.as_raw(),
            source,
        }),
    }
}

/// Checks the group with the null signal. Unreaped zombies still count as members.
pub fn group_alive(pgid: Pid) -> bool {
    !matches!(killpg(pgid, None), Err(Errno::ESRCH))
}

fn log_signal_fault(result: HarnessResult<bool>) {
    if let Err(e) = result {
        warn!("{e}");
    }
}
