//! Blocking readiness detection over the node's line-oriented output.
//!
//! The monitor reads one line at a time in the caller's thread. The deadline is checked as each
//! line arrives, so progress depends on the node printing output; there is no background reader.

use std::{
    io::BufRead,
    time::{Duration, Instant},
};

use log::{debug, info, warn};

use crate::{
    config::HarnessConfig,
    error::{HarnessError, HarnessResult},
    node::launcher::{NodeProcess, NodeState},
};

/// What to look for in the node output and until when.
#[derive(Debug, Clone)]
pub struct ReadinessSpec {
    pattern: String,
    timeout: Duration,
    started: Instant,
    deadline: Instant,
}

impl ReadinessSpec {
    /// Fixes the deadline at `now + timeout`.
    pub fn new(pattern: impl Into<String>, timeout: Duration) -> Self {
        let started = Instant::now();
        // Timeouts too large to represent never expire
        let deadline = started
            .checked_add(timeout)
            .unwrap_or_else(|| started + Duration::from_secs(u64::from(u32::MAX)));
        Self {
            pattern: pattern.into(),
            timeout,
            started,
            deadline,
        }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config.ready_pattern.clone(), config.ready_timeout())
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// Literal substring match; the pattern is not a regular expression.
    pub fn matches(&self, line: &str) -> bool {
        line.contains(&self.pattern)
    }
}

/// The line that proved the node ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ready {
    pub line_number: usize,
    pub line: String,
    pub elapsed: Duration,
}

/// Consumes lines from `source` until one contains the readiness pattern.
///
/// Lines after the match are left unread in `source`. A closed stream before the match is a
/// [`HarnessError::PrematureStreamEnd`], never an implicit success.
pub fn wait_for_pattern<R: BufRead + ?Sized>(source: &mut R, spec: &ReadinessSpec) -> HarnessResult<Ready> {
    let mut buf = Vec::new();
    let mut lines_read = 0;

    loop {
        buf.clear();
        if source.read_until(b'\n', &mut buf)? == 0 {
            return Err(HarnessError::PrematureStreamEnd {
                pattern: spec.pattern.clone(),
                lines_read,
            });
        }
        lines_read += 1;

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\r', '\n']);
        log_output_line(lines_read, line);

        let now = Instant::now();
        if spec.is_expired(now) {
            return Err(HarnessError::ReadinessTimeout {
                pattern: spec.pattern.clone(),
                timeout: spec.timeout,
            });
        }

        if spec.matches(line) {
            let elapsed = now.duration_since(spec.started);
            info!(line_number = lines_read, elapsed:? = elapsed; "Node started");
            return Ok(Ready {
                line_number: lines_read,
                line: line.to_string(),
                elapsed,
            });
        }
    }
}

/// Waits for the node to print its readiness pattern and marks it [`NodeState::Ready`].
pub fn wait_ready(process: &mut NodeProcess, spec: &ReadinessSpec) -> HarnessResult<Ready> {
    let stdout = process.stdout_mut().ok_or(HarnessError::OutputUnavailable)?;
    let ready = wait_for_pattern(stdout, spec)?;
    process.set_state(NodeState::Ready);
    Ok(ready)
}

/// Logs every remaining line of `source` until the node closes its output, returning the count.
///
/// A node left running after readiness blocks once its stdout pipe fills, so long-lived callers
/// hand the stream to this function on a dedicated thread.
pub fn forward_output<R: BufRead>(mut source: R) -> usize {
    let mut buf = Vec::new();
    let mut forwarded = 0;

    loop {
        buf.clear();
        match source.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                forwarded += 1;
                let line = String::from_utf8_lossy(&buf);
                log_output_line(forwarded, line.trim_end_matches(['\r', '\n']));
            },
            Err(e) => {
                warn!("Stopped reading node output: {e}");
                break;
            },
        }
    }
    debug!(lines = forwarded; "Node output closed");
    forwarded
}

fn log_output_line(line_number: usize, line: &str) {
    debug!(target: "localnet_harness::node::output", line_number = line_number; "{line}");
}
