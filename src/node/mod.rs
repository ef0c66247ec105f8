//! Lifecycle of the node under test: launch, readiness, teardown.

pub mod launcher;
pub mod readiness;
pub mod teardown;

pub use launcher::{NodeProcess, NodeState, split_args};
pub use readiness::{Ready, ReadinessSpec, forward_output, wait_for_pattern, wait_ready};
pub use teardown::{TeardownReport, group_alive, signal_group, teardown};
