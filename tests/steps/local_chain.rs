// Local chain lifecycle steps.

use std::{os::unix::process::ExitStatusExt, time::Duration};

use cucumber::{then, when};
use localnet_harness::{FixtureOutcome, HarnessError, LocalChain, with_local_chain};
use nix::sys::signal::Signal;

use super::world::LocalnetWorld;
use crate::common::group_gone_within;

#[when("the local chain is started")]
async fn start_local_chain(world: &mut LocalnetWorld) {
    match LocalChain::start(&world.config, None) {
        Ok(chain) => {
            world.pgid = Some(chain.node().pgid());
            world.chain = Some(chain);
        },
        Err(e) => world.last_error = Some(e),
    }
}

#[when("a test runs against the local chain")]
async fn run_test_body(world: &mut LocalnetWorld) {
    let mut ran = false;
    match with_local_chain(&world.config, None, |_client| ran = true) {
        Ok(outcome) => world.outcome = Some(outcome),
        Err(e) => world.last_error = Some(e),
    }
    world.body_ran = ran;
}

#[when("the local chain is torn down")]
async fn tear_down(world: &mut LocalnetWorld) {
    let chain = world.chain.take().expect("Local chain was not started");
    world.teardown = Some(chain.shutdown().expect("Teardown failed"));
}

#[then("the test is skipped")]
async fn test_is_skipped(world: &mut LocalnetWorld) {
    assert!(
        matches!(world.outcome, Some(FixtureOutcome::Skipped { .. })),
        "expected a skip, got {:?} / {:?}",
        world.outcome,
        world.last_error
    );
}

#[then("the test body did not run")]
async fn body_did_not_run(world: &mut LocalnetWorld) {
    assert!(!world.body_ran);
}

#[then(regex = r"^readiness was detected on line (\d+)$")]
async fn readiness_line(world: &mut LocalnetWorld, line_number: usize) {
    let chain = world.chain.as_ref().expect("Local chain was not started");
    assert_eq!(chain.ready().line_number, line_number);
}

#[then(regex = r#"^the client endpoint is "([^"]*)"$"#)]
async fn client_endpoint(world: &mut LocalnetWorld, endpoint: String) {
    let chain = world.chain.as_ref().expect("Local chain was not started");
    assert_eq!(chain.client().url(), endpoint);
}

#[then("starting fails because the node output closed early")]
async fn fails_on_closed_output(world: &mut LocalnetWorld) {
    assert!(
        matches!(world.last_error, Some(HarnessError::PrematureStreamEnd { .. })),
        "unexpected result: {:?}",
        world.last_error
    );
}

#[then("starting fails because the node was not started in time")]
async fn fails_on_timeout(world: &mut LocalnetWorld) {
    assert!(
        matches!(world.last_error, Some(HarnessError::ReadinessTimeout { .. })),
        "unexpected result: {:?}",
        world.last_error
    );
}

#[then("the node was killed after the grace period")]
async fn node_was_killed(world: &mut LocalnetWorld) {
    let report = world.teardown.expect("Local chain was not torn down");
    assert!(report.escalated);
    assert_eq!(report.status.signal(), Some(Signal::SIGKILL as i32));
}

#[then("no process of the node's process group is alive")]
async fn group_is_gone(world: &mut LocalnetWorld) {
    let pgid = world.pgid.expect("Local chain was not started");
    assert!(group_gone_within(pgid, Duration::from_secs(2)), "process group {pgid} is still alive");
}
