// World shared by every scenario: the harness configuration under test and whatever the
// scenario has launched or provisioned so far.

use cucumber::{World, given};
use localnet_harness::{
    CleanupReport, FixtureOutcome, HarnessConfig, HarnessError, LocalChain, TeardownReport, WalletProvisioner,
    WalletRecord,
};
use tempfile::TempDir;

use crate::common::{ScriptNode, config_for};

#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct LocalnetWorld {
    pub config: HarnessConfig,
    pub script: Option<ScriptNode>,
    pub chain: Option<LocalChain>,
    pub pgid: Option<i32>,
    pub last_error: Option<HarnessError>,
    pub outcome: Option<FixtureOutcome<()>>,
    pub body_ran: bool,
    pub teardown: Option<TeardownReport>,
    pub wallet_root: TempDir,
    pub provisioner: Option<WalletProvisioner>,
    pub wallets: Vec<WalletRecord>,
    pub cleanup: Option<CleanupReport>,
}

impl LocalnetWorld {
    pub fn new() -> Self {
        Self {
            config: HarnessConfig::default(),
            script: None,
            chain: None,
            pgid: None,
            last_error: None,
            outcome: None,
            body_ran: false,
            teardown: None,
            wallet_root: TempDir::new().expect("Failed to create wallet root"),
            provisioner: None,
            wallets: Vec::new(),
            cleanup: None,
        }
    }
}

#[given("the launch script is not configured")]
async fn launch_script_not_configured(world: &mut LocalnetWorld) {
    world.config.sh_path = None;
}

#[given(regex = r"^a readiness timeout of (\d+) seconds$")]
async fn readiness_timeout(world: &mut LocalnetWorld, seconds: u64) {
    world.config.ready_timeout_secs = seconds;
}

#[given("a node script:")]
async fn node_script(world: &mut LocalnetWorld, step: &cucumber::gherkin::Step) {
    let body = step.docstring.as_deref().expect("Node script body missing");
    let script = ScriptNode::new(body);
    world.config = HarnessConfig {
        ready_timeout_secs: world.config.ready_timeout_secs,
        ..config_for(&script.path)
    };
    world.script = Some(script);
}
