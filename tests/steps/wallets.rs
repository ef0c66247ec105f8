// Wallet provisioning steps.

use cucumber::{given, then, when};
use localnet_harness::WalletProvisioner;

use super::world::LocalnetWorld;

#[given("a wallet provisioner")]
async fn wallet_provisioner(world: &mut LocalnetWorld) {
    world.provisioner = Some(WalletProvisioner::new(world.wallet_root.path(), "sh"));
}

#[when(regex = r#"^I set up a wallet for "([^"]*)"$"#)]
async fn set_up_wallet(world: &mut LocalnetWorld, uri: String) {
    let provisioner = world.provisioner.as_mut().expect("No wallet provisioner");
    world.wallets.push(provisioner.setup(&uri).expect("Wallet setup failed"));
}

#[when(regex = r"^wallet (\d+) is deleted by hand$")]
async fn delete_wallet(world: &mut LocalnetWorld, index: usize) {
    let record = &world.wallets[index - 1];
    std::fs::remove_dir_all(&record.path).expect("Failed to delete wallet");
}

#[when("the wallets are cleaned up")]
async fn clean_up(world: &mut LocalnetWorld) {
    let provisioner = world.provisioner.as_mut().expect("No wallet provisioner");
    world.cleanup = Some(provisioner.cleanup_all());
}

#[then(regex = r"^(\d+) distinct wallet paths are tracked$")]
async fn distinct_paths(world: &mut LocalnetWorld, count: usize) {
    let provisioner = world.provisioner.as_ref().expect("No wallet provisioner");
    let mut paths = provisioner.tracked_paths().to_vec();
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), count);
    assert_eq!(provisioner.tracked_paths().len(), count);
}

#[then("no wallet directory remains")]
async fn no_wallet_remains(world: &mut LocalnetWorld) {
    assert!(world.wallets.iter().all(|record| !record.path.exists()));
    let provisioner = world.provisioner.as_ref().expect("No wallet provisioner");
    assert!(provisioner.tracked_paths().is_empty());
}

#[then(regex = r"^(\d+) wallet paths? (?:was|were) already absent$")]
async fn already_absent(world: &mut LocalnetWorld, count: usize) {
    let report = world.cleanup.as_ref().expect("Wallets were not cleaned up");
    assert_eq!(report.absent.len(), count);
    assert!(report.failed.is_empty());
}
