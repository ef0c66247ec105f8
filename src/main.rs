use std::{thread, time::Duration};

use anyhow::{Context, bail};
use clap::Parser;
use localnet_harness::{
    HarnessConfig, HarnessError, NodeProcess, ReadinessSpec, TeardownReport, build_client,
    cli::{Cli, Commands},
    log::init_logging,
    node::{forward_output, group_alive, signal_group, wait_ready},
};
use log::{info, warn};
use nix::{sys::signal::Signal, unistd::Pid};
use tokio::signal::unix::{SignalKind, signal};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    init_logging().context("Could not initialize logging")?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Up { args, config } => {
            let config = config.resolve().context("Could not load harness configuration")?;
            up(config, args.as_deref()).await
        },
        Commands::Config { config } => {
            let config = config.resolve().context("Could not load harness configuration")?;
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        },
    }
}

/// Keeps a local chain up until Ctrl-C, tearing the node's process group down on every exit.
async fn up(config: HarnessConfig, args: Option<&str>) -> anyhow::Result<()> {
    // The node leads its own group, so a terminal Ctrl-C is delivered to this process only
    let mut interrupt = signal(SignalKind::interrupt()).context("Could not listen for Ctrl-C")?;

    let script = config.launch_script().ok_or(HarnessError::ConfigurationMissing)?;
    let client = build_client(&config.endpoint)?;
    let spec = ReadinessSpec::from_config(&config);
    let mut node = NodeProcess::start(script, args, config.grace_period())?;
    let pgid = Pid::from_raw(node.pgid());
    println!("Starting local chain in process group {pgid}");

    let mut startup = tokio::task::spawn_blocking(move || {
        let ready = wait_ready(&mut node, &spec);
        (node, ready)
    });

    let (mut node, ready) = tokio::select! {
        joined = &mut startup => joined.context("Node startup task panicked")?,
        _ = interrupt.recv() => {
            warn!(pgid = pgid.as_raw(); "Interrupted while waiting for the node");
            stop_group(pgid, config.grace_period()).await;
            // Readiness sees the closed output once the group is gone
            let (node, _) = startup.await.context("Node startup task panicked")?;
            report(shut_down(node).await?);
            bail!("Interrupted before the local chain was ready");
        },
    };

    if let Err(e) = ready {
        if let Err(teardown) = shut_down(node).await {
            warn!("{teardown:#}");
        }
        return Err(e).context("Local chain did not start");
    }

    if let Some(stdout) = node.take_stdout() {
        thread::Builder::new()
            .name("node-output".to_string())
            .spawn(move || forward_output(stdout))
            .context("Could not start the node output reader")?;
    }

    println!("Local chain ready at {}", client.url());
    println!("Process group {pgid}; press Ctrl-C to stop");

    interrupt.recv().await;
    info!("Shutdown requested");

    report(shut_down(node).await?);
    Ok(())
}

/// Stops a group whose leader is busy in the readiness wait: `SIGTERM`, then `SIGKILL` after the grace period.
async fn stop_group(pgid: Pid, grace_period: Duration) {
    if let Err(e) = signal_group(pgid, Signal::SIGTERM) {
        warn!("{e}");
    }
    tokio::time::sleep(grace_period).await;
    if group_alive(pgid) {
        if let Err(e) = signal_group(pgid, Signal::SIGKILL) {
            warn!("{e}");
        }
    }
}

async fn shut_down(mut node: NodeProcess) -> anyhow::Result<TeardownReport> {
    tokio::task::spawn_blocking(move || node.teardown())
        .await
        .context("Node teardown task panicked")?
        .context("Local chain teardown failed")
}

fn report(report: TeardownReport) {
    println!(
        "Local chain stopped ({}{})",
        report.status,
        if report.escalated { ", killed after grace period" } else { "" }
    );
}
