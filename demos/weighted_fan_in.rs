//! Weighted Fan-In Demo
//!
//! Three synthetic flows with weights 1, 3 and 6 feed one output; the demo
//! reads a fixed number of items and prints how they were split.
//!
//! Run with: cargo run -p weighted_fan_in [config.toml]

use std::time::Duration;

use config_loader::ConfigLoader;
use contracts::{ConfigVersion, FlowConfig, FlowItem, MuxBlueprint, OutputConfig};
use drr_engine::{CancellationToken, Drr};
use ingestion::SourceSet;
use observability::{LogFormat, ObservabilityConfig, ShareAggregator};
use tokio::sync::mpsc;

const TARGET_ITEMS: u64 = 20_000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::init_with_config(ObservabilityConfig {
        log_format: LogFormat::Compact,
        ..Default::default()
    })?;

    tracing::info!("Starting weighted fan-in demo");

    // ==== Stage 1: Use default blueprint or load from file ====
    let blueprint = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading blueprint config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        create_demo_blueprint()
    };

    for (flow, share) in blueprint.expected_shares() {
        tracing::info!(flow = %flow, expected = format!("{:.1}%", share * 100.0), "Flow");
    }

    // ==== Stage 2: Scheduler and sources ====
    let (out_tx, mut out_rx) = mpsc::channel::<FlowItem>(blueprint.output.capacity);
    let mut drr = Drr::new(out_tx)?;
    let sources = SourceSet::from_blueprint(&blueprint, &mut drr)?;

    let cancel = CancellationToken::new();
    let handle = drr.start(cancel.clone())?;

    // ==== Stage 3: Consume ====
    let mut shares = ShareAggregator::from_blueprint(&blueprint).with_window(2_000);
    let consume = async {
        while let Some(item) = out_rx.recv().await {
            shares.update(&item);
            if shares.total() >= TARGET_ITEMS {
                break;
            }
        }
    };
    if tokio::time::timeout(Duration::from_secs(30), consume).await.is_err() {
        tracing::warn!("Demo timed out");
    }

    // ==== Stage 4: Shutdown ====
    cancel.cancel();
    sources.stop_all();
    drop(out_rx);

    let run = handle.join().await?;
    tracing::info!(
        rounds = run.rounds,
        forwarded = run.forwarded,
        termination = %run.termination,
        "Scheduler stopped"
    );

    println!("{}", shares.summary());
    Ok(())
}

fn create_demo_blueprint() -> MuxBlueprint {
    let flow = |id: &str, weight: i64| FlowConfig {
        id: id.into(),
        weight,
        capacity: 256,
        items: None,
        rate_hz: None,
    };

    MuxBlueprint {
        version: ConfigVersion::V1,
        output: OutputConfig { capacity: 64 },
        flows: vec![flow("bulk", 1), flow("interactive", 3), flow("realtime", 6)],
    }
}
