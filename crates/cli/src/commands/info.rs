//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::MuxBlueprint;
use serde::Serialize;
use tracing::info;

use super::load_blueprint;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    output_capacity: usize,
    total_weight: i64,
    flows: Vec<FlowInfo>,
}

#[derive(Serialize)]
struct FlowInfo {
    id: String,
    weight: i64,
    capacity: usize,
    /// Long-run share when every flow stays loaded
    expected_share: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rate_hz: Option<f64>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let blueprint = load_blueprint(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint);
    }

    Ok(())
}

fn build_config_info(blueprint: &MuxBlueprint) -> ConfigInfo {
    let flows = blueprint
        .flows
        .iter()
        .zip(blueprint.expected_shares())
        .map(|(flow, (_, share))| FlowInfo {
            id: flow.id.to_string(),
            weight: flow.weight,
            capacity: flow.capacity,
            expected_share: share,
            items: flow.items,
            rate_hz: flow.rate_hz,
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        output_capacity: blueprint.output.capacity,
        total_weight: blueprint.total_weight(),
        flows,
    }
}

fn print_config_info(blueprint: &MuxBlueprint) {
    let info = build_config_info(blueprint);

    println!("=== drr-mux Configuration ===\n");
    println!("Version: {}", info.version);
    println!("Output capacity: {}", info.output_capacity);
    println!("Total weight: {}", info.total_weight);

    println!("\nFlows ({})", info.flows.len());
    for (i, flow) in info.flows.iter().enumerate() {
        let prefix = if i + 1 == info.flows.len() { "└─" } else { "├─" };
        let items = flow
            .items
            .map_or_else(|| "unbounded".to_string(), |n| format!("{n} items"));
        let rate = flow
            .rate_hz
            .map_or_else(|| "unpaced".to_string(), |hz| format!("{hz} Hz"));
        println!(
            "   {} {:<16} weight={:<6} share={:>6.2}%  capacity={}  {}, {}",
            prefix,
            flow.id,
            flow.weight,
            flow.expected_share * 100.0,
            flow.capacity,
            items,
            rate
        );
    }

    println!();
}
