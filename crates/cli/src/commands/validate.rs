//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::MuxBlueprint;
use serde::Serialize;
use tracing::info;

use super::load_blueprint;
use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    flow_count: usize,
    total_weight: i64,
    output_capacity: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    match load_blueprint(&args.config) {
        Ok(blueprint) => ValidationResult {
            valid: true,
            config_path,
            error: None,
            warnings: collect_warnings(&blueprint),
            summary: Some(ConfigSummary {
                version: format!("{:?}", blueprint.version),
                flow_count: blueprint.flows.len(),
                total_weight: blueprint.total_weight(),
                output_capacity: blueprint.output.capacity,
            }),
        },
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: Vec::new(),
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &MuxBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    for flow in &blueprint.flows {
        if flow.items.is_none() && flow.rate_hz.is_none() {
            warnings.push(format!(
                "Flow '{}' is unbounded and unpaced - runs until cancelled",
                flow.id
            ));
        }
        if (flow.capacity as i64) < flow.weight {
            warnings.push(format!(
                "Flow '{}' capacity {} is below its weight {} - rounds cannot use the full budget",
                flow.id, flow.capacity, flow.weight
            ));
        }
    }

    if blueprint.flows.iter().all(|f| f.items.is_none()) {
        warnings.push("No flow is finite - use --max-items or --timeout to stop a run".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Flows: {}", summary.flow_count);
            println!("  Total weight: {}", summary.total_weight);
            println!("  Output capacity: {}", summary.output_capacity);
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn args(path: PathBuf) -> ValidateArgs {
        ValidateArgs {
            config: path,
            json: true,
        }
    }

    #[test]
    fn test_valid_config_with_warnings() {
        let file = write_config(
            r#"
[output]
capacity = 8

[[flows]]
id = "bulk"
weight = 4
capacity = 2

[[flows]]
id = "ctl"
weight = 1
items = 10
"#,
        );

        let result = validate_config(&args(file.path().to_path_buf()));
        assert!(result.valid);
        let summary = result.summary.unwrap();
        assert_eq!(summary.flow_count, 2);
        assert_eq!(summary.total_weight, 5);
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].contains("'bulk' is unbounded"));
        assert!(result.warnings[1].contains("below its weight"));
    }

    #[test]
    fn test_invalid_weight_is_reported() {
        let file = write_config(
            r#"
[[flows]]
id = "a"
weight = 0
"#,
        );

        let result = validate_config(&args(file.path().to_path_buf()));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("weight"));
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&args(PathBuf::from("/nonexistent/drr.toml")));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("not found"));
    }
}
