//! Blueprint validation
//!
//! Rules:
//! - at least one flow
//! - flow ids are non-empty and unique
//! - weight > 0 and fits the scheduler's weight range
//! - capacities > 0
//! - rate_hz, when set, maps to a non-zero representable tick period

use std::collections::HashSet;

use contracts::{tick_period, ContractError, MuxBlueprint};

/// Validate a MuxBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &MuxBlueprint) -> Result<(), ContractError> {
    validate_output(blueprint)?;
    validate_flow_ids(blueprint)?;
    validate_flow_weights(blueprint)?;
    validate_flow_capacities(blueprint)?;
    validate_flow_rates(blueprint)?;
    Ok(())
}

fn validate_output(blueprint: &MuxBlueprint) -> Result<(), ContractError> {
    if blueprint.output.capacity == 0 {
        return Err(ContractError::config_validation(
            "output.capacity",
            "output capacity must be > 0",
        ));
    }
    Ok(())
}

/// Flow ids must exist and be unique
fn validate_flow_ids(blueprint: &MuxBlueprint) -> Result<(), ContractError> {
    if blueprint.flows.is_empty() {
        return Err(ContractError::config_validation(
            "flows",
            "at least one flow is required",
        ));
    }

    let mut seen = HashSet::new();
    for (idx, flow) in blueprint.flows.iter().enumerate() {
        if flow.id.is_empty() {
            return Err(ContractError::config_validation(
                format!("flows[{idx}].id"),
                "flow id cannot be empty",
            ));
        }
        if !seen.insert(flow.id.as_str()) {
            return Err(ContractError::config_validation(
                format!("flows[id={}]", flow.id),
                "duplicate flow id",
            ));
        }
    }
    Ok(())
}

fn validate_flow_weights(blueprint: &MuxBlueprint) -> Result<(), ContractError> {
    for flow in &blueprint.flows {
        if flow.weight <= 0 || flow.weight > i64::from(u32::MAX) {
            return Err(ContractError::config_validation(
                format!("flows[{}].weight", flow.id),
                format!("weight must be in 1..={}, got {}", u32::MAX, flow.weight),
            ));
        }
    }
    Ok(())
}

fn validate_flow_capacities(blueprint: &MuxBlueprint) -> Result<(), ContractError> {
    for flow in &blueprint.flows {
        if flow.capacity == 0 {
            return Err(ContractError::config_validation(
                format!("flows[{}].capacity", flow.id),
                "capacity must be > 0",
            ));
        }
    }
    Ok(())
}

fn validate_flow_rates(blueprint: &MuxBlueprint) -> Result<(), ContractError> {
    for flow in &blueprint.flows {
        if let Some(rate) = flow.rate_hz {
            if tick_period(rate).is_none() {
                return Err(ContractError::config_validation(
                    format!("flows[{}].rate_hz", flow.id),
                    format!("rate_hz must give a non-zero, finite tick period, got {rate}"),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ConfigVersion, FlowConfig, OutputConfig};

    fn flow(id: &str, weight: i64) -> FlowConfig {
        FlowConfig {
            id: id.into(),
            weight,
            capacity: 16,
            items: Some(10),
            rate_hz: None,
        }
    }

    fn blueprint(flows: Vec<FlowConfig>) -> MuxBlueprint {
        MuxBlueprint {
            version: ConfigVersion::V1,
            output: OutputConfig::default(),
            flows,
        }
    }

    fn field_of(err: ContractError) -> String {
        match err {
            ContractError::ConfigValidation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_blueprint() {
        let bp = blueprint(vec![flow("a", 3), flow("b", 1)]);
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_no_flows() {
        let err = validate(&blueprint(vec![])).unwrap_err();
        assert_eq!(field_of(err), "flows");
    }

    #[test]
    fn test_duplicate_flow_id() {
        let err = validate(&blueprint(vec![flow("a", 1), flow("a", 2)])).unwrap_err();
        assert!(err.to_string().contains("duplicate flow id"));
    }

    #[test]
    fn test_empty_flow_id() {
        let err = validate(&blueprint(vec![flow("", 1)])).unwrap_err();
        assert_eq!(field_of(err), "flows[0].id");
    }

    #[test]
    fn test_zero_and_negative_weight() {
        let err = validate(&blueprint(vec![flow("a", 0)])).unwrap_err();
        assert_eq!(field_of(err), "flows[a].weight");

        let err = validate(&blueprint(vec![flow("a", 1), flow("b", -5)])).unwrap_err();
        assert_eq!(field_of(err), "flows[b].weight");
    }

    #[test]
    fn test_zero_capacity() {
        let mut f = flow("a", 1);
        f.capacity = 0;
        let err = validate(&blueprint(vec![f])).unwrap_err();
        assert_eq!(field_of(err), "flows[a].capacity");

        let mut bp = blueprint(vec![flow("a", 1)]);
        bp.output.capacity = 0;
        assert_eq!(field_of(validate(&bp).unwrap_err()), "output.capacity");
    }

    #[test]
    fn test_bad_rate() {
        let mut f = flow("a", 1);
        f.rate_hz = Some(0.0);
        let err = validate(&blueprint(vec![f])).unwrap_err();
        assert_eq!(field_of(err), "flows[a].rate_hz");
    }

    #[test]
    fn test_rate_out_of_timer_range() {
        for rate in [1e10, 1e-30] {
            let mut f = flow("a", 1);
            f.rate_hz = Some(rate);
            let err = validate(&blueprint(vec![f])).unwrap_err();
            assert_eq!(field_of(err), "flows[a].rate_hz", "rate = {rate}");
        }

        let mut f = flow("a", 1);
        f.rate_hz = Some(1e6);
        assert!(validate(&blueprint(vec![f])).is_ok());
    }
}
