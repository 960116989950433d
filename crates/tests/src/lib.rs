//! # Integration Tests
//!
//! End-to-end tests across the workspace crates.
//!
//! Covers:
//! - contract snapshot tests
//! - blueprint -> synthetic sources -> scheduler -> consumer runs
//! - cancellation and output closing as seen by a consumer

#[cfg(test)]
mod contract_tests {
    use contracts::{FlowItem, MuxBlueprint};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_flow_item_json_shape() {
        let item = FlowItem::new("video".into(), 7);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json, serde_json::json!({ "flow_id": "video", "seq": 7 }));
    }

    #[test]
    fn test_blueprint_toml_round_trip_keeps_order() {
        let blueprint = config_loader::ConfigLoader::load_from_str(
            r#"
[output]
capacity = 32

[[flows]]
id = "z"
weight = 1

[[flows]]
id = "a"
weight = 9
"#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        let toml = config_loader::ConfigLoader::to_toml(&blueprint).unwrap();
        let reparsed: MuxBlueprint =
            config_loader::ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml)
                .unwrap();
        let ids: Vec<&str> = reparsed.flows.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a"]);
        assert_eq!(reparsed.output.capacity, 32);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{FlowItem, MuxBlueprint};
    use drr_engine::{CancellationToken, Drr, Termination};
    use ingestion::SourceSet;
    use observability::ShareAggregator;
    use tokio::sync::mpsc;

    const TEST_TIMEOUT: Duration = Duration::from_secs(10);

    fn load(toml: &str) -> MuxBlueprint {
        ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap()
    }

    /// Blueprint -> SourceSet -> Drr -> consumer, all flows finite
    #[tokio::test]
    async fn test_e2e_finite_flows_deliver_everything_in_order() {
        let blueprint = load(
            r#"
[output]
capacity = 8

[[flows]]
id = "video"
weight = 4
capacity = 16
items = 400

[[flows]]
id = "audio"
weight = 2
capacity = 16
items = 150

[[flows]]
id = "control"
weight = 1
capacity = 4
items = 25
"#,
        );

        let (out_tx, mut out_rx) = mpsc::channel::<FlowItem>(blueprint.output.capacity);
        let mut drr = Drr::new(out_tx).unwrap();
        let sources = SourceSet::from_blueprint(&blueprint, &mut drr).unwrap();
        let handle = drr.start(CancellationToken::new()).unwrap();

        let mut next_seq: HashMap<String, u64> = HashMap::new();
        tokio::time::timeout(TEST_TIMEOUT, async {
            while let Some(item) = out_rx.recv().await {
                let expected = next_seq.entry(item.flow_id.to_string()).or_default();
                assert_eq!(item.seq, *expected, "flow {} out of order", item.flow_id);
                *expected += 1;
            }
        })
        .await
        .expect("output should close once every flow is exhausted");

        assert_eq!(next_seq["video"], 400);
        assert_eq!(next_seq["audio"], 150);
        assert_eq!(next_seq["control"], 25);

        let summary = handle.join().await.unwrap();
        assert_eq!(summary.termination, Termination::Exhausted);
        assert_eq!(summary.forwarded, 575);
        assert_eq!(summary.flows_closed, 3);
        assert!(sources.snapshots().iter().all(|(_, s)| s.finished));
    }

    /// Saturated unbounded flows split the output by weight
    #[tokio::test]
    async fn test_e2e_saturated_flows_follow_weights() {
        let blueprint = load(
            r#"
[output]
capacity = 16

[[flows]]
id = "low"
weight = 1
capacity = 256

[[flows]]
id = "mid"
weight = 2
capacity = 256

[[flows]]
id = "high"
weight = 5
capacity = 256
"#,
        );

        let (out_tx, mut out_rx) = mpsc::channel::<FlowItem>(blueprint.output.capacity);
        let mut drr = Drr::new(out_tx).unwrap();
        let sources = SourceSet::from_blueprint(&blueprint, &mut drr).unwrap();
        let cancel = CancellationToken::new();
        let handle = drr.start(cancel.clone()).unwrap();

        let mut shares = ShareAggregator::from_blueprint(&blueprint).with_window(800);
        tokio::time::timeout(TEST_TIMEOUT, async {
            while shares.total() < 8_000 {
                let item = out_rx.recv().await.expect("unbounded flows never close");
                shares.update(&item);
            }
        })
        .await
        .unwrap();

        cancel.cancel();
        sources.stop_all();

        let summary = shares.summary();
        assert!(
            summary.max_abs_error() < 0.02,
            "shares drifted from weights:\n{summary}"
        );
        assert_eq!(summary.out_of_order(), 0);

        let run = tokio::time::timeout(TEST_TIMEOUT, handle.join())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(run.termination, Termination::Cancelled);
    }

    /// After cancellation the consumer sees a closed output and nothing new
    #[tokio::test]
    async fn test_e2e_cancel_closes_output() {
        let blueprint = load(
            r#"
[output]
capacity = 4

[[flows]]
id = "paced"
weight = 1
rate_hz = 200.0

[[flows]]
id = "bulk"
weight = 3
"#,
        );

        let (out_tx, mut out_rx) = mpsc::channel::<FlowItem>(blueprint.output.capacity);
        let mut drr = Drr::new(out_tx).unwrap();
        let _sources = SourceSet::from_blueprint(&blueprint, &mut drr).unwrap();
        let cancel = CancellationToken::new();
        let handle = drr.start(cancel.clone()).unwrap();

        for _ in 0..50 {
            out_rx.recv().await.unwrap();
        }
        cancel.cancel();

        let run = tokio::time::timeout(TEST_TIMEOUT, handle.join())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(run.termination, Termination::Cancelled);

        // Only items buffered before the loop stopped can remain
        let mut leftover = 0;
        while out_rx.recv().await.is_some() {
            leftover += 1;
        }
        assert!(leftover <= blueprint.output.capacity);
    }

    /// Invalid weights never reach the scheduler through config loading
    #[test]
    fn test_invalid_blueprint_is_rejected_before_scheduling() {
        let err = ConfigLoader::load_from_str(
            r#"{ "flows": [{ "id": "neg", "weight": -3 }] }"#,
            ConfigFormat::Json,
        )
        .unwrap_err();
        assert!(err.to_string().contains("flows[neg].weight"));
    }
}
