use stallscope::adapters::{AdapterRegistry, AsyncSleep};
use stallscope::analysis::{EvaluationPolicy, P95Ceiling};
use stallscope::domain::RunConfig;
use stallscope::engine::{detect, Calibration};
use stallscope::export::{write_report, JsonReport};
use std::time::Duration;

#[tokio::test]
async fn test_report_round_trips_through_file() {
    let registry = AdapterRegistry::new()
        .with(AsyncSleep::new(Duration::from_millis(1), Duration::from_millis(50)));
    let config = RunConfig {
        task_count: 40,
        blocking_task_count: 2,
        timeout: Duration::from_secs(5),
        stall_threshold: Duration::from_millis(20),
        heartbeat_interval: Duration::from_millis(2),
        ..RunConfig::default()
    };
    let policy = EvaluationPolicy {
        p95_ceiling: P95Ceiling::BaselineMultiple {
            multiple: 50.0,
            fallback: Duration::from_secs(1),
        },
        ..EvaluationPolicy::default()
    };

    let detection = detect(&registry, "sleep", &config, &policy, Calibration::Uncontended)
        .await
        .expect("detection should run");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    write_report(&path, &detection).expect("Failed to write report");

    let content = std::fs::read_to_string(&path).unwrap();
    let report: JsonReport = serde_json::from_str(&content).expect("Invalid report JSON");

    let expected = JsonReport::from_detection(&detection);
    assert_eq!(report.adapter, expected.adapter);
    assert_eq!(report.passed, expected.passed);
    assert_eq!(report.reasons, expected.reasons);
    assert_eq!(report.counts, expected.counts);
    assert_eq!(report.configuration.blocking_tasks, 2);
    assert!(report.configuration.baseline);
    assert_eq!(report.counts.completed + report.counts.timed_out + report.counts.failed, 40);
    assert!(report.p95_ms.unwrap() >= report.p50_ms.unwrap());
    assert_eq!(report.stall_durations_ms.len(), report.stall_count);
}
