use stallscope::adapters::AdapterRegistry;
use stallscope::analysis::EvaluationPolicy;
use stallscope::domain::{ConfigError, DetectorError, RunConfig, TaskKind, TaskStatus};
use stallscope::engine::{detect, Calibration};
use std::time::Duration;

// Looser than the defaults so a busy CI host does not register a stall
fn config(tasks: usize, blocking: usize) -> RunConfig {
    RunConfig {
        task_count: tasks,
        blocking_task_count: blocking,
        timeout: Duration::from_secs(5),
        stall_threshold: Duration::from_millis(20),
        heartbeat_interval: Duration::from_millis(2),
        ..RunConfig::default()
    }
}

fn registry() -> AdapterRegistry {
    AdapterRegistry::builtin().expect("Failed to create scratch directory")
}

#[tokio::test]
async fn test_non_blocking_adapter_passes() {
    let started = std::time::Instant::now();
    let detection = detect(
        &registry(),
        "sleep",
        &config(100, 1),
        &EvaluationPolicy::default(),
        Calibration::Skip,
    )
    .await
    .expect("detection should run");

    let verdict = &detection.verdict;
    assert!(verdict.passed, "unexpected failure: {:?}", verdict.reasons);
    assert_eq!(verdict.stall_count, 0);
    assert!((verdict.completion_rate - 1.0).abs() < f64::EPSILON);
    assert!(verdict.p95 >= verdict.p50);
    assert!(verdict.throughput > 0.0);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_scheduler_blocking_adapter_fails() {
    let detection = detect(
        &registry(),
        "thread-sleep",
        &config(100, 1),
        &EvaluationPolicy::default(),
        Calibration::Skip,
    )
    .await
    .expect("detection should run");

    let verdict = &detection.verdict;
    assert!(!verdict.passed);
    assert!(verdict.stall_count >= 1);
    assert!(verdict.max_stall.unwrap() >= Duration::from_millis(20));
    assert!(verdict.reasons[0].contains("stall"));
}

#[tokio::test]
async fn test_every_task_is_accounted_for() {
    let detection = detect(
        &registry(),
        "sleep",
        &config(60, 3),
        &EvaluationPolicy::default(),
        Calibration::Skip,
    )
    .await
    .expect("detection should run");

    let outcome = &detection.outcome;
    let total = outcome.count(TaskStatus::Completed)
        + outcome.count(TaskStatus::TimedOut)
        + outcome.count(TaskStatus::Failed);
    assert_eq!(total, 60);
    assert_eq!(detection.verdict.counts.total(), 60);
    assert_eq!(outcome.of_kind(TaskKind::Blocking).count(), 3);
    assert!(outcome.samples.windows(2).all(|w| w[0].at < w[1].at));
}

#[tokio::test]
async fn test_unknown_adapter_is_rejected() {
    let err = detect(
        &registry(),
        "aiofiles",
        &config(10, 1),
        &EvaluationPolicy::default(),
        Calibration::Skip,
    )
    .await
    .unwrap_err();

    match err {
        DetectorError::AdapterNotFound { name, available } => {
            assert_eq!(name, "aiofiles");
            assert!(available.contains("tokio-fs"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let mut cfg = config(10, 1);
    cfg.heartbeat_interval = Duration::from_millis(50);

    let err = detect(&registry(), "sleep", &cfg, &EvaluationPolicy::default(), Calibration::Skip)
        .await
        .unwrap_err();
    assert!(matches!(err, DetectorError::Config(ConfigError::HeartbeatTooSlow { .. })));
}

#[test]
fn test_multi_thread_runtime_is_rejected() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();

    let err = runtime
        .block_on(detect(
            &registry(),
            "sleep",
            &config(10, 1),
            &EvaluationPolicy::default(),
            Calibration::Skip,
        ))
        .unwrap_err();
    assert!(matches!(err, DetectorError::SharedRuntimeRequired));
}
