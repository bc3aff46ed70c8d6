//! A run with the production logging setup installed.

use guidepath_core::{ExecutionLink, FlowExecutionController, NextOutcome};
use guidepath_monitoring::{init_logging, try_init_logging, MonitoringConfig};
use guidepath_test_utils::builders::{FlowBuilder, StepBuilder};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_events_are_drained_under_json_logging() -> anyhow::Result<()> {
    let config = MonitoringConfig::new("guidepath-tests")
        .with_json(true)
        .with_filter("debug");
    try_init_logging(&config);
    assert!(init_logging(&config).is_err());

    let api = FlowBuilder::new("notice", "Notice")
        .step(StepBuilder::information("read", 1, "Please read"))
        .seed();
    let controller = FlowExecutionController::new(api, ExecutionLink::start("notice"));
    controller.initialize().await?;
    assert_eq!(controller.next().await?, NextOutcome::Completed);

    let types: Vec<&str> = controller
        .take_events()
        .await
        .iter()
        .map(|e| e.event_type())
        .collect();
    assert_eq!(
        types,
        vec!["session.started", "session.answer_recorded", "session.completed"]
    );
    assert!(controller.take_events().await.is_empty());
    Ok(())
}
