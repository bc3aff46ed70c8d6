//! Controller behavior when the Flow API misbehaves.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use guidepath_core::{
    CoreError, ExecutionLink, FlowExecutionController, NextOutcome, SessionPhase, Step, StepType,
};
use guidepath_test_utils::assertions::{assert_position, assert_summary_answers};
use guidepath_test_utils::builders::{three_step_survey, FlowBuilder, StepBuilder};
use guidepath_test_utils::mocks::create_mock_flow_api;
use guidepath_test_utils::{init_test_logging, MockFlowApi};
use guidepath_tests::{advance_to, completed, survey_summary, SESSION_ID};
use pretty_assertions::assert_eq;

fn transport_error() -> CoreError {
    CoreError::Transport("connection reset".to_string())
}

#[tokio::test]
async fn test_get_session_failure_returns_to_uninitialized() {
    init_test_logging();
    let (flow, steps) = three_step_survey().build();

    let mut mock = MockFlowApi::new();
    mock.expect_get_flow().returning(move |_| Ok(flow.clone()));
    mock.expect_list_steps().returning(move |_| Ok(steps.clone()));
    mock.expect_get_session().times(2).returning(|_, _| Err(transport_error()));
    mock.expect_start_session().never();

    let controller =
        FlowExecutionController::new(Arc::new(mock), ExecutionLink::resume("survey", SESSION_ID));

    assert_eq!(controller.initialize().await.unwrap_err(), transport_error());
    assert_eq!(controller.snapshot().await.phase(), SessionPhase::Uninitialized);

    // a second attempt is allowed
    assert_eq!(controller.initialize().await.unwrap_err(), transport_error());
}

#[tokio::test]
async fn test_duplicate_step_order_fails_initialization() {
    init_test_logging();
    let (flow, _) = three_step_survey().build();
    let steps = vec![
        Step::new("a", 1, StepType::Information, "First"),
        Step::new("b", 1, StepType::Information, "Also first"),
    ];

    let mut mock = MockFlowApi::new();
    mock.expect_get_flow().returning(move |_| Ok(flow.clone()));
    mock.expect_list_steps().returning(move |_| Ok(steps.clone()));
    mock.expect_start_session().never();

    let controller = FlowExecutionController::new(Arc::new(mock), ExecutionLink::start("survey"));
    let err = controller.initialize().await.unwrap_err();

    assert!(matches!(err, CoreError::DuplicateStepOrder { order: 1, .. }));
    assert_eq!(controller.snapshot().await.phase(), SessionPhase::Uninitialized);
}

#[tokio::test]
async fn test_submit_failure_keeps_draft_and_position() -> anyhow::Result<()> {
    init_test_logging();
    let (flow, steps) = three_step_survey().build();
    let mut mock = create_mock_flow_api(flow, steps, SESSION_ID);
    mock.expect_submit_answer()
        .times(1)
        .returning(|_, _, _| Err(transport_error()));

    let controller = FlowExecutionController::new(Arc::new(mock), ExecutionLink::start("survey"));
    controller.initialize().await?;

    assert!(controller.next().await.is_err());
    assert!(!controller.is_submitting());

    let state = controller.snapshot().await;
    assert_position(&state, SessionPhase::InProgress, 0)?;
    assert!(state.answers().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_rejected_draft_never_reaches_api() -> anyhow::Result<()> {
    init_test_logging();
    let (flow, steps) = FlowBuilder::new("contact", "Contact")
        .step(StepBuilder::text_input("email", 1, "Email").required().email())
        .build();
    let mut mock = create_mock_flow_api(flow, steps, SESSION_ID);
    mock.expect_submit_answer().never();

    let controller = FlowExecutionController::new(Arc::new(mock), ExecutionLink::start("contact"));
    controller.initialize().await?;

    assert!(!controller.snapshot().await.can_advance(false));
    assert_eq!(
        controller.next().await?,
        NextOutcome::Rejected("This field is required".to_string())
    );

    controller.set_text("not-an-address").await?;
    assert!(matches!(controller.next().await?, NextOutcome::Rejected(_)));
    Ok(())
}

#[tokio::test]
async fn test_summary_failure_then_refresh() -> anyhow::Result<()> {
    init_test_logging();
    let (flow, steps) = three_step_survey().build();
    let mut mock = create_mock_flow_api(flow, steps, SESSION_ID);

    let submits = AtomicUsize::new(0);
    mock.expect_submit_answer()
        .times(3)
        .returning(move |_, _, _| match submits.fetch_add(1, Ordering::SeqCst) {
            0 => Ok(advance_to("plan")),
            1 => Ok(advance_to("name")),
            _ => Ok(completed()),
        });

    let summaries = AtomicUsize::new(0);
    mock.expect_get_summary()
        .times(2)
        .returning(move |_, _| match summaries.fetch_add(1, Ordering::SeqCst) {
            0 => Err(transport_error()),
            _ => Ok(survey_summary("B", "Robin")),
        });

    let controller = FlowExecutionController::new(Arc::new(mock), ExecutionLink::start("survey"));
    controller.initialize().await?;
    controller.next().await?;
    controller.select_option("B").await?;
    controller.next().await?;
    controller.set_text("Robin").await?;

    // completion succeeds even though the summary is unavailable
    assert_eq!(controller.next().await?, NextOutcome::Completed);
    let state = controller.snapshot().await;
    assert_eq!(state.phase(), SessionPhase::Completed);
    assert!(state.summary().is_none());

    controller.refresh_summary().await?;
    assert_summary_answers(controller.snapshot().await.summary(), &[(2, "B"), (3, "Robin")])?;
    Ok(())
}

#[tokio::test]
async fn test_select_option_rejects_undeclared_value() -> anyhow::Result<()> {
    init_test_logging();
    let (flow, steps) = three_step_survey().build();
    let mut mock = create_mock_flow_api(flow, steps, SESSION_ID);
    mock.expect_submit_answer()
        .times(1)
        .returning(|_, _, _| Ok(advance_to("plan")));

    let controller = FlowExecutionController::new(Arc::new(mock), ExecutionLink::start("survey"));
    controller.initialize().await?;

    // information step has no options
    assert!(matches!(
        controller.select_option("A").await,
        Err(CoreError::InvalidInput(_))
    ));

    controller.next().await?;
    assert!(matches!(
        controller.select_option("C").await,
        Err(CoreError::InvalidInput(_))
    ));
    assert_eq!(controller.snapshot().await.draft(), "");
    Ok(())
}
