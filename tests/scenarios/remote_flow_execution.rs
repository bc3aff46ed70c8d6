//! Flow execution over HTTP against a fake Flow backend.

use std::sync::Arc;

use guidepath_core::{
    CoreError, ExecutionLink, FlowExecutionController, NextOutcome, SessionId, SessionPhase,
    SessionStatus, StepId,
};
use guidepath_test_utils::assertions::{assert_position, assert_summary_answers};
use guidepath_test_utils::builders::three_step_survey;
use guidepath_test_utils::{init_test_logging, FlowApiServer};
use guidepath_tests::{advance_to, completed, survey_session, survey_summary, SESSION_ID};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

async fn survey_server() -> FlowApiServer {
    init_test_logging();
    let server = FlowApiServer::start().await;
    let (flow, steps) = three_step_survey().build();
    server.mount_flow(&flow, &steps).await;
    server
}

fn controller(server: &FlowApiServer, link: ExecutionLink) -> FlowExecutionController {
    FlowExecutionController::new(Arc::new(server.client()), link)
}

#[tokio::test]
async fn test_survey_runs_to_summary() -> anyhow::Result<()> {
    let server = survey_server().await;
    let flow_id = three_step_survey().build().0.id;
    let session_id = SessionId::from(SESSION_ID);

    server.mount_start(&flow_id, SESSION_ID).await;
    server
        .mount_answer(&flow_id, &session_id, &StepId::from("welcome"), &advance_to("plan"))
        .await;
    server
        .mount_answer(&flow_id, &session_id, &StepId::from("plan"), &advance_to("name"))
        .await;
    server
        .mount_answer(&flow_id, &session_id, &StepId::from("name"), &completed())
        .await;
    server
        .mount_summary(&flow_id, &session_id, &survey_summary("A", "hello"), 1)
        .await;

    let controller = controller(&server, ExecutionLink::start("survey"));
    controller.initialize().await?;
    assert_position(&controller.snapshot().await, SessionPhase::InProgress, 0)?;
    assert_eq!(controller.link().await.to_path(), "/flows/survey/execute/sess-42");

    assert_eq!(controller.next().await?, NextOutcome::Advanced { index: 1 });

    controller.select_option("A").await?;
    assert_eq!(controller.next().await?, NextOutcome::Advanced { index: 2 });

    controller.set_text("hi").await?;
    assert_eq!(
        controller.next().await?,
        NextOutcome::Rejected("Minimum length is 5 characters".to_string())
    );

    controller.set_text("hello").await?;
    assert_eq!(controller.next().await?, NextOutcome::Completed);

    let state = controller.snapshot().await;
    assert_position(&state, SessionPhase::Completed, 2)?;
    assert_summary_answers(state.summary(), &[(2, "A"), (3, "hello")])?;
    assert_eq!(state.summary().map(|s| s.formatted_total_time()), Some("2m 5s".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_resume_lands_on_current_step() -> anyhow::Result<()> {
    let server = survey_server().await;
    let flow_id = three_step_survey().build().0.id;
    let session = survey_session(
        Some("name"),
        SessionStatus::InProgress,
        &[("welcome", ""), ("plan", "B")],
    );
    server.mount_session(&flow_id, &session).await;

    let controller = controller(&server, ExecutionLink::resume("survey", SESSION_ID));
    controller.initialize().await?;

    let state = controller.snapshot().await;
    assert_position(&state, SessionPhase::InProgress, 2)?;
    assert_eq!(state.position(), "Step 3 of 3");
    assert_eq!(state.advance_label(), "Complete");

    assert_eq!(controller.previous().await?, 1);
    assert_eq!(controller.snapshot().await.draft(), "B");
    Ok(())
}

#[tokio::test]
async fn test_resume_completed_session_fetches_summary_once() -> anyhow::Result<()> {
    let server = survey_server().await;
    let flow_id = three_step_survey().build().0.id;
    let session_id = SessionId::from(SESSION_ID);
    let session = survey_session(
        None,
        SessionStatus::Completed,
        &[("welcome", ""), ("plan", "B"), ("name", "Robin")],
    );
    server.mount_session(&flow_id, &session).await;
    server
        .mount_summary(&flow_id, &session_id, &survey_summary("B", "Robin"), 1)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/flows/survey/execute"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server.inner())
        .await;

    let controller = controller(&server, ExecutionLink::resume("survey", SESSION_ID));
    controller.initialize().await?;

    let state = controller.snapshot().await;
    assert_eq!(state.phase(), SessionPhase::Completed);
    assert_summary_answers(state.summary(), &[(2, "B"), (3, "Robin")])?;
    Ok(())
}

#[tokio::test]
async fn test_server_error_on_submit_can_be_retried() -> anyhow::Result<()> {
    let server = survey_server().await;
    let flow_id = three_step_survey().build().0.id;
    let session_id = SessionId::from(SESSION_ID);
    server.mount_start(&flow_id, SESSION_ID).await;

    Mock::given(method("POST"))
        .and(path("/api/flows/survey/execute/sess-42/answer"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"detail": "Try later"})))
        .up_to_n_times(1)
        .mount(server.inner())
        .await;
    server
        .mount_answer(&flow_id, &session_id, &StepId::from("welcome"), &advance_to("plan"))
        .await;

    let controller = controller(&server, ExecutionLink::start("survey"));
    controller.initialize().await?;

    let err = controller.next().await.unwrap_err();
    assert_eq!(
        err,
        CoreError::Api {
            status: 503,
            detail: "Try later".to_string()
        }
    );
    assert!(err.is_retryable());
    assert!(!controller.is_submitting());
    assert_position(&controller.snapshot().await, SessionPhase::InProgress, 0)?;

    assert_eq!(controller.next().await?, NextOutcome::Advanced { index: 1 });
    Ok(())
}

#[tokio::test]
async fn test_unknown_next_step_keeps_position() -> anyhow::Result<()> {
    let server = survey_server().await;
    let flow_id = three_step_survey().build().0.id;
    let session_id = SessionId::from(SESSION_ID);
    server.mount_start(&flow_id, SESSION_ID).await;
    server
        .mount_answer(&flow_id, &session_id, &StepId::from("welcome"), &advance_to("ghost"))
        .await;

    let controller = controller(&server, ExecutionLink::start("survey"));
    controller.initialize().await?;

    let err = controller.next().await.unwrap_err();
    assert_eq!(
        err,
        CoreError::IntegrityGap {
            step_id: Some("ghost".to_string())
        }
    );

    let state = controller.snapshot().await;
    assert_position(&state, SessionPhase::InProgress, 0)?;
    assert_eq!(state.answer(&StepId::from("welcome")), Some(""));
    Ok(())
}

#[tokio::test]
async fn test_missing_flow_leaves_controller_uninitialized() {
    init_test_logging();
    let server = FlowApiServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/flows/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Flow not found"})))
        .mount(server.inner())
        .await;

    let controller = controller(&server, ExecutionLink::start("missing"));
    let err = controller.initialize().await.unwrap_err();

    assert!(matches!(err, CoreError::NotFound(_)));
    assert_eq!(controller.snapshot().await.phase(), SessionPhase::Uninitialized);
}
