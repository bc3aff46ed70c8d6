//! Author a flow, then run it, entirely in memory.

use std::sync::Arc;

use guidepath_core::{
    ChoiceOption, CoreError, ExecutionLink, FailurePoint, FlowApi, FlowAuthoring, FlowDraft,
    FlowExecutionController, FlowQuery, InMemoryFlowApi, NextOutcome, SessionPhase, StepDraft,
    StepType, ValidationRules,
};
use guidepath_test_utils::assertions::assert_summary_answers;
use guidepath_test_utils::init_test_logging;
use pretty_assertions::assert_eq;

fn step(order: u32, step_type: StepType, text: &str) -> StepDraft {
    let is_required = step_type != StepType::Information;
    StepDraft {
        step_order: order,
        step_type,
        question_text: text.to_string(),
        description: None,
        is_required,
        options: Vec::new(),
        validation_rules: None,
    }
}

#[tokio::test]
async fn test_authored_flow_executes_in_order() -> anyhow::Result<()> {
    init_test_logging();
    let api = Arc::new(InMemoryFlowApi::new());

    let mut draft = FlowDraft::new("Laptop request");
    draft.tags.insert("it".to_string());
    let flow = api.create_flow(&draft).await?;

    // created out of order on purpose
    let mut reason = step(3, StepType::TextInput, "Why do you need it?");
    reason.validation_rules = Some(ValidationRules {
        max_length: Some(20),
        ..Default::default()
    });
    api.create_step(&flow.id, &reason).await?;

    let mut model = step(2, StepType::MultipleChoice, "Model");
    model.options = vec![ChoiceOption::new("air", "Air"), ChoiceOption::new("pro", "Pro")];
    api.create_step(&flow.id, &model).await?;

    api.create_step(&flow.id, &step(1, StepType::Information, "Intro")).await?;

    let clash = api.create_step(&flow.id, &step(2, StepType::Information, "Clash")).await;
    assert!(matches!(clash, Err(CoreError::Api { status: 409, .. })));

    assert_eq!(api.get_flow(&flow.id).await?.version, 4);
    let listed = api
        .list_flows(&FlowQuery {
            search: Some("laptop".to_string()),
            ..Default::default()
        })
        .await?;
    assert_eq!(listed.len(), 1);

    let controller =
        FlowExecutionController::new(api.clone(), ExecutionLink::start(flow.id.clone()));
    controller.initialize().await?;

    let state = controller.snapshot().await;
    let questions: Vec<&str> = state.steps().iter().map(|s| s.question_text.as_str()).collect();
    assert_eq!(questions, vec!["Intro", "Model", "Why do you need it?"]);

    controller.next().await?;
    controller.select_option("pro").await?;
    controller.next().await?;

    controller.set_text("Video editing for the team").await?;
    assert_eq!(
        controller.next().await?,
        NextOutcome::Rejected("Maximum length is 20 characters".to_string())
    );
    controller.set_text("Video editing").await?;
    assert_eq!(controller.next().await?, NextOutcome::Completed);

    let state = controller.snapshot().await;
    assert_eq!(state.phase(), SessionPhase::Completed);
    assert_summary_answers(state.summary(), &[(2, "pro"), (3, "Video editing")])?;
    assert_eq!(api.call_count(FailurePoint::SubmitAnswer), 3);
    Ok(())
}

#[tokio::test]
async fn test_deleting_flow_removes_its_sessions() -> anyhow::Result<()> {
    init_test_logging();
    let api = Arc::new(InMemoryFlowApi::new());
    let flow = api.create_flow(&FlowDraft::new("Short")).await?;
    api.create_step(&flow.id, &step(1, StepType::Information, "Only")).await?;

    let started = api.start_session(&flow.id).await?;
    api.delete_flow(&flow.id).await?;

    assert!(matches!(
        api.get_session(&flow.id, &started.session_id).await,
        Err(CoreError::NotFound(_))
    ));
    assert!(matches!(api.get_flow(&flow.id).await, Err(CoreError::NotFound(_))));
    Ok(())
}
