//! Builders for test flows and steps.

use std::sync::Arc;

use guidepath_core::{
    ChoiceOption, Flow, FlowId, InMemoryFlowApi, Step, StepType, ValidationRules, Visibility,
};

/// Builder for a [`Step`]
#[derive(Debug, Clone)]
pub struct StepBuilder {
    step: Step,
}

impl StepBuilder {
    /// Step of any type
    pub fn new(id: &str, order: u32, step_type: StepType, question: &str) -> Self {
        Self {
            step: Step::new(id, order, step_type, question),
        }
    }

    /// `information` step
    pub fn information(id: &str, order: u32, title: &str) -> Self {
        Self::new(id, order, StepType::Information, title)
    }

    /// `multiple_choice` step
    pub fn multiple_choice(id: &str, order: u32, question: &str) -> Self {
        Self::new(id, order, StepType::MultipleChoice, question)
    }

    /// `text_input` step
    pub fn text_input(id: &str, order: u32, question: &str) -> Self {
        Self::new(id, order, StepType::TextInput, question)
    }

    /// Mark the step as required
    pub fn required(mut self) -> Self {
        self.step.is_required = true;
        self
    }

    /// Set the description
    pub fn description(mut self, description: &str) -> Self {
        self.step.description = Some(description.to_string());
        self
    }

    /// Add an option whose label equals its value
    pub fn option(mut self, value: &str) -> Self {
        self.step.options.push(ChoiceOption::new(value, value));
        self
    }

    /// Add an option with a separate label
    pub fn labelled_option(mut self, value: &str, text: &str) -> Self {
        self.step.options.push(ChoiceOption::new(value, text));
        self
    }

    /// Require at least `min` characters
    pub fn min_length(mut self, min: usize) -> Self {
        self.rules().min_length = Some(min);
        self
    }

    /// Allow at most `max` characters
    pub fn max_length(mut self, max: usize) -> Self {
        self.rules().max_length = Some(max);
        self
    }

    /// Require an email address
    pub fn email(mut self) -> Self {
        self.rules().email = true;
        self
    }

    /// Require a regex match
    pub fn pattern(mut self, pattern: &str, message: Option<&str>) -> Self {
        let rules = self.rules();
        rules.pattern = Some(pattern.to_string());
        rules.pattern_message = message.map(str::to_string);
        self
    }

    fn rules(&mut self) -> &mut ValidationRules {
        self.step.validation_rules.get_or_insert_with(ValidationRules::default)
    }

    /// Finish the step
    pub fn build(self) -> Step {
        self.step
    }
}

/// Builder for a [`Flow`] and its steps
#[derive(Debug, Clone)]
pub struct FlowBuilder {
    flow: Flow,
    steps: Vec<Step>,
}

impl FlowBuilder {
    /// Flow with the given id and title
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            flow: Flow::new(id, title),
            steps: Vec::new(),
        }
    }

    /// Add a tag
    pub fn tag(mut self, tag: &str) -> Self {
        self.flow.tags.insert(tag.to_string());
        self
    }

    /// Set the visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.flow.visibility = visibility;
        self
    }

    /// Add a step; it is attached to this flow
    pub fn step(mut self, step: StepBuilder) -> Self {
        let mut step = step.build();
        step.flow_id = Some(self.flow.id.clone());
        self.steps.push(step);
        self
    }

    /// Flow id
    pub fn id(&self) -> &FlowId {
        &self.flow.id
    }

    /// Finish the flow
    pub fn build(self) -> (Flow, Vec<Step>) {
        (self.flow, self.steps)
    }

    /// Seed an in-memory API with this flow
    pub fn seed(self) -> Arc<InMemoryFlowApi> {
        let api = Arc::new(InMemoryFlowApi::new());
        let (flow, steps) = self.build();
        if let Err(e) = api.insert_flow(flow, steps) {
            panic!("Invalid test flow: {}", e);
        }
        api
    }
}

/// `information` → required `multiple_choice` [A, B] → required `text_input` (min 5)
pub fn three_step_survey() -> FlowBuilder {
    FlowBuilder::new("survey", "Team survey")
        .tag("hr")
        .step(StepBuilder::information("welcome", 1, "Welcome").description("Takes a minute"))
        .step(
            StepBuilder::multiple_choice("plan", 2, "Pick a plan")
                .required()
                .labelled_option("A", "Plan A")
                .labelled_option("B", "Plan B"),
        )
        .step(StepBuilder::text_input("name", 3, "Your name").required().min_length(5))
}
