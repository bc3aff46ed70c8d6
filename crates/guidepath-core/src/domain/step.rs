use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::flow::{FlowId, StepId};
use super::null_as_default;
use crate::CoreError;

/// The `step_type` discriminator as sent by the Flow API
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepType {
    /// Announcement, no answer expected
    Information,
    /// Pick one of the declared options
    MultipleChoice,
    /// Free text, optionally constrained by validation rules
    TextInput,
    /// Declared by the API, no traversal semantics
    ConditionalBranch,
    /// Declared by the API, no traversal semantics
    Subflow,
    /// Any type string this engine does not know
    Unknown(String),
}

impl StepType {
    /// Wire name of the step type
    pub fn as_str(&self) -> &str {
        match self {
            StepType::Information => "information",
            StepType::MultipleChoice => "multiple_choice",
            StepType::TextInput => "text_input",
            StepType::ConditionalBranch => "conditional_branch",
            StepType::Subflow => "subflow",
            StepType::Unknown(other) => other,
        }
    }
}

impl From<String> for StepType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "information" => StepType::Information,
            "multiple_choice" => StepType::MultipleChoice,
            "text_input" => StepType::TextInput,
            "conditional_branch" => StepType::ConditionalBranch,
            "subflow" => StepType::Subflow,
            _ => StepType::Unknown(value),
        }
    }
}

impl From<StepType> for String {
    fn from(value: StepType) -> Self {
        match value {
            StepType::Unknown(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

/// One selectable option of a multiple choice step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Value submitted as the answer
    pub value: String,
    /// Label shown to the user
    pub text: String,
}

impl ChoiceOption {
    /// Create an option
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
        }
    }
}

/// Constraints for `text_input` answers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRules {
    /// Minimum answer length in characters
    #[serde(default)]
    pub min_length: Option<usize>,
    /// Maximum answer length in characters
    #[serde(default)]
    pub max_length: Option<usize>,
    /// Answer must look like an email address
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: bool,
    /// Regular expression the answer must match
    #[serde(default)]
    pub pattern: Option<String>,
    /// Message shown when `pattern` does not match
    #[serde(default)]
    pub pattern_message: Option<String>,
}

/// One question or informational unit of a flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Unique identifier
    pub id: StepId,

    /// Owning flow
    #[serde(default)]
    pub flow_id: Option<FlowId>,

    /// Traversal position, unique within the flow
    pub step_order: u32,

    /// Discriminator for the type-specific payload
    pub step_type: StepType,

    /// Question or headline
    pub question_text: String,

    /// Additional explanation
    #[serde(default)]
    pub description: Option<String>,

    /// Whether an empty answer is rejected
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_required: bool,

    /// Options of a `multiple_choice` step
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<ChoiceOption>,

    /// Rules of a `text_input` step
    #[serde(default)]
    pub validation_rules: Option<ValidationRules>,
}

/// Borrowed view of a step as a closed tagged union
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind<'a> {
    /// Pass-through announcement
    Information,
    /// Choice among options
    MultipleChoice {
        /// Declared options, in display order
        options: &'a [ChoiceOption],
    },
    /// Free text
    TextInput {
        /// Optional constraints
        rules: Option<&'a ValidationRules>,
    },
    /// Placeholder without traversal semantics
    ConditionalBranch,
    /// Placeholder without traversal semantics
    Subflow,
    /// Unrecognised type string
    Unknown(&'a str),
}

/// Option as presented to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceDisplay {
    /// Submitted value
    pub value: String,
    /// Label
    pub text: String,
    /// Whether the draft currently holds this value
    pub selected: bool,
}

/// What the UI should show for a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepDisplay {
    /// Information step
    Announcement {
        /// Headline
        title: String,
        /// Body text
        description: Option<String>,
    },
    /// Multiple choice step
    Choice {
        /// Question
        question: String,
        /// Explanation
        description: Option<String>,
        /// Options with selection state
        options: Vec<ChoiceDisplay>,
    },
    /// Text input step
    FreeText {
        /// Question
        question: String,
        /// Explanation
        description: Option<String>,
        /// Current draft
        value: String,
    },
    /// Terminal "unknown step type" state
    Unsupported {
        /// The type string that cannot be rendered
        step_type: String,
    },
}

impl Step {
    /// Create a step with no type-specific payload
    pub fn new(
        id: impl Into<StepId>,
        step_order: u32,
        step_type: StepType,
        question_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            flow_id: None,
            step_order,
            step_type,
            question_text: question_text.into(),
            description: None,
            is_required: false,
            options: Vec::new(),
            validation_rules: None,
        }
    }

    /// Tagged-union view used for exhaustive dispatch
    pub fn kind(&self) -> StepKind<'_> {
        match &self.step_type {
            StepType::Information => StepKind::Information,
            StepType::MultipleChoice => StepKind::MultipleChoice {
                options: &self.options,
            },
            StepType::TextInput => StepKind::TextInput {
                rules: self.validation_rules.as_ref(),
            },
            StepType::ConditionalBranch => StepKind::ConditionalBranch,
            StepType::Subflow => StepKind::Subflow,
            StepType::Unknown(other) => StepKind::Unknown(other),
        }
    }

    /// Information steps pass through without an answer
    pub fn expects_answer(&self) -> bool {
        !matches!(self.kind(), StepKind::Information)
    }

    /// Whether `value` is one of the declared options
    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|option| option.value == value)
    }

    /// View model for the step given the current draft
    pub fn display(&self, draft: &str) -> StepDisplay {
        match self.kind() {
            StepKind::Information => StepDisplay::Announcement {
                title: self.question_text.clone(),
                description: self.description.clone(),
            },
            StepKind::MultipleChoice { options } => StepDisplay::Choice {
                question: self.question_text.clone(),
                description: self.description.clone(),
                options: options
                    .iter()
                    .map(|option| ChoiceDisplay {
                        value: option.value.clone(),
                        text: option.text.clone(),
                        selected: option.value == draft,
                    })
                    .collect(),
            },
            StepKind::TextInput { .. } => StepDisplay::FreeText {
                question: self.question_text.clone(),
                description: self.description.clone(),
                value: draft.to_string(),
            },
            StepKind::ConditionalBranch | StepKind::Subflow | StepKind::Unknown(_) => {
                StepDisplay::Unsupported {
                    step_type: self.step_type.as_str().to_string(),
                }
            }
        }
    }
}

/// Payload for creating or editing a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDraft {
    /// Traversal position
    pub step_order: u32,
    /// Step type
    pub step_type: StepType,
    /// Question or headline
    pub question_text: String,
    /// Explanation
    #[serde(default)]
    pub description: Option<String>,
    /// Required flag
    #[serde(default)]
    pub is_required: bool,
    /// Options for multiple choice
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    /// Rules for text input
    #[serde(default)]
    pub validation_rules: Option<ValidationRules>,
}

impl StepDraft {
    /// Materialise the draft as a step with the given identity
    pub fn into_step(self, id: StepId, flow_id: FlowId) -> Step {
        Step {
            id,
            flow_id: Some(flow_id),
            step_order: self.step_order,
            step_type: self.step_type,
            question_text: self.question_text,
            description: self.description,
            is_required: self.is_required,
            options: self.options,
            validation_rules: self.validation_rules,
        }
    }
}

impl From<&Step> for StepDraft {
    fn from(step: &Step) -> Self {
        Self {
            step_order: step.step_order,
            step_type: step.step_type.clone(),
            question_text: step.question_text.clone(),
            description: step.description.clone(),
            is_required: step.is_required,
            options: step.options.clone(),
            validation_rules: step.validation_rules.clone(),
        }
    }
}

/// Sort a fetched step list by `step_order`, rejecting repeated orders
pub fn order_steps(flow_id: &FlowId, mut steps: Vec<Step>) -> Result<Vec<Step>, CoreError> {
    let mut seen = HashSet::with_capacity(steps.len());
    for step in &steps {
        if !seen.insert(step.step_order) {
            return Err(CoreError::DuplicateStepOrder {
                flow_id: flow_id.0.clone(),
                order: step.step_order,
            });
        }
    }
    steps.sort_by_key(|step| step.step_order);
    Ok(steps)
}
