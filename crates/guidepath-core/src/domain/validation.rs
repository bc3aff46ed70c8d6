//! Per-step-type answer validation.
//!
//! Rules are evaluated in order and the first failure wins. Lengths are
//! counted in characters. A `min_length`/`max_length` of zero counts as unset.

use dashmap::DashMap;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use super::step::{Step, StepKind, ValidationRules};

/// Message for an empty required answer
pub const REQUIRED_MESSAGE: &str = "This field is required";

/// Message for an answer that is not an email address
pub const EMAIL_MESSAGE: &str = "Please enter a valid email address";

/// Fallback message for a failed `pattern` rule
pub const PATTERN_MESSAGE: &str = "Invalid format";

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();

    // Step patterns by source text; `None` marks a pattern that failed to compile
    static ref PATTERN_CACHE: DashMap<String, Option<Regex>> = DashMap::new();
}

/// Compiled form of a step pattern, built once per distinct pattern
fn compiled_pattern(pattern: &str) -> Option<Regex> {
    if let Some(cached) = PATTERN_CACHE.get(pattern) {
        return cached.clone();
    }

    let compiled = match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!(pattern, error = %e, "Step validation pattern does not compile");
            None
        }
    };
    PATTERN_CACHE
        .entry(pattern.to_string())
        .or_insert(compiled)
        .clone()
}

/// Outcome of validating a draft answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// The answer may be submitted
    Valid,
    /// The answer is rejected for the given reason
    Invalid(String),
}

impl ValidationResult {
    /// True for `Valid`
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// Rejection reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(reason) => Some(reason),
        }
    }
}

/// Validate `answer` against the shape of `step`
pub fn validate(step: &Step, answer: &str) -> ValidationResult {
    let kind = step.kind();
    if let StepKind::Information = kind {
        return ValidationResult::Valid;
    }

    if step.is_required && answer.trim().is_empty() {
        return ValidationResult::Invalid(REQUIRED_MESSAGE.to_string());
    }

    match kind {
        StepKind::TextInput { rules: Some(rules) } => validate_text(rules, answer),
        _ => ValidationResult::Valid,
    }
}

fn validate_text(rules: &ValidationRules, answer: &str) -> ValidationResult {
    let length = answer.chars().count();

    if let Some(min) = rules.min_length.filter(|min| *min > 0) {
        if length < min {
            return ValidationResult::Invalid(format!("Minimum length is {} characters", min));
        }
    }

    if let Some(max) = rules.max_length.filter(|max| *max > 0) {
        if length > max {
            return ValidationResult::Invalid(format!("Maximum length is {} characters", max));
        }
    }

    if rules.email && !EMAIL_REGEX.is_match(answer) {
        return ValidationResult::Invalid(EMAIL_MESSAGE.to_string());
    }

    if let Some(pattern) = rules.pattern.as_deref().filter(|p| !p.is_empty()) {
        let matched = compiled_pattern(pattern)
            .map(|regex| regex.is_match(answer))
            .unwrap_or(false);
        if !matched {
            let message = rules
                .pattern_message
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| PATTERN_MESSAGE.to_string());
            return ValidationResult::Invalid(message);
        }
    }

    ValidationResult::Valid
}
