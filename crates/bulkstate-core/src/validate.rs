use crate::errors::ValidationError;
use crate::types::TargetTransition;

/// Input that passed validation and is ready to run. Only `validate` builds one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchPlan {
    entity: String,
    transition: TargetTransition,
    identifiers: Vec<String>,
}

impl BatchPlan {
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn transition(&self) -> TargetTransition {
        self.transition
    }

    /// Never empty.
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }
}

/// Pure precondition check; no remote calls. Checked in order: entity,
/// transition, selection.
pub fn validate(
    entity: Option<&str>,
    transition: Option<TargetTransition>,
    identifiers: &[String],
) -> Result<BatchPlan, ValidationError> {
    let entity = match entity.map(str::trim) {
        Some(e) if !e.is_empty() => e,
        _ => return Err(ValidationError::MissingEntity),
    };
    let transition = transition.ok_or(ValidationError::MissingTransition)?;
    if identifiers.is_empty() {
        return Err(ValidationError::EmptySelection);
    }
    Ok(BatchPlan {
        entity: entity.to_string(),
        transition,
        identifiers: identifiers.to_vec(),
    })
}
