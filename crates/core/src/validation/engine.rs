//! Validation engine: runs registered validators in priority order.

use std::sync::{Arc, PoisonError, RwLock};

use super::types::{ValidationFailed, ValidationResult, Validator};

/// Coordinates validation across registered rule sets.
///
/// Validators are kept sorted ascending by priority; registration order
/// breaks ties between equal priorities.
pub struct ValidationEngine<T> {
    validators: RwLock<Vec<Arc<dyn Validator<T>>>>,
}

impl<T> Default for ValidationEngine<T> {
    fn default() -> Self {
        Self {
            validators: RwLock::new(Vec::new()),
        }
    }
}

impl<T> ValidationEngine<T> {
    /// Creates an engine with no validators.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a validator, keeping the list sorted by priority.
    pub fn register(&self, validator: Arc<dyn Validator<T>>) {
        let mut validators = self
            .validators
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Insert after existing validators of the same priority so
        // registration order is preserved among equals.
        let position = validators
            .partition_point(|existing| existing.priority() <= validator.priority());
        validators.insert(position, validator);
    }

    /// Returns the number of registered validators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.validators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no validators are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs all validators against the subject and accumulates findings.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationFailed`] carrying the full finding list when any
    /// finding has error severity. `Ok` carries the non-blocking findings
    /// (warnings and infos).
    pub fn validate(&self, subject: &T) -> Result<Vec<ValidationResult>, ValidationFailed> {
        let validators: Vec<Arc<dyn Validator<T>>> = {
            let guard = self
                .validators
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            guard.clone()
        };

        let mut results = Vec::new();
        for validator in validators {
            results.extend(validator.validate(subject));
        }

        if results.iter().any(ValidationResult::is_error) {
            return Err(ValidationFailed::new(results));
        }
        Ok(results)
    }
}
