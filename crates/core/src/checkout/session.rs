//! Per-customer checkout state.

use std::collections::{BTreeMap, BTreeSet};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::CheckoutError;
use super::step::StepId;

/// What happens to the stored answers of steps that get reset.
///
/// `Retain` keeps them so the forms can pre-select the previous answer on the
/// next pass; the customer still has to resubmit every reset step. `Discard`
/// removes them, so reset steps render as if never visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleAnswerPolicy {
    #[default]
    Retain,
    Discard,
}

impl std::str::FromStr for StaleAnswerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retain" => Ok(Self::Retain),
            "discard" => Ok(Self::Discard),
            other => Err(format!("expected 'retain' or 'discard', got '{other}'")),
        }
    }
}

/// Accumulated answers of one customer's checkout.
///
/// Values persist until overwritten or [`clear`](Self::clear)ed. Completion
/// flags are owned by the session but only changed through
/// [`CheckoutFlow`](super::CheckoutFlow).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    step_data: BTreeMap<String, serde_json::Value>,
    completed: BTreeSet<StepId>,
    current_step_index: usize,
}

impl CheckoutSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored value for a field.
    #[must_use]
    pub fn value(&self, field: &str) -> Option<&serde_json::Value> {
        self.step_data.get(field)
    }

    /// Typed stored value for a field.
    ///
    /// A value that no longer deserializes into `T` reads as absent.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, field: &str) -> Option<T> {
        let value = self.step_data.get(field)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(field, error = %e, "ignoring undecodable checkout value");
                None
            }
        }
    }

    /// Store a field value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Serialization` if `value` cannot be encoded.
    pub fn set<T: Serialize + ?Sized>(
        &mut self,
        field: &str,
        value: &T,
    ) -> Result<(), CheckoutError> {
        let encoded = serde_json::to_value(value)?;
        self.step_data.insert(field.to_owned(), encoded);
        Ok(())
    }

    pub(crate) fn insert_value(&mut self, field: &str, value: serde_json::Value) {
        self.step_data.insert(field.to_owned(), value);
    }

    /// Remove a stored field, returning the old value.
    pub fn remove(&mut self, field: &str) -> Option<serde_json::Value> {
        self.step_data.remove(field)
    }

    #[must_use]
    pub fn is_completed(&self, step: StepId) -> bool {
        self.completed.contains(&step)
    }

    pub(crate) fn mark_completed(&mut self, step: StepId) {
        self.completed.insert(step);
    }

    pub(crate) fn mark_pending(&mut self, step: StepId) -> bool {
        self.completed.remove(&step)
    }

    /// Index of the step the customer last rendered or submitted.
    #[must_use]
    pub const fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    pub(crate) fn set_current_step_index(&mut self, index: usize) {
        self.current_step_index = index;
    }

    /// Whether nothing has been stored or completed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.step_data.is_empty() && self.completed.is_empty()
    }

    /// Forget every answer and completion flag.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
