//! Checkout step forms and the add-to-cart form.
//!
//! Each checkout step has a [`StepForm`] that builds its fields from the
//! current [`CheckoutSession`], validates submitted form data into a typed
//! value and hands that value to the [`CheckoutFlow`]. Validation failures
//! never touch the session.
//!
//! Field hooks let the application adjust built fields (e.g. pre-fill a
//! default) without the forms knowing about configuration. Hooks are
//! registered once when the application state is built and run in
//! registration order.

pub mod add_to_cart;
pub mod address;
pub mod payment_method;
pub mod shipping_method;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use pantry_core::checkout::{CheckoutError, CheckoutFlow, CheckoutSession, StepId, SubmitOutcome};

pub use add_to_cart::AddToCartForm;
pub use address::AddressForm;
pub use payment_method::PaymentMethodForm;
pub use shipping_method::{ShippingMethodForm, ShippingMethodFormConfig};

/// Submitted form fields, name to raw value.
pub type FormData = BTreeMap<String, String>;

/// Validation messages per field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// How a field is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Select,
    Hidden,
}

/// One choice of a select field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// A renderable form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    /// Current value of text and hidden fields.
    pub value: String,
    /// Choices of select fields.
    pub options: Vec<SelectOption>,
    pub required: bool,
    pub errors: Vec<String>,
}

impl Field {
    #[must_use]
    pub fn text(name: &str, label: &str) -> Self {
        Self {
            name: name.to_owned(),
            label: label.to_owned(),
            kind: FieldKind::Text,
            value: String::new(),
            options: Vec::new(),
            required: true,
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn select(name: &str, label: &str, options: Vec<SelectOption>) -> Self {
        Self {
            kind: FieldKind::Select,
            options,
            ..Self::text(name, label)
        }
    }

    #[must_use]
    pub fn hidden(name: &str, value: impl Into<String>) -> Self {
        Self {
            kind: FieldKind::Hidden,
            value: value.into(),
            ..Self::text(name, "")
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    #[must_use]
    pub fn is_select(&self) -> bool {
        self.kind == FieldKind::Select
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.kind == FieldKind::Hidden
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Value of the selected option, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.selected)
            .map(|o| o.value.as_str())
    }

    /// Mark the option with `value` as the only selected one.
    ///
    /// Returns false (and leaves the selection alone) if no option matches.
    pub fn select_value(&mut self, value: &str) -> bool {
        if !self.options.iter().any(|o| o.value == value) {
            return false;
        }
        for option in &mut self.options {
            option.selected = option.value == value;
        }
        true
    }

    /// Put a submitted value back into the field.
    fn restore(&mut self, submitted: &str) {
        match self.kind {
            FieldKind::Select => {
                self.select_value(submitted);
            }
            FieldKind::Text | FieldKind::Hidden => submitted.clone_into(&mut self.value),
        }
    }
}

/// A submit button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormAction {
    pub name: String,
    pub label: String,
}

impl FormAction {
    /// The forward action that submits the step.
    #[must_use]
    pub fn next(label: &str) -> Self {
        Self {
            name: "next".to_string(),
            label: label.to_owned(),
        }
    }
}

/// Callback that adjusts a step's fields after they are built.
pub type FieldHook = Arc<dyn Fn(&mut Vec<Field>) + Send + Sync>;

/// Field hooks per checkout step, run in registration order.
#[derive(Clone, Default)]
pub struct FormHooks {
    hooks: BTreeMap<StepId, Vec<FieldHook>>,
}

impl FormHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook for `step`.
    pub fn register<F>(&mut self, step: StepId, hook: F)
    where
        F: Fn(&mut Vec<Field>) + Send + Sync + 'static,
    {
        self.hooks.entry(step).or_default().push(Arc::new(hook));
    }

    /// Run every hook registered for `step`.
    pub fn apply(&self, step: StepId, fields: &mut Vec<Field>) {
        for hook in self.hooks.get(&step).into_iter().flatten() {
            hook(fields);
        }
    }

    /// Number of hooks registered for `step`.
    #[must_use]
    pub fn count(&self, step: StepId) -> usize {
        self.hooks.get(&step).map_or(0, Vec::len)
    }
}

impl fmt::Debug for FormHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: BTreeMap<_, _> = self.hooks.iter().map(|(k, v)| (k, v.len())).collect();
        f.debug_struct("FormHooks").field("hooks", &counts).finish()
    }
}

/// Result of submitting a step form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepSubmission {
    /// The value was stored and the step completed.
    Accepted(SubmitOutcome),
    /// Validation failed; the session was not touched.
    Rejected(FieldErrors),
}

/// A checkout step form.
pub trait StepForm {
    /// Typed value stored in the checkout session.
    type Value: Serialize;

    /// Step this form completes.
    const STEP: StepId;

    /// Session field the value is stored under.
    const FIELD: &'static str;

    /// Build the fields, pre-filled from the session.
    fn build_fields(&self, session: &CheckoutSession) -> Vec<Field>;

    /// Validate submitted data into the stored value.
    ///
    /// # Errors
    ///
    /// Returns the messages per field when the data is not acceptable.
    fn validate(&self, data: &FormData) -> Result<Self::Value, FieldErrors>;

    fn build_actions(&self) -> Vec<FormAction> {
        vec![FormAction::next("Continue")]
    }

    /// Validate and, if valid, store the value and complete the step.
    ///
    /// A changed value resets every later step; resubmitting the stored
    /// value changes nothing else.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` if the step is not part of `flow` or the value
    /// cannot be serialized.
    fn submit(
        &self,
        flow: &CheckoutFlow,
        session: &mut CheckoutSession,
        data: &FormData,
    ) -> Result<StepSubmission, CheckoutError> {
        match self.validate(data) {
            Ok(value) => {
                let outcome = flow.submit(session, Self::STEP, Self::FIELD, &value)?;
                Ok(StepSubmission::Accepted(outcome))
            }
            Err(errors) => Ok(StepSubmission::Rejected(errors)),
        }
    }

    /// Fields ready for rendering: built, hooked, then overlaid with a
    /// rejected submission's values and errors.
    fn render_fields(
        &self,
        session: &CheckoutSession,
        hooks: &FormHooks,
        rejected: Option<(&FormData, &FieldErrors)>,
    ) -> Vec<Field> {
        let mut fields = self.build_fields(session);
        hooks.apply(Self::STEP, &mut fields);

        if let Some((data, errors)) = rejected {
            for field in &mut fields {
                if let Some(value) = data.get(&field.name) {
                    field.restore(value);
                }
                if let Some(messages) = errors.get(&field.name) {
                    field.errors.clone_from(messages);
                }
            }
        }

        fields
    }
}

/// Record an error message for a field.
pub(crate) fn push_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_owned()).or_default().push(message.into());
}

/// Trimmed value of a required field, recording an error when blank.
pub(crate) fn required<'a>(
    data: &'a FormData,
    errors: &mut FieldErrors,
    field: &str,
    message: &str,
) -> Option<&'a str> {
    match data.get(field).map(|v| v.trim()) {
        Some(value) if !value.is_empty() => Some(value),
        _ => {
            push_error(errors, field, message);
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn options() -> Vec<SelectOption> {
        ["a", "b"]
            .iter()
            .map(|v| SelectOption {
                value: (*v).to_string(),
                label: v.to_uppercase(),
                selected: *v == "a",
            })
            .collect()
    }

    #[test]
    fn test_select_value_switches_selection() {
        let mut field = Field::select("choice", "Choice", options());
        assert_eq!(field.selected(), Some("a"));

        assert!(field.select_value("b"));
        assert_eq!(field.selected(), Some("b"));

        assert!(!field.select_value("zzz"));
        assert_eq!(field.selected(), Some("b"));
    }

    #[test]
    fn test_hooks_run_in_registration_order() {
        let mut hooks = FormHooks::new();
        hooks.register(StepId::Address, |fields| {
            fields.push(Field::text("first", "First"));
        });
        hooks.register(StepId::Address, |fields| {
            for field in fields.iter_mut() {
                field.value.push('!');
            }
        });

        let mut fields = Vec::new();
        hooks.apply(StepId::Address, &mut fields);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].value, "!");

        let mut untouched = Vec::new();
        hooks.apply(StepId::Payment, &mut untouched);
        assert!(untouched.is_empty());
        assert_eq!(hooks.count(StepId::Address), 2);
    }

    #[test]
    fn test_required_trims_and_reports() {
        let mut data = FormData::new();
        data.insert("city".to_string(), "  Paris ".to_string());
        data.insert("street".to_string(), "   ".to_string());
        let mut errors = FieldErrors::new();

        assert_eq!(required(&data, &mut errors, "city", "x"), Some("Paris"));
        assert_eq!(required(&data, &mut errors, "street", "Street?"), None);
        assert_eq!(required(&data, &mut errors, "postcode", "Postcode?"), None);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors["street"], vec!["Street?".to_string()]);
    }
}
