//! Shipping method step.
//!
//! The form is built from the methods resolved for the customer's address.
//! Resolution happens once per request, so rendering and validation see the
//! same choices.

use pantry_core::ShippingMethodId;
use pantry_core::checkout::{CheckoutSession, StepId, fields};
use pantry_core::shipping::ShippingMethod;

use super::{Field, FieldErrors, FormAction, FormData, SelectOption, StepForm, push_error};

/// Settings for the shipping method form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingMethodFormConfig {
    /// Field label. Default: `"Shipping method"`.
    pub label: String,
    /// Select the first method when nothing valid is stored. Default: `true`.
    pub preselect_first: bool,
    /// Error when nothing was chosen. Default: `"Please choose a shipping method."`.
    pub required_message: String,
    /// Error when the choice is not offered for the address.
    /// Default: `"This shipping method is not available for your address."`.
    pub unavailable_message: String,
    /// Submit button label. Default: `"Continue to payment"`.
    pub submit_label: String,
}

impl Default for ShippingMethodFormConfig {
    fn default() -> Self {
        Self {
            label: "Shipping method".to_string(),
            preselect_first: true,
            required_message: "Please choose a shipping method.".to_string(),
            unavailable_message: "This shipping method is not available for your address."
                .to_string(),
            submit_label: "Continue to payment".to_string(),
        }
    }
}

/// Lets the customer pick one of the resolved shipping methods.
#[derive(Debug, Clone)]
pub struct ShippingMethodForm<'a> {
    methods: Vec<ShippingMethod>,
    config: &'a ShippingMethodFormConfig,
}

impl<'a> ShippingMethodForm<'a> {
    /// `methods` is the resolver's answer for the current address.
    #[must_use]
    pub const fn new(methods: Vec<ShippingMethod>, config: &'a ShippingMethodFormConfig) -> Self {
        Self { methods, config }
    }

    #[must_use]
    pub fn methods(&self) -> &[ShippingMethod] {
        &self.methods
    }

    /// Whether there is anything to choose from.
    #[must_use]
    pub fn has_choices(&self) -> bool {
        !self.methods.is_empty()
    }

    fn offers(&self, id: ShippingMethodId) -> bool {
        self.methods.iter().any(|m| m.id == id)
    }

    /// Method pre-selected when the form is first shown.
    fn initial_choice(&self, session: &CheckoutSession) -> Option<ShippingMethodId> {
        session
            .get::<ShippingMethodId>(Self::FIELD)
            .filter(|id| self.offers(*id))
            .or_else(|| {
                self.config
                    .preselect_first
                    .then(|| self.methods.first().map(|m| m.id))
                    .flatten()
            })
    }
}

impl StepForm for ShippingMethodForm<'_> {
    type Value = ShippingMethodId;

    const STEP: StepId = StepId::Shipping;
    const FIELD: &'static str = fields::SHIPPING_METHOD;

    fn build_fields(&self, session: &CheckoutSession) -> Vec<Field> {
        let chosen = self.initial_choice(session);
        let options = self
            .methods
            .iter()
            .map(|m| SelectOption {
                value: m.id.to_string(),
                label: m.label(),
                selected: Some(m.id) == chosen,
            })
            .collect();

        vec![Field::select(Self::FIELD, &self.config.label, options)]
    }

    fn build_actions(&self) -> Vec<FormAction> {
        vec![FormAction::next(&self.config.submit_label)]
    }

    fn validate(&self, data: &FormData) -> Result<ShippingMethodId, FieldErrors> {
        let mut errors = FieldErrors::new();

        let raw = data.get(Self::FIELD).map_or("", |v| v.trim());
        if raw.is_empty() {
            push_error(&mut errors, Self::FIELD, self.config.required_message.as_str());
            return Err(errors);
        }

        match raw.parse::<ShippingMethodId>() {
            Ok(id) if self.offers(id) => Ok(id),
            _ => {
                push_error(&mut errors, Self::FIELD, self.config.unavailable_message.as_str());
                Err(errors)
            }
        }
    }
}
