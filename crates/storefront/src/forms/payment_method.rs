//! Payment method step. Records the choice only; nothing is charged.

use pantry_core::checkout::{CheckoutSession, StepId, fields};

use super::{Field, FieldErrors, FormAction, FormData, SelectOption, StepForm, push_error};

/// Lets the customer pick one of the configured payment methods.
#[derive(Debug, Clone, Copy)]
pub struct PaymentMethodForm<'a> {
    methods: &'a [String],
}

impl<'a> PaymentMethodForm<'a> {
    #[must_use]
    pub const fn new(methods: &'a [String]) -> Self {
        Self { methods }
    }
}

/// Display label for a configured method name: `cash_on_delivery` becomes
/// `Cash on delivery`.
#[must_use]
pub fn payment_label(name: &str) -> String {
    let spaced = name.replace(['_', '-'], " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

impl StepForm for PaymentMethodForm<'_> {
    type Value = String;

    const STEP: StepId = StepId::Payment;
    const FIELD: &'static str = fields::PAYMENT_METHOD;

    fn build_fields(&self, session: &CheckoutSession) -> Vec<Field> {
        let stored = session
            .get::<String>(Self::FIELD)
            .filter(|s| self.methods.contains(s));
        let chosen = stored.as_deref().or_else(|| self.methods.first().map(String::as_str));

        let options = self
            .methods
            .iter()
            .map(|name| SelectOption {
                value: name.clone(),
                label: payment_label(name),
                selected: Some(name.as_str()) == chosen,
            })
            .collect();

        vec![Field::select(Self::FIELD, "Payment method", options)]
    }

    fn build_actions(&self) -> Vec<FormAction> {
        vec![FormAction::next("Review order")]
    }

    fn validate(&self, data: &FormData) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        let raw = data.get(Self::FIELD).map_or("", |v| v.trim());

        if raw.is_empty() {
            push_error(&mut errors, Self::FIELD, "Please choose a payment method.");
        } else if !self.methods.iter().any(|m| m == raw) {
            push_error(&mut errors, Self::FIELD, "This payment method is not available.");
        } else {
            return Ok(raw.to_owned());
        }
        Err(errors)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn methods() -> Vec<String> {
        vec!["invoice".to_string(), "cash_on_delivery".to_string()]
    }

    #[test]
    fn test_payment_label() {
        assert_eq!(payment_label("invoice"), "Invoice");
        assert_eq!(payment_label("cash_on_delivery"), "Cash on delivery");
        assert_eq!(payment_label(""), "");
    }

    #[test]
    fn test_build_fields_selects_first_method() {
        let methods = methods();
        let fields = PaymentMethodForm::new(&methods).build_fields(&CheckoutSession::new());
        assert_eq!(fields[0].selected(), Some("invoice"));
        assert_eq!(fields[0].options[1].label, "Cash on delivery");
    }

    #[test]
    fn test_validate_only_accepts_configured_methods() {
        let methods = methods();
        let form = PaymentMethodForm::new(&methods);
        let data = |v: &str| FormData::from([(fields::PAYMENT_METHOD.to_string(), v.to_string())]);

        assert_eq!(form.validate(&data("cash_on_delivery")).unwrap(), "cash_on_delivery");
        assert!(form.validate(&data("bitcoin")).is_err());
        assert!(form.validate(&data(" ")).is_err());
    }
}
