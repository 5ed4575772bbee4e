//! Shipping address step.

use pantry_core::checkout::{CheckoutSession, StepId, fields};
use pantry_core::{Address, CountryCode};

use super::{Field, FieldErrors, FormData, StepForm, push_error, required};

/// Address form field names, in display order.
pub mod names {
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const STREET: &str = "street";
    pub const POSTCODE: &str = "postcode";
    pub const CITY: &str = "city";
    pub const COUNTRY: &str = "country";
}

/// Collects the delivery address.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressForm;

impl StepForm for AddressForm {
    type Value = Address;

    const STEP: StepId = StepId::Address;
    const FIELD: &'static str = fields::SHIPPING_ADDRESS;

    fn build_fields(&self, session: &CheckoutSession) -> Vec<Field> {
        let stored = session.get::<Address>(Self::FIELD);
        let value = |f: fn(&Address) -> String| stored.as_ref().map(f).unwrap_or_default();

        vec![
            Field::text(names::FIRST_NAME, "First name")
                .with_value(value(|a| a.first_name.clone())),
            Field::text(names::LAST_NAME, "Last name").with_value(value(|a| a.last_name.clone())),
            Field::text(names::STREET, "Street and number")
                .with_value(value(|a| a.street.clone())),
            Field::text(names::POSTCODE, "Postcode").with_value(value(|a| a.postcode.clone())),
            Field::text(names::CITY, "City").with_value(value(|a| a.city.clone())),
            Field::text(names::COUNTRY, "Country (two-letter code)")
                .with_value(value(|a| a.country.to_string())),
        ]
    }

    fn validate(&self, data: &FormData) -> Result<Address, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut text = |name: &str, message: &str| {
            required(data, &mut errors, name, message).map(str::to_owned)
        };

        let first_name = text(names::FIRST_NAME, "Please enter a first name.");
        let last_name = text(names::LAST_NAME, "Please enter a last name.");
        let street = text(names::STREET, "Please enter a street.");
        let postcode = text(names::POSTCODE, "Please enter a postcode.");
        let city = text(names::CITY, "Please enter a city.");
        let country = text(names::COUNTRY, "Please enter a country.");

        let country = country.and_then(|raw| match CountryCode::parse(&raw) {
            Ok(code) => Some(code),
            Err(e) => {
                push_error(&mut errors, names::COUNTRY, e.to_string());
                None
            }
        });

        let (
            Some(first_name),
            Some(last_name),
            Some(street),
            Some(postcode),
            Some(city),
            Some(country),
        ) = (first_name, last_name, street, postcode, city, country)
        else {
            return Err(errors);
        };

        Ok(Address {
            first_name,
            last_name,
            street,
            city,
            postcode,
            country,
        })
    }
}

/// Hook that pre-fills an empty country field.
pub fn default_country_hook(country: CountryCode) -> impl Fn(&mut Vec<Field>) + Send + Sync {
    move |fields| {
        for field in fields.iter_mut() {
            if field.name == names::COUNTRY && field.value.is_empty() {
                field.value = country.to_string();
            }
        }
    }
}
