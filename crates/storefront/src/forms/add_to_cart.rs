//! Add-to-cart form shown on product listings.
//!
//! The rendered control depends only on the product and how much of it is
//! already in the cart, which is what [`AddToCartForm::cache_key`] hashes.

use rust_decimal::Decimal;

use pantry_core::cart::{Cart, Product, parse_quantity};

use super::{Field, FieldErrors, FormAction, FormData, push_error};

/// Add-to-cart field names.
pub mod names {
    pub const PRODUCT_ID: &str = "product_id";
    pub const QUANTITY: &str = "quantity";
}

/// Add-to-cart control for one product.
#[derive(Debug, Clone, Copy)]
pub struct AddToCartForm<'a> {
    product: &'a Product,
    in_cart: Decimal,
    max_line_quantity: Decimal,
}

impl<'a> AddToCartForm<'a> {
    #[must_use]
    pub const fn new(product: &'a Product, in_cart: Decimal, max_line_quantity: Decimal) -> Self {
        Self {
            product,
            in_cart,
            max_line_quantity,
        }
    }

    #[must_use]
    pub const fn product(&self) -> &Product {
        self.product
    }

    /// Quantity of this product already in the cart.
    #[must_use]
    pub const fn in_cart(&self) -> Decimal {
        self.in_cart
    }

    /// Key under which the rendered control may be cached.
    #[must_use]
    pub fn cache_key(&self) -> String {
        self.product.cache_key(self.in_cart)
    }

    /// Fields of the control. `quantity` defaults to 1.
    #[must_use]
    pub fn fields(&self) -> Vec<Field> {
        vec![
            Field::hidden(names::PRODUCT_ID, self.product.id.to_string()),
            Field::text(
                names::QUANTITY,
                &format!("Quantity ({})", self.product.quantity_unit.title),
            )
            .with_value("1"),
        ]
    }

    #[must_use]
    pub fn actions(&self) -> Vec<FormAction> {
        vec![FormAction::next("Add to cart")]
    }

    /// Fields with a rejected submission's quantity and errors restored.
    #[must_use]
    pub fn rejected_fields(&self, data: &FormData, errors: &FieldErrors) -> Vec<Field> {
        let mut fields = self.fields();
        for field in &mut fields {
            if field.name == names::QUANTITY
                && let Some(raw) = data.get(names::QUANTITY)
            {
                raw.clone_into(&mut field.value);
            }
            if let Some(messages) = errors.get(&field.name) {
                field.errors.clone_from(messages);
            }
        }
        fields
    }

    /// Parse the submitted quantity against the product's unit.
    ///
    /// # Errors
    ///
    /// Returns the quantity field's error when the input is rejected.
    pub fn validate(&self, data: &FormData) -> Result<Decimal, FieldErrors> {
        let raw = data.get(names::QUANTITY).map_or("", String::as_str);
        parse_quantity(raw, &self.product.quantity_unit, self.max_line_quantity).map_err(|e| {
            let mut errors = FieldErrors::new();
            push_error(&mut errors, names::QUANTITY, e.to_string());
            errors
        })
    }

    /// Validate and add the quantity to the cart.
    ///
    /// Returns the new quantity of the product's cart line.
    ///
    /// # Errors
    ///
    /// Returns the quantity field's error; the cart is left unchanged.
    pub fn submit(&self, cart: &mut Cart, data: &FormData) -> Result<Decimal, FieldErrors> {
        let quantity = self.validate(data)?;
        cart.add(self.product.id, quantity, self.max_line_quantity)
            .map_err(|e| {
                let mut errors = FieldErrors::new();
                push_error(&mut errors, names::QUANTITY, e.to_string());
                errors
            })
    }
}
