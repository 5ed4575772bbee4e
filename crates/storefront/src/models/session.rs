//! Session-related types.
//!
//! The checkout session and the cart live in the tower-sessions session as
//! JSON under fixed keys.

use tower_sessions::Session;

use pantry_core::cart::Cart;
use pantry_core::checkout::CheckoutSession;

/// Session keys for storefront data.
pub mod keys {
    /// Key for the checkout answers and step completion.
    pub const CHECKOUT: &str = "checkout";

    /// Key for the shopping cart.
    pub const CART: &str = "cart";
}

type SessionResult<T> = Result<T, tower_sessions::session::Error>;

/// Load the checkout session, starting a fresh one on first visit.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_checkout(session: &Session) -> SessionResult<CheckoutSession> {
    Ok(session
        .get::<CheckoutSession>(keys::CHECKOUT)
        .await?
        .unwrap_or_default())
}

/// Store the checkout session.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_checkout(session: &Session, checkout: &CheckoutSession) -> SessionResult<()> {
    session.insert(keys::CHECKOUT, checkout).await
}

/// Load the cart, empty when none was stored.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_cart(session: &Session) -> SessionResult<Cart> {
    Ok(session.get::<Cart>(keys::CART).await?.unwrap_or_default())
}

/// Store the cart.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_cart(session: &Session, cart: &Cart) -> SessionResult<()> {
    session.insert(keys::CART, cart).await
}

/// Forget the checkout answers and, when `with_cart` is set, the cart.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_checkout(session: &Session, with_cart: bool) -> SessionResult<()> {
    session.remove_value(keys::CHECKOUT).await?;
    if with_cart {
        session.remove_value(keys::CART).await?;
    }
    Ok(())
}
