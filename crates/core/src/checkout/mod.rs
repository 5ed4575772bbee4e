//! Multi-step checkout: session state and the step state machine.
//!
//! - [`CheckoutSession`] accumulates a customer's answers keyed by field name
//!   and tracks which steps are complete.
//! - [`CheckoutFlow`] is the ordered, fixed list of steps. It decides the next
//!   step to visit, marks steps complete and resets later steps when an
//!   earlier answer changes.

mod flow;
mod session;
mod step;

pub use flow::{CheckoutFlow, FlowError, NextStep, SubmitOutcome};
pub use session::{CheckoutSession, StaleAnswerPolicy};
pub use step::{StepDefinition, StepId, UnknownStep, fields};

/// Errors raised while mutating checkout state.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// The step is not part of the configured flow.
    #[error("step {0} is not part of this checkout")]
    StepNotInFlow(StepId),

    /// A stored or submitted value could not be (de)serialized.
    #[error("checkout value could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}
