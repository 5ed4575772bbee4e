//! The ordered checkout step state machine.

use std::collections::BTreeSet;

use serde::Serialize;

use super::CheckoutError;
use super::session::{CheckoutSession, StaleAnswerPolicy};
use super::step::{StepDefinition, StepId};
use crate::types::StepStatus;

/// Errors in a flow's step configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("checkout flow needs at least one step")]
    Empty,
    #[error("step {0} is configured more than once")]
    DuplicateStep(StepId),
    #[error("two steps share order {0}")]
    DuplicateOrder(u32),
}

/// Where the customer should go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep<'a> {
    /// The lowest-ordered step that is still pending.
    Step(&'a StepDefinition),
    /// Every step is complete.
    Confirmation,
}

/// Result of storing a step's answer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmitOutcome {
    /// Whether the submitted value differs from what was stored.
    pub changed: bool,
    /// Later steps that were completed and are now pending again.
    pub reset: Vec<StepId>,
}

/// Fixed, ordered sequence of checkout steps.
///
/// The flow holds no per-customer state; every operation takes the
/// customer's [`CheckoutSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutFlow {
    steps: Vec<StepDefinition>,
    policy: StaleAnswerPolicy,
}

impl CheckoutFlow {
    /// Build a flow from step definitions, sorted by `order`.
    ///
    /// # Errors
    ///
    /// Returns `FlowError` if no steps are given, a step id repeats, or two
    /// steps share an order.
    pub fn new(mut steps: Vec<StepDefinition>) -> Result<Self, FlowError> {
        if steps.is_empty() {
            return Err(FlowError::Empty);
        }

        let mut ids = BTreeSet::new();
        let mut orders = BTreeSet::new();
        for step in &steps {
            if !ids.insert(step.id) {
                return Err(FlowError::DuplicateStep(step.id));
            }
            if !orders.insert(step.order) {
                return Err(FlowError::DuplicateOrder(step.order));
            }
        }

        steps.sort_by_key(|s| s.order);
        Ok(Self {
            steps,
            policy: StaleAnswerPolicy::default(),
        })
    }

    /// Address, then shipping method, then payment method.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            steps: vec![
                StepDefinition::new(StepId::Address, 1, "Shipping address"),
                StepDefinition::new(StepId::Shipping, 2, "Shipping method"),
                StepDefinition::new(StepId::Payment, 3, "Payment method"),
            ],
            policy: StaleAnswerPolicy::default(),
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: StaleAnswerPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub const fn policy(&self) -> StaleAnswerPolicy {
        self.policy
    }

    #[must_use]
    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    #[must_use]
    pub fn step(&self, id: StepId) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| s.id == id)
    }

    fn index_of(&self, id: StepId) -> Result<usize, CheckoutError> {
        self.steps
            .iter()
            .position(|s| s.id == id)
            .ok_or(CheckoutError::StepNotInFlow(id))
    }

    #[must_use]
    pub fn status(&self, session: &CheckoutSession, id: StepId) -> StepStatus {
        if session.is_completed(id) {
            StepStatus::Completed
        } else {
            StepStatus::Pending
        }
    }

    /// The lowest-ordered pending step, or `Confirmation` when none is left.
    #[must_use]
    pub fn next_step(&self, session: &CheckoutSession) -> NextStep<'_> {
        self.steps
            .iter()
            .find(|s| !session.is_completed(s.id))
            .map_or(NextStep::Confirmation, NextStep::Step)
    }

    /// The step preceding `id`, if any.
    #[must_use]
    pub fn previous(&self, id: StepId) -> Option<&StepDefinition> {
        let index = self.index_of(id).ok()?;
        index.checked_sub(1).and_then(|i| self.steps.get(i))
    }

    /// Whether every step is complete.
    #[must_use]
    pub fn is_finished(&self, session: &CheckoutSession) -> bool {
        matches!(self.next_step(session), NextStep::Confirmation)
    }

    /// Whether the customer may open `id`: all earlier steps are complete.
    #[must_use]
    pub fn is_reachable(&self, session: &CheckoutSession, id: StepId) -> bool {
        self.steps
            .iter()
            .take_while(|s| s.id != id)
            .all(|s| session.is_completed(s.id))
            && self.step(id).is_some()
    }

    /// Record that the customer is looking at `id`.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::StepNotInFlow` for a step outside this flow.
    pub fn visit(&self, session: &mut CheckoutSession, id: StepId) -> Result<(), CheckoutError> {
        let index = self.index_of(id)?;
        session.set_current_step_index(index);
        Ok(())
    }

    /// Return `id` and every later step to pending.
    ///
    /// Used when a stored answer is no longer acceptable, e.g. a shipping
    /// method that was retired after the customer picked it.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::StepNotInFlow` for a step outside this flow.
    pub fn reopen(
        &self,
        session: &mut CheckoutSession,
        id: StepId,
    ) -> Result<Vec<StepId>, CheckoutError> {
        let index = self.index_of(id)?;
        Ok(self.reset_from(session, index))
    }

    /// Return every step strictly after `id` to pending.
    ///
    /// Under [`StaleAnswerPolicy::Discard`] their stored fields are removed
    /// as well. Returns the steps that were complete before the reset.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::StepNotInFlow` for a step outside this flow.
    pub fn reset_after(
        &self,
        session: &mut CheckoutSession,
        id: StepId,
    ) -> Result<Vec<StepId>, CheckoutError> {
        let index = self.index_of(id)?;
        Ok(self.reset_from(session, index + 1))
    }

    fn reset_from(&self, session: &mut CheckoutSession, start: usize) -> Vec<StepId> {
        let mut reset = Vec::new();
        for step in self.steps.iter().skip(start) {
            if session.mark_pending(step.id) {
                reset.push(step.id);
            }
            if self.policy == StaleAnswerPolicy::Discard {
                for field in step.id.fields() {
                    session.remove(field);
                }
            }
        }
        reset
    }

    /// Store a validated answer for `id` and complete the step.
    ///
    /// When the value differs from the stored one, every later step is reset
    /// first. Resubmitting the stored value changes nothing but the step's
    /// completion flag, which is already set.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::StepNotInFlow` for a step outside this flow,
    /// or `CheckoutError::Serialization` if `value` cannot be encoded.
    pub fn submit<T: Serialize + ?Sized>(
        &self,
        session: &mut CheckoutSession,
        id: StepId,
        field: &str,
        value: &T,
    ) -> Result<SubmitOutcome, CheckoutError> {
        let index = self.index_of(id)?;
        let submitted = serde_json::to_value(value)?;

        let changed = session.value(field) != Some(&submitted);
        let reset = if changed {
            self.reset_from(session, index + 1)
        } else {
            Vec::new()
        };

        if !reset.is_empty() {
            tracing::info!(step = %id, reset = ?reset, "checkout answer changed, later steps reset");
        }

        session.insert_value(field, submitted);
        session.mark_completed(id);
        session.set_current_step_index(index);

        Ok(SubmitOutcome { changed, reset })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::checkout::fields;

    fn completed_session(flow: &CheckoutFlow) -> CheckoutSession {
        let mut session = CheckoutSession::new();
        flow.submit(&mut session, StepId::Address, fields::SHIPPING_ADDRESS, "home")
            .unwrap();
        flow.submit(&mut session, StepId::Shipping, fields::SHIPPING_METHOD, &1)
            .unwrap();
        flow.submit(&mut session, StepId::Payment, fields::PAYMENT_METHOD, "invoice")
            .unwrap();
        session
    }

    fn next_id(flow: &CheckoutFlow, session: &CheckoutSession) -> Option<StepId> {
        match flow.next_step(session) {
            NextStep::Step(step) => Some(step.id),
            NextStep::Confirmation => None,
        }
    }

    #[test]
    fn test_new_sorts_by_order() {
        let flow = CheckoutFlow::new(vec![
            StepDefinition::new(StepId::Payment, 30, "Pay"),
            StepDefinition::new(StepId::Address, 10, "Address"),
        ])
        .unwrap();
        let ids: Vec<_> = flow.steps().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![StepId::Address, StepId::Payment]);
    }

    #[test]
    fn test_new_rejects_bad_configuration() {
        assert_eq!(CheckoutFlow::new(vec![]), Err(FlowError::Empty));
        assert_eq!(
            CheckoutFlow::new(vec![
                StepDefinition::new(StepId::Address, 1, "a"),
                StepDefinition::new(StepId::Address, 2, "b"),
            ]),
            Err(FlowError::DuplicateStep(StepId::Address))
        );
        assert_eq!(
            CheckoutFlow::new(vec![
                StepDefinition::new(StepId::Address, 1, "a"),
                StepDefinition::new(StepId::Shipping, 1, "b"),
            ]),
            Err(FlowError::DuplicateOrder(1))
        );
    }

    #[test]
    fn test_next_step_is_lowest_pending() {
        let flow = CheckoutFlow::standard();
        let mut session = CheckoutSession::new();
        assert_eq!(next_id(&flow, &session), Some(StepId::Address));

        flow.submit(&mut session, StepId::Address, fields::SHIPPING_ADDRESS, "home")
            .unwrap();
        assert_eq!(next_id(&flow, &session), Some(StepId::Shipping));

        // Payment done out of order: shipping is still the lowest pending.
        flow.submit(&mut session, StepId::Payment, fields::PAYMENT_METHOD, "invoice")
            .unwrap();
        assert_eq!(next_id(&flow, &session), Some(StepId::Shipping));

        flow.submit(&mut session, StepId::Shipping, fields::SHIPPING_METHOD, &1)
            .unwrap();
        assert_eq!(flow.next_step(&session), NextStep::Confirmation);
        assert!(flow.is_finished(&session));
    }

    #[test]
    fn test_changed_answer_resets_later_steps() {
        let flow = CheckoutFlow::standard();
        let mut session = completed_session(&flow);

        let outcome = flow
            .submit(&mut session, StepId::Address, fields::SHIPPING_ADDRESS, "office")
            .unwrap();

        assert!(outcome.changed);
        assert_eq!(outcome.reset, vec![StepId::Shipping, StepId::Payment]);
        assert_eq!(flow.status(&session, StepId::Address), StepStatus::Completed);
        assert_eq!(flow.status(&session, StepId::Shipping), StepStatus::Pending);
        assert_eq!(flow.status(&session, StepId::Payment), StepStatus::Pending);
        assert_eq!(next_id(&flow, &session), Some(StepId::Shipping));
    }

    #[test]
    fn test_same_answer_keeps_later_steps() {
        let flow = CheckoutFlow::standard();
        let mut session = completed_session(&flow);

        let outcome = flow
            .submit(&mut session, StepId::Address, fields::SHIPPING_ADDRESS, "home")
            .unwrap();

        assert!(!outcome.changed);
        assert!(outcome.reset.is_empty());
        assert!(flow.is_finished(&session));
    }

    #[test]
    fn test_resubmission_is_idempotent() {
        let flow = CheckoutFlow::standard();
        let mut session = completed_session(&flow);
        flow.submit(&mut session, StepId::Shipping, fields::SHIPPING_METHOD, &2)
            .unwrap();
        let after_first = session.clone();

        let outcome = flow
            .submit(&mut session, StepId::Shipping, fields::SHIPPING_METHOD, &2)
            .unwrap();

        assert!(!outcome.changed);
        assert_eq!(session, after_first);
    }

    #[test]
    fn test_retain_policy_keeps_stale_values() {
        let flow = CheckoutFlow::standard();
        let mut session = completed_session(&flow);
        flow.submit(&mut session, StepId::Address, fields::SHIPPING_ADDRESS, "office")
            .unwrap();

        assert_eq!(session.get::<i32>(fields::SHIPPING_METHOD), Some(1));
        assert_eq!(session.get::<String>(fields::PAYMENT_METHOD).as_deref(), Some("invoice"));
    }

    #[test]
    fn test_discard_policy_drops_stale_values() {
        let flow = CheckoutFlow::standard().with_policy(StaleAnswerPolicy::Discard);
        let mut session = completed_session(&flow);
        flow.submit(&mut session, StepId::Address, fields::SHIPPING_ADDRESS, "office")
            .unwrap();

        assert_eq!(session.value(fields::SHIPPING_METHOD), None);
        assert_eq!(session.value(fields::PAYMENT_METHOD), None);
        assert_eq!(session.get::<String>(fields::SHIPPING_ADDRESS).as_deref(), Some("office"));
    }

    #[test]
    fn test_reachability_requires_earlier_steps() {
        let flow = CheckoutFlow::standard();
        let mut session = CheckoutSession::new();
        assert!(flow.is_reachable(&session, StepId::Address));
        assert!(!flow.is_reachable(&session, StepId::Shipping));

        flow.submit(&mut session, StepId::Address, fields::SHIPPING_ADDRESS, "home")
            .unwrap();
        assert!(flow.is_reachable(&session, StepId::Shipping));
        assert!(!flow.is_reachable(&session, StepId::Payment));
    }

    #[test]
    fn test_steps_outside_flow_are_rejected() {
        let flow = CheckoutFlow::new(vec![StepDefinition::new(StepId::Address, 1, "Address")])
            .unwrap();
        let mut session = CheckoutSession::new();

        assert!(matches!(
            flow.submit(&mut session, StepId::Payment, fields::PAYMENT_METHOD, "invoice"),
            Err(CheckoutError::StepNotInFlow(StepId::Payment))
        ));
        assert!(!flow.is_reachable(&session, StepId::Payment));
        assert!(flow.previous(StepId::Address).is_none());
        assert_eq!(session.value(fields::PAYMENT_METHOD), None);
    }

    #[test]
    fn test_storing_a_value_alone_does_not_complete_a_step() {
        let flow = CheckoutFlow::standard();
        let mut session = CheckoutSession::new();

        session.set(fields::SHIPPING_ADDRESS, "home").unwrap();
        session.set(fields::SHIPPING_METHOD, &1).unwrap();
        session.set(fields::PAYMENT_METHOD, "invoice").unwrap();

        assert!(!flow.is_finished(&session));
        assert_eq!(next_id(&flow, &session), Some(StepId::Address));

        let outcome = flow
            .submit(&mut session, StepId::Address, fields::SHIPPING_ADDRESS, "home")
            .unwrap();
        assert!(!outcome.changed);
        assert_eq!(next_id(&flow, &session), Some(StepId::Shipping));

        flow.submit(&mut session, StepId::Shipping, fields::SHIPPING_METHOD, &1)
            .unwrap();
        flow.submit(&mut session, StepId::Payment, fields::PAYMENT_METHOD, "invoice")
            .unwrap();
        assert!(flow.is_finished(&session));
    }

    #[test]
    fn test_reopen_includes_the_step_itself() {
        let flow = CheckoutFlow::standard();
        let mut session = completed_session(&flow);

        let reset = flow.reopen(&mut session, StepId::Shipping).unwrap();
        assert_eq!(reset, vec![StepId::Shipping, StepId::Payment]);
        assert!(session.is_completed(StepId::Address));
        assert_eq!(next_id(&flow, &session), Some(StepId::Shipping));
    }

    #[test]
    fn test_submit_tracks_current_step() {
        let flow = CheckoutFlow::standard();
        let mut session = CheckoutSession::new();
        flow.visit(&mut session, StepId::Payment).unwrap();
        assert_eq!(session.current_step_index(), 2);

        flow.submit(&mut session, StepId::Address, fields::SHIPPING_ADDRESS, "home")
            .unwrap();
        assert_eq!(session.current_step_index(), 0);
        assert_eq!(flow.previous(StepId::Shipping).map(|s| s.id), Some(StepId::Address));
    }
}
