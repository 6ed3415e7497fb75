//! Pipeline runner.
//!
//! [`PricingPipeline`] owns the notifier and executes [`Stage::ORDER`] over a
//! freshly constructed [`PricingState`]. There is no branching: every stage
//! runs exactly once, in order, and the runner returns as soon as the
//! notification stage has handed off its message.

use std::sync::Arc;
use std::time::Instant;

use crate::notify::{NoopNotifier, Notifier};
use crate::stages::Stage;
use crate::types::{DeliveryInputs, PricingState};

/// Ordered stage runner.
///
/// Cheap to clone and safe to share across requests: each call to
/// [`run`](Self::run) builds its own state and touches nothing else.
///
/// # Examples
/// ```
/// use delivery_core::pipeline::PricingPipeline;
/// use delivery_core::types::{DeliveryInputs, QuoteStatus};
///
/// let pipeline = PricingPipeline::offline();
/// let inputs = DeliveryInputs::new("fragile", 20.0, "express", 8.0, "rural");
/// let state = pipeline.run("D-0001", "user-1", inputs);
///
/// assert_eq!(state.total_price(), 300.0);
/// assert_eq!(state.status(), QuoteStatus::Completed);
/// assert_eq!(state.action_log().len(), 8);
/// ```
#[derive(Clone)]
pub struct PricingPipeline {
    notifier: Arc<dyn Notifier>,
}

impl PricingPipeline {
    /// Create a runner that hands notifications to `notifier`.
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Create a runner whose notifications go nowhere.
    pub fn offline() -> Self {
        Self::new(Arc::new(NoopNotifier))
    }

    /// Price a request from scratch.
    pub fn run(
        &self,
        ticket_id: impl Into<String>,
        user_id: impl Into<String>,
        inputs: DeliveryInputs,
    ) -> PricingState {
        let mut state = PricingState::new(ticket_id, user_id, inputs);
        self.execute(&mut state);
        state
    }

    fn execute(&self, state: &mut PricingState) {
        let started = Instant::now();
        for stage in Stage::ORDER {
            stage.apply(state, self.notifier.as_ref());
            tracing::trace!(
                ticket_id = %state.ticket_id(),
                stage = stage.name(),
                status = %state.status(),
                "stage applied"
            );
        }
        tracing::debug!(
            ticket_id = %state.ticket_id(),
            total_price = state.total_price(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "pipeline completed"
        );
    }
}

impl Default for PricingPipeline {
    fn default() -> Self {
        Self::offline()
    }
}

impl std::fmt::Debug for PricingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PricingPipeline")
            .field("stages", &Stage::ORDER.len())
            .finish()
    }
}
