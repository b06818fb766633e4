//! Checkout session state and its single transition function.

use std::collections::BTreeMap;

use serde::Serialize;
use shared::{
    domain::{CheckoutOutcome, CheckoutStep, CheckoutSummary, RetailerProgress, RetailerResult},
    protocol::{CheckoutExecuteRequest, CheckoutItem, ProgressEvent},
};

/// Monotonically increasing token identifying the current attempt. Updates
/// carrying an older generation are stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Generation(pub u64);

impl Generation {
    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Debug, Clone)]
pub enum SessionAction {
    ProceedToReview { items: Vec<CheckoutItem> },
    ProceedToPayment,
    BeginAttempt { request: CheckoutExecuteRequest },
    Progress {
        generation: Generation,
        event: ProgressEvent,
    },
    Complete {
        generation: Generation,
        outcome: CheckoutOutcome,
    },
    BackToCart,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyCart,
    WrongStep,
    AttemptInFlight,
    Stale,
    /// Progress for an index the running request does not have.
    UnknownItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Ignored(Rejection),
}

impl Transition {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// The aggregate a checkout view renders from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutSession {
    generation: Generation,
    step: CheckoutStep,
    items: Vec<CheckoutItem>,
    request: Option<CheckoutExecuteRequest>,
    in_flight: bool,
    progress: BTreeMap<usize, RetailerProgress>,
    results: Vec<RetailerResult>,
    summary: Option<CheckoutSummary>,
    purchased: Vec<CheckoutItem>,
}

impl Default for CheckoutSession {
    fn default() -> Self {
        Self {
            generation: Generation::default(),
            step: CheckoutStep::Cart,
            items: Vec::new(),
            request: None,
            in_flight: false,
            progress: BTreeMap::new(),
            results: Vec::new(),
            summary: None,
            purchased: Vec::new(),
        }
    }
}

impl CheckoutSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    /// Items shown on the review step.
    pub fn items(&self) -> &[CheckoutItem] {
        &self.items
    }

    pub fn request(&self) -> Option<&CheckoutExecuteRequest> {
        self.request.as_ref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn progress(&self) -> &BTreeMap<usize, RetailerProgress> {
        &self.progress
    }

    pub fn results(&self) -> &[RetailerResult] {
        &self.results
    }

    pub fn summary(&self) -> Option<CheckoutSummary> {
        self.summary
    }

    /// Items that were submitted by the completed attempt.
    pub fn purchased(&self) -> &[CheckoutItem] {
        &self.purchased
    }

    pub fn reduce(&mut self, action: SessionAction) -> Transition {
        match action {
            SessionAction::ProceedToReview { items } => {
                if self.step != CheckoutStep::Cart {
                    return Transition::Ignored(Rejection::WrongStep);
                }
                let items: Vec<_> = items
                    .into_iter()
                    .filter(|item| item.quantity > 0 && !item.url.trim().is_empty())
                    .collect();
                if items.is_empty() {
                    return Transition::Ignored(Rejection::EmptyCart);
                }
                self.items = items;
                self.step = CheckoutStep::Review;
                Transition::Applied
            }
            SessionAction::ProceedToPayment => {
                if self.step != CheckoutStep::Review {
                    return Transition::Ignored(Rejection::WrongStep);
                }
                self.step = CheckoutStep::Payment;
                Transition::Applied
            }
            SessionAction::BeginAttempt { request } => {
                if self.step != CheckoutStep::Payment {
                    return Transition::Ignored(Rejection::WrongStep);
                }
                if self.in_flight {
                    return Transition::Ignored(Rejection::AttemptInFlight);
                }
                if request.cart.items.is_empty() {
                    return Transition::Ignored(Rejection::EmptyCart);
                }
                self.generation = self.generation.next();
                self.in_flight = true;
                self.progress.clear();
                self.results.clear();
                self.summary = None;
                self.purchased.clear();
                self.request = Some(request);
                Transition::Applied
            }
            SessionAction::Progress { generation, event } => {
                if !self.accepts(generation) {
                    return Transition::Ignored(Rejection::Stale);
                }
                self.apply_progress(event)
            }
            SessionAction::Complete {
                generation,
                outcome,
            } => {
                if !self.accepts(generation) {
                    return Transition::Ignored(Rejection::Stale);
                }
                self.complete(outcome);
                Transition::Applied
            }
            SessionAction::BackToCart if self.step == CheckoutStep::Done => {
                self.reduce(SessionAction::Reset)
            }
            SessionAction::BackToCart => {
                self.generation = self.generation.next();
                self.step = CheckoutStep::Cart;
                self.in_flight = false;
                self.request = None;
                self.progress.clear();
                Transition::Applied
            }
            SessionAction::Reset => {
                *self = Self {
                    generation: self.generation.next(),
                    ..Self::default()
                };
                Transition::Applied
            }
        }
    }

    fn accepts(&self, generation: Generation) -> bool {
        self.in_flight && self.step == CheckoutStep::Payment && self.generation == generation
    }

    fn apply_progress(&mut self, event: ProgressEvent) -> Transition {
        let index = match &event {
            ProgressEvent::RetailerStart(start) => Some(start.index),
            ProgressEvent::Step(step) => Some(step.item_index),
            ProgressEvent::RetailerDone(done) => Some(done.index),
            ProgressEvent::Done(_) => None,
        };
        if let Some(index) = index {
            if index >= self.request_len() {
                return Transition::Ignored(Rejection::UnknownItem);
            }
        }

        match event {
            ProgressEvent::RetailerStart(start) => {
                self.progress.insert(
                    start.index,
                    RetailerProgress::started(start.index, start.brand),
                );
            }
            ProgressEvent::Step(step) => {
                self.progress_entry(step.item_index)
                    .record_step(step.step_index);
            }
            ProgressEvent::RetailerDone(done) => {
                self.progress_entry(done.index).finish();
            }
            ProgressEvent::Done(outcome) => self.complete(outcome),
        }
        Transition::Applied
    }

    fn request_len(&self) -> usize {
        self.request
            .as_ref()
            .map_or(0, |request| request.cart.items.len())
    }

    fn progress_entry(&mut self, index: usize) -> &mut RetailerProgress {
        let brand = self
            .request
            .as_ref()
            .and_then(|request| request.cart.items.get(index))
            .map(|item| item.brand.clone())
            .unwrap_or_default();
        self.progress
            .entry(index)
            .or_insert_with(|| RetailerProgress::started(index, brand))
    }

    fn complete(&mut self, outcome: CheckoutOutcome) {
        let outcome = outcome.reconciled();
        self.purchased = self
            .request
            .as_ref()
            .map(|request| request.cart.items.clone())
            .unwrap_or_default();
        self.results = outcome.results;
        self.summary = Some(outcome.summary);
        self.progress.clear();
        self.items.clear();
        self.in_flight = false;
        self.step = CheckoutStep::Done;
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
