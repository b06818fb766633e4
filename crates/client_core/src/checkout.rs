//! Drives a checkout session through the transport chain and the simulator.

use std::sync::Arc;

use async_trait::async_trait;
use shared::{domain::CheckoutOutcome, protocol::ProgressEvent};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

use crate::{
    cart::CartStore,
    error::CheckoutError,
    profile::CheckoutForm,
    session::{CheckoutSession, Generation, Rejection, SessionAction, Transition},
    simulation::Simulator,
    transport::{CheckoutTransport, ProgressSink},
};

const SNAPSHOT_CHANNEL_CAPACITY: usize = 256;

pub struct CheckoutClient {
    transport: CheckoutTransport,
    simulator: Simulator,
    cart: Arc<dyn CartStore>,
    session: Mutex<CheckoutSession>,
    snapshots: broadcast::Sender<CheckoutSession>,
}

impl CheckoutClient {
    pub fn new(
        transport: CheckoutTransport,
        simulator: Simulator,
        cart: Arc<dyn CartStore>,
    ) -> Arc<Self> {
        let (snapshots, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Arc::new(Self {
            transport,
            simulator,
            cart,
            session: Mutex::new(CheckoutSession::new()),
            snapshots,
        })
    }

    /// Every applied transition is published as a full session snapshot.
    pub fn subscribe(&self) -> broadcast::Receiver<CheckoutSession> {
        self.snapshots.subscribe()
    }

    pub async fn snapshot(&self) -> CheckoutSession {
        self.session.lock().await.clone()
    }

    async fn dispatch(&self, action: SessionAction) -> Transition {
        let mut session = self.session.lock().await;
        let transition = session.reduce(action);
        if transition.is_applied() {
            let _ = self.snapshots.send(session.clone());
        }
        transition
    }

    pub async fn proceed_to_review(&self) -> Transition {
        let items = self.cart.checkout_items().await;
        self.dispatch(SessionAction::ProceedToReview { items }).await
    }

    pub async fn proceed_to_payment(&self) -> Transition {
        self.dispatch(SessionAction::ProceedToPayment).await
    }

    /// Leaves the flow. An attempt still in flight keeps running, but its
    /// updates no longer reach the session.
    pub async fn back_to_cart(&self) -> Transition {
        self.dispatch(SessionAction::BackToCart).await
    }

    pub async fn reset(&self) -> Transition {
        self.dispatch(SessionAction::Reset).await
    }

    /// Runs one checkout attempt with the items currently in the cart.
    ///
    /// Backend failures are not errors: the simulator takes over so the
    /// session always reaches `done`. Errors only report rejected calls.
    pub async fn execute(&self, form: &CheckoutForm) -> Result<CheckoutOutcome, CheckoutError> {
        let items = self.cart.checkout_items().await;
        let request = form.to_request(items);

        let generation = {
            let mut session = self.session.lock().await;
            match session.reduce(SessionAction::BeginAttempt {
                request: request.clone(),
            }) {
                Transition::Applied => {
                    let _ = self.snapshots.send(session.clone());
                    session.generation()
                }
                Transition::Ignored(Rejection::AttemptInFlight) => {
                    return Err(CheckoutError::AlreadyInFlight)
                }
                Transition::Ignored(Rejection::EmptyCart) => return Err(CheckoutError::EmptyCart),
                Transition::Ignored(_) => {
                    return Err(CheckoutError::InvalidStep {
                        action: "execute checkout",
                        step: session.step(),
                    })
                }
            }
        };

        info!(
            generation = generation.0,
            items = request.cart.items.len(),
            "checkout: attempt started"
        );

        let sink = SessionSink {
            client: self,
            generation,
        };
        let outcome = match self.transport.execute(&request, &sink).await {
            Some(outcome) => outcome,
            None => {
                info!(
                    generation = generation.0,
                    "checkout: no backend result, falling back to simulation"
                );
                self.simulator.run(&request.cart.items, &sink).await
            }
        };

        let completed = {
            let mut session = self.session.lock().await;
            match session.reduce(SessionAction::Complete {
                generation,
                outcome,
            }) {
                Transition::Applied => {
                    let _ = self.snapshots.send(session.clone());
                    Some(CheckoutOutcome {
                        results: session.results().to_vec(),
                        summary: session.summary().unwrap_or_default(),
                    })
                }
                Transition::Ignored(_) => None,
            }
        };

        let Some(outcome) = completed else {
            debug!(
                generation = generation.0,
                "checkout: dropping result of abandoned attempt"
            );
            return Err(CheckoutError::Abandoned);
        };

        self.cart.clear_cart().await;
        info!(
            generation = generation.0,
            success = outcome.summary.success,
            failed = outcome.summary.failed,
            "checkout: attempt finished"
        );
        Ok(outcome)
    }
}

struct SessionSink<'a> {
    client: &'a CheckoutClient,
    generation: Generation,
}

#[async_trait]
impl ProgressSink for SessionSink<'_> {
    async fn apply(&self, event: ProgressEvent) {
        let transition = self
            .client
            .dispatch(SessionAction::Progress {
                generation: self.generation,
                event,
            })
            .await;
        if let Transition::Ignored(rejection) = transition {
            debug!(
                generation = self.generation.0,
                ?rejection,
                "checkout: progress event ignored"
            );
        }
    }
}

#[cfg(test)]
#[path = "tests/checkout_tests.rs"]
mod tests;
