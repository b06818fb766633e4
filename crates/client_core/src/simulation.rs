use std::time::Duration;

use shared::{
    domain::{CheckoutOutcome, RetailerResult, StepRecord},
    protocol::{CheckoutItem, ProgressEvent, RetailerDone, RetailerStart, StepAdvanced},
};
use tokio::time::sleep;
use tracing::info;

use crate::transport::ProgressSink;

pub const SIMULATED_STEPS: [&str; 3] = ["Open link", "Add to cart", "Checkout (sandbox)"];
pub const DEFAULT_ITEM_DELAY: Duration = Duration::from_millis(800);

/// Local stand-in for the executor when no backend path produced a result.
#[derive(Debug, Clone)]
pub struct Simulator {
    item_delay: Duration,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(DEFAULT_ITEM_DELAY)
    }
}

impl Simulator {
    /// `item_delay` only paces the progress display.
    pub fn new(item_delay: Duration) -> Self {
        Self { item_delay }
    }

    pub async fn run(&self, items: &[CheckoutItem], sink: &dyn ProgressSink) -> CheckoutOutcome {
        info!(items = items.len(), "checkout: simulating executor run");

        let mut results = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            sink.apply(ProgressEvent::RetailerStart(RetailerStart {
                index,
                brand: item.brand.clone(),
            }))
            .await;

            if !self.item_delay.is_zero() {
                sleep(self.item_delay).await;
            }

            for step_index in 0..SIMULATED_STEPS.len() {
                sink.apply(ProgressEvent::Step(StepAdvanced {
                    item_index: index,
                    step_index,
                }))
                .await;
            }
            sink.apply(ProgressEvent::RetailerDone(RetailerDone { index }))
                .await;

            results.push(RetailerResult {
                url: item.url.clone(),
                quantity: item.quantity,
                success: true,
                steps: SIMULATED_STEPS
                    .iter()
                    .map(|action| StepRecord::ok(*action))
                    .collect(),
                error: None,
            });
        }

        CheckoutOutcome::from_results(results)
    }
}
