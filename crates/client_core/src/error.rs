use shared::{domain::CheckoutStep, error::ApiException};
use thiserror::Error;

/// Rejected checkout actions. Transport failures never show up here; they
/// are absorbed by the fallback chain.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("checkout needs at least one cart item with a purchase link")]
    EmptyCart,
    #[error("cannot {action} while checkout is at step {step}")]
    InvalidStep {
        action: &'static str,
        step: CheckoutStep,
    },
    #[error("a checkout attempt is already in flight")]
    AlreadyInFlight,
    #[error("checkout attempt was abandoned before it completed")]
    Abandoned,
}

#[derive(Debug, Error)]
pub enum ShopError {
    #[error("no items in shopping spec")]
    EmptySpec,
    #[error("no shopping spec yet; confirm a plan in chat first")]
    NoSpec,
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Backend(#[from] ApiException),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}
