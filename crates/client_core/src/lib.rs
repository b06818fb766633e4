//! Client side of the shopping assistant: cart, search and checkout
//! orchestration against the shopping backend.

pub mod cart;
pub mod checkout;
pub mod currency;
pub mod endpoints;
pub mod error;
pub mod profile;
pub mod session;
pub mod shop;
pub mod simulation;
pub mod sse;
pub mod transport;

pub use cart::{Cart, CartEntry, CartStore};
pub use checkout::CheckoutClient;
pub use endpoints::{ApiEndpoints, DEFAULT_API_BASE};
pub use error::{CheckoutError, ShopError};
pub use profile::{CheckoutForm, Profile};
pub use session::{CheckoutSession, Generation, Rejection, SessionAction, Transition};
pub use shop::{CategoryData, SearchState, ShopClient};
pub use simulation::Simulator;
pub use transport::{CheckoutStrategy, CheckoutTransport, DiscardProgress, ProgressSink};
