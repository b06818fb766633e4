use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{ChatSessionId, CheckoutOutcome, CheckoutSummary, ItemId, RetailerResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub item_id: ItemId,
    pub url: String,
    pub quantity: u32,
    pub title: String,
    pub name: String,
    pub brand: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutCart {
    pub items: Vec<CheckoutItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub line1: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    #[serde(rename = "type")]
    pub kind: String,
    pub token: String,
}

impl PaymentMethod {
    pub fn card(token: impl Into<String>) -> Self {
        Self {
            kind: "card".into(),
            token: token.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutProfile {
    pub shipping_address: ShippingAddress,
    pub contact: Contact,
    pub payment: PaymentMethod,
}

/// Body of `POST /checkout/execute`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutExecuteRequest {
    pub cart: CheckoutCart,
    pub profile: CheckoutProfile,
    pub headless: bool,
}

/// Buffered (non-streaming) checkout response. Error responses use the same
/// object with `error`/`message` set and no results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteResponse {
    #[serde(default)]
    pub results: Vec<RetailerResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<CheckoutSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetailerStart {
    pub index: usize,
    #[serde(default)]
    pub brand: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepAdvanced {
    pub item_index: usize,
    pub step_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetailerDone {
    pub index: usize,
}

/// Typed frames of the checkout progress stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    RetailerStart(RetailerStart),
    Step(StepAdvanced),
    RetailerDone(RetailerDone),
    Done(CheckoutOutcome),
}

impl ProgressEvent {
    pub const RETAILER_START: &'static str = "retailer_start";
    pub const STEP: &'static str = "step";
    pub const RETAILER_DONE: &'static str = "retailer_done";
    pub const DONE: &'static str = "done";

    pub fn name(&self) -> &'static str {
        match self {
            Self::RetailerStart(_) => Self::RETAILER_START,
            Self::Step(_) => Self::STEP,
            Self::RetailerDone(_) => Self::RETAILER_DONE,
            Self::Done(_) => Self::DONE,
        }
    }

    /// Decodes a frame payload. `Ok(None)` means the event name is not one
    /// this client understands.
    pub fn from_named_payload(name: &str, data: &str) -> serde_json::Result<Option<Self>> {
        let event = match name {
            Self::RETAILER_START => Self::RetailerStart(serde_json::from_str(data)?),
            Self::STEP => Self::Step(serde_json::from_str(data)?),
            Self::RETAILER_DONE => Self::RetailerDone(serde_json::from_str(data)?),
            Self::DONE => Self::Done(serde_json::from_str(data)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    pub fn payload_json(&self) -> serde_json::Result<String> {
        match self {
            Self::RetailerStart(payload) => serde_json::to_string(payload),
            Self::Step(payload) => serde_json::to_string(payload),
            Self::RetailerDone(payload) => serde_json::to_string(payload),
            Self::Done(payload) => serde_json::to_string(payload),
        }
    }

    /// Renders the event as one blank-line terminated stream frame.
    pub fn to_frame(&self) -> serde_json::Result<String> {
        Ok(format!(
            "event: {}\ndata: {}\n\n",
            self.name(),
            self.payload_json()?
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecItem {
    pub query: String,
    #[serde(default)]
    pub preferences: String,
}

/// Structured shopping plan produced by the chat agent and sent to `/shop`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoppingSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_pincode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_deadline_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_budget: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_currency: Option<String>,
    #[serde(default)]
    pub items: Vec<SpecItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub image_link: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub delivery: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    #[serde(default)]
    pub best_pick: Option<Pick>,
    #[serde(default)]
    pub runner_up: Option<Pick>,
    #[serde(default)]
    pub budget_pick: Option<Pick>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    #[serde(default)]
    pub recommendations: Recommendations,
}

/// Per-category results keyed by category name, in server order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalResults {
    #[serde(default)]
    pub items: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_results: Option<FinalResults>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_results: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: ChatSessionId,
    #[serde(default)]
    pub reply: String,
    #[serde(default)]
    pub json_output: Option<ShoppingSpec>,
}
