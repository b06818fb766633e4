use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! key_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

key_newtype!(ItemId);
key_newtype!(ChatSessionId);

/// A product as shown on a result card and held in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub reviews: u32,
    #[serde(default)]
    pub delivery: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub is_best_pick: bool,
}

impl Product {
    pub fn has_purchase_link(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    Cart,
    Review,
    Payment,
    Done,
}

impl CheckoutStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Review => "review",
            Self::Payment => "payment",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of executor steps a retailer goes through for one item.
pub const RETAILER_STEP_COUNT: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetailerProgress {
    pub index: usize,
    pub brand: String,
    pub steps_completed: u8,
    pub finished: bool,
}

impl RetailerProgress {
    pub fn started(index: usize, brand: impl Into<String>) -> Self {
        Self {
            index,
            brand: brand.into(),
            steps_completed: 0,
            finished: false,
        }
    }

    /// Steps are reported by index; progress never moves backwards.
    pub fn record_step(&mut self, step_index: usize) {
        let reached = u8::try_from(step_index.saturating_add(1))
            .unwrap_or(RETAILER_STEP_COUNT)
            .min(RETAILER_STEP_COUNT);
        self.steps_completed = self.steps_completed.max(reached);
    }

    pub fn finish(&mut self) {
        self.steps_completed = RETAILER_STEP_COUNT;
        self.finished = true;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub action: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StepRecord {
    pub fn ok(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            status: "ok".into(),
            detail: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetailerResult {
    pub url: String,
    pub quantity: u32,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
}

impl CheckoutSummary {
    pub fn from_results(results: &[RetailerResult]) -> Self {
        let success = results.iter().filter(|result| result.success).count();
        Self {
            total: results.len(),
            success,
            failed: results.len() - success,
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.success + self.failed == self.total
    }
}

/// Terminal result of one checkout attempt, whichever path produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutOutcome {
    #[serde(default)]
    pub results: Vec<RetailerResult>,
    #[serde(default)]
    pub summary: CheckoutSummary,
}

impl CheckoutOutcome {
    pub fn from_results(results: Vec<RetailerResult>) -> Self {
        let summary = CheckoutSummary::from_results(&results);
        Self { results, summary }
    }

    /// Recomputes the summary when it does not describe `results`.
    pub fn reconciled(self) -> Self {
        if self.summary.is_balanced() && self.summary.total == self.results.len() {
            self
        } else {
            Self::from_results(self.results)
        }
    }
}
