use serde::{Deserialize, Serialize};
use shared::protocol::{
    CheckoutCart, CheckoutExecuteRequest, CheckoutItem, CheckoutProfile, Contact, PaymentMethod,
    ShippingAddress, ShoppingSpec,
};

use crate::currency::DEFAULT_CURRENCY;

pub const SANDBOX_PAYMENT_TOKEN: &str = "tok_sandbox_123";
const DEFAULT_COUNTRY: &str = "US";

/// Saved user details used to prefill searches and checkout forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
    pub currency: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            city: String::new(),
            state: String::new(),
            pincode: String::new(),
            country: String::new(),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl Profile {
    pub fn normalized(mut self) -> Self {
        let currency = self.currency.trim().to_ascii_uppercase();
        self.currency = if currency.is_empty() {
            DEFAULT_CURRENCY.to_string()
        } else {
            currency
        };
        self
    }
}

/// Replaces the agent's placeholder pincode and currency with the profile's.
pub fn merge_spec_with_profile(spec: ShoppingSpec, profile: &Profile) -> ShoppingSpec {
    let pincode = profile.pincode.trim();
    let currency = profile.currency.trim();
    if pincode.is_empty() && currency.is_empty() {
        return spec;
    }

    ShoppingSpec {
        delivery_pincode: if pincode.is_empty() {
            spec.delivery_pincode
        } else {
            Some(pincode.to_string())
        },
        budget_currency: if currency.is_empty() {
            spec.budget_currency
        } else {
            Some(currency.to_ascii_uppercase())
        },
        ..spec
    }
}

/// Details collected on the payment step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub line1: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub token: String,
}

impl Default for CheckoutForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            line1: String::new(),
            city: String::new(),
            state: String::new(),
            zip: String::new(),
            country: DEFAULT_COUNTRY.to_string(),
            token: SANDBOX_PAYMENT_TOKEN.to_string(),
        }
    }
}

impl CheckoutForm {
    pub fn from_profile(profile: &Profile) -> Self {
        let defaults = Self::default();
        Self {
            name: profile.name.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone(),
            line1: profile.address.clone(),
            city: profile.city.clone(),
            state: profile.state.clone(),
            zip: profile.pincode.clone(),
            country: if profile.country.trim().is_empty() {
                defaults.country
            } else {
                profile.country.clone()
            },
            token: defaults.token,
        }
    }

    pub fn to_profile_payload(&self) -> CheckoutProfile {
        CheckoutProfile {
            shipping_address: ShippingAddress {
                name: self.name.clone(),
                line1: self.line1.clone(),
                city: self.city.clone(),
                state: self.state.clone(),
                zip: self.zip.clone(),
                country: self.country.clone(),
            },
            contact: Contact {
                email: self.email.clone(),
                phone: self.phone.clone(),
            },
            payment: PaymentMethod::card(self.token.clone()),
        }
    }

    pub fn to_request(&self, items: Vec<CheckoutItem>) -> CheckoutExecuteRequest {
        CheckoutExecuteRequest {
            cart: CheckoutCart { items },
            profile: self.to_profile_payload(),
            headless: true,
        }
    }
}
